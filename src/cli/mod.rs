//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod model_list;
pub mod parse;
pub mod prompt;
pub mod provider_list;
pub mod save;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::model_list::list_models;
use crate::cli::parse::run_parse;
use crate::cli::prompt::{run_prompt, PromptOptions};
use crate::cli::provider_list::list_providers_command;
use crate::cli::save::run_save;
use crate::core::config::{Config, ConfigError};
use crate::core::error::CompletionError;
use crate::core::model_catalog::provider_for_model;
use crate::logging::init_tracing;

#[derive(Parser)]
#[command(name = "codey", version)]
#[command(about = "Chat with LLMs through plain-text transcripts")]
#[command(
    long_about = "Codey sends a plain-text transcript to an LLM and streams the reply. \
Turns are separated by role delimiters (by default '# === USER ===', \
'# === ASSISTANT ===' and '# === SYSTEM ==='), and an optional TOML (+++) or \
YAML (---) front-matter block can change the delimiters and the model.\n\n\
Environment Variables:\n\
  XAI_API_KEY        API key for xAI models (grok-*)\n\
  OPENAI_API_KEY     API key for OpenAI models (gpt-*, o*)\n\
  ANTHROPIC_API_KEY  API key for Anthropic models (claude-*)\n\
  CODEY_CONFIG       Alternative config file path\n\
  CODEY_LOG          Log filter for diagnostics on stderr (e.g. debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a transcript and stream the reply to stdout
    Prompt {
        /// Transcript text (read from stdin when omitted)
        input: Option<String>,
        /// Model to use instead of the one in the front matter
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
        /// Emit the reply as JSON lines of the form {"chunk": "..."}
        #[arg(long)]
        chunk: bool,
        /// Bracket the reply with the assistant and user delimiters
        #[arg(long)]
        add_delimiters: bool,
    },
    /// Append a prompt to a transcript file and save the reply there
    Save {
        /// Prompt text (read from stdin when omitted)
        input: Option<String>,
        /// Transcript file (defaults to the configured file, or codey.md)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print the messages a transcript parses into, one JSON object per line
    Parse {
        /// Transcript text (read from stdin when omitted)
        input: Option<String>,
    },
    /// List supported models
    Models {
        /// Only list models served by this provider
        #[arg(short, long, value_name = "PROVIDER")]
        provider: Option<String>,
    },
    /// List supported providers and whether their API key is set
    Providers,
    /// Set configuration values (prints the configuration when no value is given)
    Set {
        /// Configuration key: default-model or default-file
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key: default-model or default-file
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Commands::Prompt {
            input,
            model,
            chunk,
            add_delimiters,
        } => {
            run_prompt(PromptOptions {
                input,
                model,
                chunk,
                add_delimiters,
            })
            .await
        }
        Commands::Save { input, file } => run_save(input, file).await,
        Commands::Parse { input } => run_parse(input),
        Commands::Models { provider } => list_models(provider.as_deref()),
        Commands::Providers => list_providers_command(),
        Commands::Set { key, value } => set_config_value(&key, value),
        Commands::Unset { key } => unset_config_value(&key),
    }
}

/// Load the user config, exiting with the configuration status on failure.
pub(crate) fn load_config_or_exit() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(2);
        }
    }
}

pub(crate) fn exit_no_prompt() -> ! {
    eprintln!("No prompt supplied (argument or stdin required).");
    std::process::exit(1);
}

pub(crate) fn exit_with_completion_error(err: &CompletionError) -> ! {
    eprintln!("❌ Error generating chat completion: {err}");
    let fixes = err.quick_fixes();
    if !fixes.is_empty() {
        eprintln!();
        eprintln!("💡 Quick fixes:");
        for fix in fixes {
            eprintln!("  • {fix}");
        }
    }
    std::process::exit(err.exit_code());
}

/// Apply `key = value` to `config`. Returns the confirmation message.
pub(crate) fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<String, String> {
    match key {
        "default-model" => {
            if provider_for_model(value).is_none() {
                return Err(format!(
                    "Unknown model '{value}'. Run 'codey models' to see the supported models."
                ));
            }
            config.set_default_model(value);
            Ok(format!("✅ Set default-model to: {value}"))
        }
        "default-file" => {
            config.default_file = Some(value.to_string());
            Ok(format!("✅ Set default-file to: {value}"))
        }
        _ => Err(format!("Unknown config key: {key}")),
    }
}

pub(crate) fn clear_setting(config: &mut Config, key: &str) -> Result<String, String> {
    match key {
        "default-model" => config.default_model = None,
        "default-file" => config.default_file = None,
        _ => return Err(format!("Unknown config key: {key}")),
    }
    Ok(format!("✅ Unset {key}"))
}

fn save_config_or_exit(config: &Config) {
    if let Err(err) = config.save() {
        eprintln!("❌ {err}");
        std::process::exit(match err {
            ConfigError::Write { .. } => 1,
            _ => 2,
        });
    }
}

fn set_config_value(key: &str, value: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut config = load_config_or_exit();

    let Some(value) = value.filter(|v| !v.is_empty()) else {
        config.print_all(Config::config_path().as_deref());
        return Ok(());
    };

    match apply_setting(&mut config, key, &value) {
        Ok(message) => {
            save_config_or_exit(&config);
            println!("{message}");
            Ok(())
        }
        Err(message) => {
            eprintln!("❌ {message}");
            std::process::exit(1);
        }
    }
}

fn unset_config_value(key: &str) -> Result<(), Box<dyn Error>> {
    let mut config = load_config_or_exit();
    match clear_setting(&mut config, key) {
        Ok(message) => {
            save_config_or_exit(&config);
            println!("{message}");
            Ok(())
        }
        Err(message) => {
            eprintln!("❌ {message}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests;
