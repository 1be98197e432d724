//! `codey save`: continue a conversation kept in a transcript file.

use std::error::Error as StdError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::cli::prompt::{stream_reply, ReplyError};
use crate::cli::{exit_no_prompt, exit_with_completion_error, load_config_or_exit};
use crate::core::chat_stream::{CompletionEngine, CompletionTransport};
use crate::core::config::io::write_atomically;
use crate::core::config::path_display;
use crate::core::message::{Message, Role};
use crate::core::providers::Credentials;
use crate::core::reframe::{append_reply, FramingMode, ReplyFramer};
use crate::core::settings::Settings;
use crate::core::transcript::Document;
use crate::utils::input::read_prompt;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to read {}: {source}", path_display(.path))]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", path_display(.path))]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// The transcript text at `path`; a missing file reads as empty.
pub fn read_transcript(path: &Path) -> Result<String, SaveError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(SaveError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn ends_with_prompt_turn(messages: &[Message], prompt: &str) -> bool {
    messages
        .last()
        .is_some_and(|last| last.role == Role::User && last.content.trim() == prompt.trim())
}

/// Append `prompt` to the transcript at `path` as a new user turn, send the
/// result, stream the reply through `framer`, then rewrite `path` with the
/// prompt and the bracketed reply appended. The user delimiter is written
/// before the prompt unless the transcript already ends with an open user
/// turn. Nothing is written unless the reply completes.
pub async fn save_exchange<T, W>(
    engine: &CompletionEngine<T>,
    path: &Path,
    prompt: &str,
    base: Settings,
    framer: &mut ReplyFramer<W>,
) -> Result<String, SaveError>
where
    T: CompletionTransport,
    W: Write,
{
    let existing = read_transcript(path)?;

    let mut updated = format!("{existing}{prompt}");
    let mut document = Document::parse_with(&updated, base.clone());
    if !ends_with_prompt_turn(&document.messages, prompt) {
        // The transcript ended mid-turn; open a user turn for the prompt.
        let opening = document.settings.delimiter(Role::User);
        updated = format!("{existing}{opening}{prompt}");
        document = Document::parse_with(&updated, base);
    }
    debug!(
        messages = document.messages.len(),
        "Prompt appended as the final user turn"
    );

    let reply = stream_reply(engine, &document.messages, &document.settings.model, framer).await?;

    let updated = append_reply(&updated, &document.settings, &reply);

    write_atomically(path, updated.as_bytes()).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = updated.len(), "Transcript saved");
    Ok(reply)
}

pub async fn run_save(input: Option<String>, file: Option<PathBuf>) -> Result<(), Box<dyn StdError>> {
    let Some(prompt) = read_prompt(input)? else {
        exit_no_prompt();
    };

    let config = load_config_or_exit();
    let path = file.unwrap_or_else(|| config.transcript_file());

    let engine = CompletionEngine::new(Credentials::from_env());
    let mut framer = ReplyFramer::new(io::stdout(), FramingMode::Raw);

    match save_exchange(&engine, &path, &prompt, config.base_settings(), &mut framer).await {
        Ok(_) => Ok(()),
        Err(SaveError::Reply(ReplyError::Completion(err))) => exit_with_completion_error(&err),
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }
}
