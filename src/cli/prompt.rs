//! `codey prompt`: send a transcript and stream the reply to stdout.

use std::error::Error as StdError;
use std::io::{self, Write};

use futures_util::StreamExt;
use thiserror::Error;
use tracing::debug;

use crate::cli::{exit_no_prompt, exit_with_completion_error, load_config_or_exit};
use crate::core::chat_stream::{CompletionEngine, CompletionTransport};
use crate::core::error::CompletionError;
use crate::core::message::Message;
use crate::core::providers::Credentials;
use crate::core::reframe::{FramingMode, ReplyFramer};
use crate::core::settings::Settings;
use crate::core::transcript::Document;
use crate::utils::input::read_prompt;

pub struct PromptOptions {
    pub input: Option<String>,
    pub model: Option<String>,
    pub chunk: bool,
    pub add_delimiters: bool,
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("Failed to write reply: {0}")]
    Output(#[from] io::Error),
}

/// Stream one completion of `messages` through `framer`, returning the
/// reply text. Fragments are written as they arrive, so a failure part way
/// through leaves the earlier fragments in the output.
pub async fn stream_reply<T, W>(
    engine: &CompletionEngine<T>,
    messages: &[Message],
    model: &str,
    framer: &mut ReplyFramer<W>,
) -> Result<String, ReplyError>
where
    T: CompletionTransport,
    W: Write,
{
    let mut stream = engine.stream_completion(messages, model).await?;
    framer.open()?;

    let mut reply = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        framer.fragment(&fragment)?;
        reply.push_str(&fragment);
    }

    framer.close()?;
    debug!(model, reply_bytes = reply.len(), "Reply complete");
    Ok(reply)
}

/// The model a request goes to: the explicit override, else whatever the
/// document's settings ended up with.
pub fn effective_model(override_model: Option<&str>, settings: &Settings) -> String {
    override_model
        .filter(|model| !model.is_empty())
        .unwrap_or(&settings.model)
        .to_string()
}

pub async fn run_prompt(options: PromptOptions) -> Result<(), Box<dyn StdError>> {
    let Some(text) = read_prompt(options.input)? else {
        exit_no_prompt();
    };

    let config = load_config_or_exit();
    let document = Document::parse_with(&text, config.base_settings());
    let model = effective_model(options.model.as_deref(), &document.settings);

    let engine = CompletionEngine::new(Credentials::from_env());
    let mut framer = ReplyFramer::new(io::stdout(), FramingMode::from_chunk_flag(options.chunk));
    if options.add_delimiters {
        framer = framer.with_delimiters(&document.settings);
    }

    match stream_reply(&engine, &document.messages, &model, &mut framer).await {
        Ok(_) => Ok(()),
        Err(ReplyError::Completion(err)) => exit_with_completion_error(&err),
        Err(err) => Err(err.into()),
    }
}
