//! Writing replies and transcripts back out in delimiter form.

use std::io::{self, Write};

use serde::Serialize;

use crate::core::message::{Message, Role};
use crate::core::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// Concatenated text, terminated by a newline.
    #[default]
    Raw,
    /// One `{"chunk": ...}` JSON record per line.
    Chunked,
}

impl FramingMode {
    pub fn from_chunk_flag(chunk: bool) -> Self {
        if chunk {
            FramingMode::Chunked
        } else {
            FramingMode::Raw
        }
    }
}

#[derive(Serialize)]
struct ChunkRecord<'a> {
    chunk: &'a str,
}

/// The literals that bracket an assistant reply: the assistant delimiter
/// before it and the user delimiter after it.
pub fn reply_brackets(settings: &Settings) -> (String, String) {
    (
        settings.delimiter(Role::Assistant),
        settings.delimiter(Role::User),
    )
}

/// Streams one reply to `out`, optionally bracketed so the output can be
/// appended to the transcript it answers.
pub struct ReplyFramer<W: Write> {
    out: W,
    mode: FramingMode,
    brackets: Option<(String, String)>,
}

impl<W: Write> ReplyFramer<W> {
    pub fn new(out: W, mode: FramingMode) -> Self {
        Self {
            out,
            mode,
            brackets: None,
        }
    }

    pub fn with_delimiters(mut self, settings: &Settings) -> Self {
        self.brackets = Some(reply_brackets(settings));
        self
    }

    /// Call once the provider has started responding.
    pub fn open(&mut self) -> io::Result<()> {
        if let Some(open) = self.brackets.as_ref().map(|(open, _)| open.clone()) {
            self.write_record(&open)?;
        }
        self.out.flush()
    }

    pub fn fragment(&mut self, text: &str) -> io::Result<()> {
        self.write_record(text)?;
        self.out.flush()
    }

    /// Write the closing delimiter (if any) and, in raw mode, the final
    /// newline.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some((_, close)) = self.brackets.take() {
            self.write_record(&close)?;
        }
        if self.mode == FramingMode::Raw {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, text: &str) -> io::Result<()> {
        match self.mode {
            FramingMode::Raw => self.out.write_all(text.as_bytes()),
            FramingMode::Chunked => {
                serde_json::to_writer(&mut self.out, &ChunkRecord { chunk: text })?;
                self.out.write_all(b"\n")
            }
        }
    }
}

/// `document` followed by `reply` in assistant/user brackets, ready for the
/// next user turn.
pub fn append_reply(document: &str, settings: &Settings, reply: &str) -> String {
    let (open, close) = reply_brackets(settings);
    let mut updated = String::with_capacity(document.len() + open.len() + reply.len() + close.len());
    updated.push_str(document);
    updated.push_str(&open);
    updated.push_str(reply);
    updated.push_str(&close);
    updated
}

/// Render `messages` as a transcript body that parses back to the same
/// messages under `settings`, provided no content is blank or contains a
/// delimiter.
pub fn render_transcript(messages: &[Message], settings: &Settings) -> String {
    messages
        .iter()
        .map(|message| format!("{}{}", settings.delimiter(message.role), message.content))
        .collect()
}
