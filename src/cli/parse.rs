//! `codey parse`: show how a transcript is read.

use std::error::Error;
use std::io::{self, Write};

use crate::cli::{exit_no_prompt, load_config_or_exit};
use crate::core::transcript::Document;
use crate::utils::input::read_prompt;

/// Write each message of `document` as one JSON object per line.
pub fn write_messages<W: Write>(document: &Document, mut out: W) -> io::Result<()> {
    for message in &document.messages {
        serde_json::to_writer(&mut out, message)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

pub fn run_parse(input: Option<String>) -> Result<(), Box<dyn Error>> {
    let Some(text) = read_prompt(input)? else {
        exit_no_prompt();
    };

    let config = load_config_or_exit();
    let document = Document::parse_with(&text, config.base_settings());
    write_messages(&document, io::stdout().lock())?;
    Ok(())
}
