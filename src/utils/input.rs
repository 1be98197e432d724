//! Prompt input from the command line or a pipe.

use std::io::{self, IsTerminal, Read};

/// The prompt text: `arg` when given, else stdin when it is piped.
///
/// Piped input is trimmed; an explicit argument is taken verbatim. Returns
/// `None` when neither source supplies any text.
pub fn read_prompt(arg: Option<String>) -> io::Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        read_prompt_from(arg, None::<io::Empty>)
    } else {
        read_prompt_from(arg, Some(stdin.lock()))
    }
}

pub fn read_prompt_from<R: Read>(arg: Option<String>, piped: Option<R>) -> io::Result<Option<String>> {
    if let Some(text) = arg.filter(|text| !text.is_empty()) {
        return Ok(Some(text));
    }

    let Some(mut reader) = piped else {
        return Ok(None);
    };

    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
