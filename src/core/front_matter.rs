//! Front-matter extraction.
//!
//! A document may open with a settings block fenced by `+++` lines (TOML) or
//! `---` lines (YAML). The block must start at the very first byte. Its keys
//! use the camelCase names of [`Settings`]; unknown keys are ignored and a
//! block that fails to parse is logged and treated as empty.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::core::error::FrontMatterError;
use crate::core::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Toml,
    Yaml,
}

impl Dialect {
    pub fn fence(self) -> &'static str {
        match self {
            Dialect::Toml => "+++",
            Dialect::Yaml => "---",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Toml => "TOML",
            Dialect::Yaml => "YAML",
        }
    }

    fn pattern(self) -> &'static Regex {
        static TOML: OnceLock<Regex> = OnceLock::new();
        static YAML: OnceLock<Regex> = OnceLock::new();
        let cell = match self {
            Dialect::Toml => &TOML,
            Dialect::Yaml => &YAML,
        };
        cell.get_or_init(|| {
            let fence = regex::escape(self.fence());
            let source = format!(
                r"(?s)\A{fence}[ \t]*\r?\n(?:(.*?)\r?\n)?{fence}[ \t]*(?:\r?\n|\z)"
            );
            Regex::new(&source).expect("front matter pattern is valid")
        })
    }
}

/// Keys a front-matter block may set. Absent keys keep the base value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter {
    delimiter_prefix: Option<String>,
    delimiter_suffix: Option<String>,
    user_delimiter: Option<String>,
    assistant_delimiter: Option<String>,
    system_delimiter: Option<String>,
    model: Option<String>,
}

impl FrontMatter {
    fn apply(self, base: Settings) -> Settings {
        Settings {
            delimiter_prefix: self.delimiter_prefix.unwrap_or(base.delimiter_prefix),
            delimiter_suffix: self.delimiter_suffix.unwrap_or(base.delimiter_suffix),
            user_delimiter: self.user_delimiter.unwrap_or(base.user_delimiter),
            assistant_delimiter: self.assistant_delimiter.unwrap_or(base.assistant_delimiter),
            system_delimiter: self.system_delimiter.unwrap_or(base.system_delimiter),
            model: self.model.unwrap_or(base.model),
        }
    }
}

/// A located front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterBlock<'a> {
    pub dialect: Dialect,
    /// Text between the fence lines.
    pub interior: &'a str,
    /// Everything after the closing fence line.
    pub rest: &'a str,
}

/// Locate a front-matter block at the start of `text`, if any.
pub fn find_front_matter(text: &str) -> Option<FrontMatterBlock<'_>> {
    [Dialect::Toml, Dialect::Yaml]
        .into_iter()
        .find_map(|dialect| {
            let captures = dialect.pattern().captures(text)?;
            let whole = captures.get(0)?;
            Some(FrontMatterBlock {
                dialect,
                interior: captures.get(1).map_or("", |m| m.as_str()),
                rest: &text[whole.end()..],
            })
        })
}

fn parse_front_matter(dialect: Dialect, interior: &str) -> Result<FrontMatter, FrontMatterError> {
    if interior.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let result = match dialect {
        Dialect::Toml => toml::from_str::<FrontMatter>(interior).map_err(|err| err.to_string()),
        Dialect::Yaml => {
            serde_yaml::from_str::<FrontMatter>(interior).map_err(|err| err.to_string())
        }
    };

    result.map_err(|message| FrontMatterError {
        dialect: dialect.name(),
        message,
    })
}

/// Extract settings and body from `text`, using built-in defaults.
pub fn extract_settings(text: &str) -> (Settings, String) {
    extract_settings_with(text, Settings::default())
}

/// Extract settings and body from `text`, merging front-matter keys over
/// `base`. The body has the block removed and outer whitespace trimmed.
pub fn extract_settings_with(text: &str, base: Settings) -> (Settings, String) {
    let Some(block) = find_front_matter(text) else {
        return (base, text.trim().to_string());
    };

    let front_matter = match parse_front_matter(block.dialect, block.interior) {
        Ok(front_matter) => front_matter,
        Err(err) => {
            warn!(dialect = err.dialect, error = %err.message, "Ignoring malformed front matter");
            FrontMatter::default()
        }
    };

    (front_matter.apply(base), block.rest.trim().to_string())
}
