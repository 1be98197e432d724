use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::settings::Settings;

pub const DEFAULT_TRANSCRIPT_FILE: &str = "codey.md";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model used when a document's front matter does not name one
    pub default_model: Option<String>,
    /// Transcript file `codey save` appends to
    pub default_file: Option<String>,
}

impl Config {
    /// Settings that front-matter extraction starts from.
    pub fn base_settings(&self) -> Settings {
        match &self.default_model {
            Some(model) => Settings::with_model(model.clone()),
            None => Settings::default(),
        }
    }

    pub fn transcript_file(&self) -> PathBuf {
        PathBuf::from(
            self.default_file
                .as_deref()
                .unwrap_or(DEFAULT_TRANSCRIPT_FILE),
        )
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = Some(model.into());
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/codey/config.toml` → `~/.config/codey/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
