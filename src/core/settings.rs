//! Per-document settings: delimiter shape and model selection.

use serde::{Deserialize, Serialize};

use crate::core::message::Role;

pub const DEFAULT_MODEL: &str = "grok-3";
pub const DEFAULT_DELIMITER_PREFIX: &str = "\n\n";
pub const DEFAULT_DELIMITER_SUFFIX: &str = "\n\n";
pub const DEFAULT_USER_DELIMITER: &str = "# === USER ===";
pub const DEFAULT_ASSISTANT_DELIMITER: &str = "# === ASSISTANT ===";
pub const DEFAULT_SYSTEM_DELIMITER: &str = "# === SYSTEM ===";

/// Fully-defaulted settings for one parsed document.
///
/// Field names serialize in camelCase so the struct round-trips through the
/// same keys a front-matter block uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub delimiter_prefix: String,
    pub delimiter_suffix: String,
    pub user_delimiter: String,
    pub assistant_delimiter: String,
    pub system_delimiter: String,
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delimiter_prefix: DEFAULT_DELIMITER_PREFIX.to_string(),
            delimiter_suffix: DEFAULT_DELIMITER_SUFFIX.to_string(),
            user_delimiter: DEFAULT_USER_DELIMITER.to_string(),
            assistant_delimiter: DEFAULT_ASSISTANT_DELIMITER.to_string(),
            system_delimiter: DEFAULT_SYSTEM_DELIMITER.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Settings {
    /// Default settings with a different model, used to seed extraction with
    /// a configured default.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// The bare role marker (without prefix/suffix).
    pub fn role_marker(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user_delimiter,
            Role::Assistant => &self.assistant_delimiter,
            Role::System => &self.system_delimiter,
        }
    }

    /// The full delimiter literal `prefix + marker + suffix` for `role`.
    pub fn delimiter(&self, role: Role) -> String {
        format!(
            "{}{}{}",
            self.delimiter_prefix,
            self.role_marker(role),
            self.delimiter_suffix
        )
    }

    /// Delimiter literals in user, assistant, system order.
    pub fn delimiters(&self) -> [(Role, String); 3] {
        Role::ALL.map(|role| (role, self.delimiter(role)))
    }

    /// Pairs of roles whose delimiter literals are equal or where the first
    /// occurs inside the second. Tokenizing with such settings is ambiguous.
    pub fn delimiter_conflicts(&self) -> Vec<(Role, Role)> {
        let delimiters = self.delimiters();
        let mut conflicts = Vec::new();
        for (i, (inner_role, inner)) in delimiters.iter().enumerate() {
            for (j, (outer_role, outer)) in delimiters.iter().enumerate() {
                if i == j || inner.is_empty() {
                    continue;
                }
                let counted = inner == outer && j < i;
                if !counted && outer.contains(inner.as_str()) {
                    conflicts.push((*inner_role, *outer_role));
                }
            }
        }
        conflicts
    }
}
