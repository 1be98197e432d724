use std::time::Duration;

use thiserror::Error;

use crate::core::providers::Provider;

/// A front-matter block was present but could not be parsed. Never fatal:
/// the extractor logs it and continues with default settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {dialect} front matter: {message}")]
pub struct FrontMatterError {
    pub dialect: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("No provider found for model: {0}")]
    UnknownModel(String),

    #[error("{var} environment variable is not set (required for {provider} models)")]
    MissingCredential { provider: Provider, var: &'static str },
}

/// Fatal failures of a streamed completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("No provider found for model: {0}")]
    UnknownModel(String),

    #[error("{var} environment variable is not set (required for {provider} models)")]
    MissingCredential { provider: Provider, var: &'static str },

    #[error("Provider did not start responding within {}s", .0.as_secs())]
    EstablishmentTimeout(Duration),

    #[error("No response chunk received within {}s", .0.as_secs())]
    ChunkTimeout(Duration),

    #[error("{0}")]
    Transport(String),
}

impl CompletionError {
    /// Process exit code the CLI uses for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_timeout() {
            return 3;
        }
        match self {
            CompletionError::UnknownModel(_) | CompletionError::MissingCredential { .. } => 2,
            _ => 1,
        }
    }

    /// Remedies to print beneath the error message.
    pub fn quick_fixes(&self) -> Vec<String> {
        match self {
            CompletionError::UnknownModel(_) => vec![
                "Run 'codey models' to see the supported models".to_string(),
                "Set 'model' in the document's front matter or pass --model".to_string(),
            ],
            CompletionError::MissingCredential { var, .. } => {
                vec![format!("export {var}=\"your-api-key-here\"")]
            }
            CompletionError::EstablishmentTimeout(_) | CompletionError::ChunkTimeout(_) => {
                vec!["Retry shortly; the provider may be overloaded".to_string()]
            }
            CompletionError::Transport(_) => Vec::new(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CompletionError::EstablishmentTimeout(_) | CompletionError::ChunkTimeout(_)
        )
    }
}

impl From<ProviderError> for CompletionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UnknownModel(model) => CompletionError::UnknownModel(model),
            ProviderError::MissingCredential { provider, var } => {
                CompletionError::MissingCredential { provider, var }
            }
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}
