use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::ProviderError;
use crate::core::model_catalog::provider_for_model;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// The closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Xai,
    OpenAi,
    Anthropic,
}

/// How a provider expects its API key to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `x-api-key: <key>` plus `anthropic-version`
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Xai, Provider::OpenAi, Provider::Anthropic];

    pub fn id(self) -> &'static str {
        match self {
            Provider::Xai => "xai",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Xai => "xAI",
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::Xai => "XAI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Fixed endpoint override. `None` means the client's standard default.
    pub fn base_url(self) -> Option<&'static str> {
        match self {
            Provider::Xai => Some(XAI_BASE_URL),
            Provider::OpenAi => None,
            Provider::Anthropic => Some(ANTHROPIC_BASE_URL),
        }
    }

    pub fn auth_mode(self) -> AuthMode {
        match self {
            Provider::Anthropic => AuthMode::Anthropic,
            Provider::Xai | Provider::OpenAi => AuthMode::Bearer,
        }
    }

    pub fn from_id(id: &str) -> Option<Provider> {
        Self::ALL.into_iter().find(|p| p.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// API keys available to the router, keyed by provider.
///
/// Built at the process boundary (usually [`Credentials::from_env`]) and
/// passed in explicitly so resolution itself never touches the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<Provider, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every provider's key through `lookup`, keyed by variable name.
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys = Provider::ALL
            .into_iter()
            .filter_map(|provider| {
                lookup(provider.api_key_env())
                    .filter(|key| !key.is_empty())
                    .map(|key| (provider, key))
            })
            .collect();
        Self { keys }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn with_key(mut self, provider: Provider, api_key: impl Into<String>) -> Self {
        self.keys.insert(provider, api_key.into());
        self
    }

    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn has_key(&self, provider: Provider) -> bool {
        self.keys.contains_key(&provider)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configured: Vec<&str> = self.keys.keys().map(|p| p.id()).collect();
        configured.sort_unstable();
        f.debug_struct("Credentials")
            .field("configured", &configured)
            .finish()
    }
}

/// Everything needed to reach the provider serving one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderBinding {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl ProviderBinding {
    /// The base URL to send requests to, with the standard default filled in.
    pub fn endpoint_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Map `model` to its provider and attach that provider's credential.
pub fn resolve_provider(
    model: &str,
    credentials: &Credentials,
) -> Result<ProviderBinding, ProviderError> {
    let provider =
        provider_for_model(model).ok_or_else(|| ProviderError::UnknownModel(model.to_string()))?;

    let api_key = credentials
        .api_key(provider)
        .ok_or(ProviderError::MissingCredential {
            provider,
            var: provider.api_key_env(),
        })?;

    debug!(
        model,
        provider = provider.id(),
        base_url = provider.base_url().unwrap_or("<default>"),
        "Resolved provider"
    );

    Ok(ProviderBinding {
        provider,
        api_key: api_key.to_string(),
        base_url: provider.base_url().map(str::to_string),
    })
}
