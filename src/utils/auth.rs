//! Provider-specific authentication headers.

use crate::core::providers::{AuthMode, Provider};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Attach `api_key` to `request` the way `provider` expects it.
///
/// Anthropic takes `x-api-key` plus an `anthropic-version` header; every
/// other provider takes a bearer token.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    provider: Provider,
    api_key: &str,
) -> reqwest::RequestBuilder {
    match provider.auth_mode() {
        AuthMode::Anthropic => request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
        AuthMode::Bearer => request.header("Authorization", format!("Bearer {api_key}")),
    }
}
