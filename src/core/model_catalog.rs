//! Built-in model catalog
//!
//! This module loads the table of advertised models from the
//! builtin_models.toml file embedded at build time.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::core::providers::Provider;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProvider {
    pub id: Provider,
    pub models: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelCatalog {
    providers: Vec<CatalogProvider>,
}

fn parse_catalog(content: &str) -> Result<Vec<CatalogProvider>, toml::de::Error> {
    toml::from_str::<ModelCatalog>(content).map(|catalog| catalog.providers)
}

/// The embedded catalog, parsed once.
pub fn builtin_catalog() -> &'static [CatalogProvider] {
    const CATALOG_CONTENT: &str = include_str!("../builtin_models.toml");
    static CATALOG: OnceLock<Vec<CatalogProvider>> = OnceLock::new();

    CATALOG.get_or_init(|| {
        parse_catalog(CATALOG_CONTENT).expect("Failed to parse builtin_models.toml")
    })
}

/// The provider serving `model`, if the model is advertised.
pub fn provider_for_model(model: &str) -> Option<Provider> {
    builtin_catalog()
        .iter()
        .find(|entry| entry.models.iter().any(|m| m == model))
        .map(|entry| entry.id)
}

/// Every advertised model with its provider, in catalog order.
pub fn list_models() -> Vec<(&'static str, Provider)> {
    builtin_catalog()
        .iter()
        .flat_map(|entry| entry.models.iter().map(move |m| (m.as_str(), entry.id)))
        .collect()
}

/// Providers that serve at least one advertised model, in catalog order.
pub fn list_providers() -> Vec<Provider> {
    let mut providers: Vec<Provider> = Vec::new();
    for entry in builtin_catalog() {
        if !entry.models.is_empty() && !providers.contains(&entry.id) {
            providers.push(entry.id);
        }
    }
    providers
}

pub fn models_for(provider: Provider) -> Vec<&'static str> {
    builtin_catalog()
        .iter()
        .filter(|entry| entry.id == provider)
        .flat_map(|entry| entry.models.iter().map(String::as_str))
        .collect()
}
