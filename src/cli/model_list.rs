//! Model listing functionality
//!
//! This module prints the models codey can route, grouped by provider.

use std::error::Error;
use std::fmt::Write as _;

use crate::cli::load_config_or_exit;
use crate::core::model_catalog::{list_providers, models_for};
use crate::core::providers::Provider;
use crate::core::settings::DEFAULT_MODEL;

/// The model listing, with `*` marking `default_model`.
pub fn render_model_list(filter: Option<Provider>, default_model: &str) -> String {
    let mut out = String::new();

    for provider in list_providers() {
        if filter.is_some_and(|wanted| wanted != provider) {
            continue;
        }
        let _ = writeln!(out, "{} ({})", provider.display_name(), provider.id());
        for model in models_for(provider) {
            let marker = if model == default_model { "*" } else { " " };
            let _ = writeln!(out, "  {marker} {model}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "* = default model");
    out
}

pub fn list_models(provider: Option<&str>) -> Result<(), Box<dyn Error>> {
    let filter = match provider {
        Some(id) => Some(Provider::from_id(id).ok_or_else(|| {
            format!("Unknown provider '{id}'. Run 'codey providers' to see the supported providers.")
        })?),
        None => None,
    };

    let config = load_config_or_exit();
    let default_model = config.default_model.as_deref().unwrap_or(DEFAULT_MODEL);

    println!("🤖 Available Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    print!("{}", render_model_list(filter, default_model));
    Ok(())
}
