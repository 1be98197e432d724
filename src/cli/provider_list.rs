use std::error::Error;
use std::fmt::Write as _;

use crate::core::model_catalog::list_providers;
use crate::core::providers::{Credentials, DEFAULT_OPENAI_BASE_URL};

pub fn render_provider_table(credentials: &Credentials) -> String {
    let mut table = String::new();
    table.push_str("| Provider | Display Name | URL | API Key |\n");
    table.push_str("|---|---|---|:---:|\n");

    for provider in list_providers() {
        let key_status = if credentials.has_key(provider) {
            "✅".to_string()
        } else {
            format!("❌ {}", provider.api_key_env())
        };
        let _ = writeln!(
            table,
            "| {} | {} | {} | {} |",
            provider.id(),
            provider.display_name(),
            provider.base_url().unwrap_or(DEFAULT_OPENAI_BASE_URL),
            key_status
        );
    }

    table
}

pub fn list_providers_command() -> Result<(), Box<dyn Error>> {
    println!("Supported Providers:\n");
    print!("{}", render_provider_table(&Credentials::from_env()));
    Ok(())
}
