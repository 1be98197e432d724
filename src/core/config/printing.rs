use crate::core::config::data::{path_display, Config, DEFAULT_TRANSCRIPT_FILE};
use crate::core::settings::DEFAULT_MODEL;
use std::path::Path;

impl Config {
    pub fn print_all(&self, config_path: Option<&Path>) {
        println!("Current configuration:");
        match config_path {
            Some(path) => println!("  file: {}", path_display(path)),
            None => println!("  file: (no configuration directory)"),
        }
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset, using {DEFAULT_MODEL})"),
        }
        match &self.default_file {
            Some(file) => println!("  default-file: {file}"),
            None => println!("  default-file: (unset, using {DEFAULT_TRANSCRIPT_FILE})"),
        }
    }
}
