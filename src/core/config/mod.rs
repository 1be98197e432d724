pub mod data;
pub mod io;
pub mod printing;

pub use data::{path_display, Config, DEFAULT_TRANSCRIPT_FILE};
pub use io::{ConfigError, CONFIG_PATH_ENV};
