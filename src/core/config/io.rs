use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "CODEY_CONFIG";

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config at {}: {source}", path_display(.path))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config at {}: {source}", path_display(.path))]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to write the configuration file.
    #[error("Failed to write config at {}: {source}", path_display(.path))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not determine a configuration directory; set CODEY_CONFIG")]
    NoConfigDir,
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        match Self::config_path() {
            Some(config_path) => Self::load_from_path(&config_path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file; using defaults");
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let config_path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to_path(&config_path)?;
        Ok(config_path)
    }

    /// Write the config through a temporary file so readers never see a
    /// partial file.
    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let write_error = |source: std::io::Error| ConfigError::Write {
            path: config_path.to_path_buf(),
            source,
        };

        let contents = toml::to_string_pretty(self)
            .map_err(|err| write_error(std::io::Error::other(err)))?;
        write_atomically(config_path, contents.as_bytes()).map_err(write_error)
    }

    /// The config file location: `CODEY_CONFIG` when set, otherwise
    /// `config.toml` in the platform config directory.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_path_from(|var| std::env::var_os(var).map(PathBuf::from))
    }

    pub(crate) fn config_path_from<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.as_os_str().is_empty()) {
            return Some(path);
        }
        ProjectDirs::from("org", "codeybeaver", "codey")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
    }
}

/// Replace `path` with `contents` via a synced sibling temp file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };

    temp_file.write_all(contents)?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
