//! Configuration management for qrstudio
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use qrstudio::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `QRSTUDIO__<section>__<key>`:
//! - `QRSTUDIO__SERVER__BIND_ADDR=0.0.0.0:8080`
//! - `QRSTUDIO__SERVER__MAX_UPLOAD_BYTES=20MB`
//! - `QRSTUDIO__STYLE__FONT_PATH=/usr/share/fonts/Inter.ttf`
//!
//! # Configuration File
//!
//! Read from `config/qrstudio.toml` unless `QRSTUDIO_CONFIG` points elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    BatchConfig, Config, HistoryConfig, ServerConfig, StyleConfig, UrlCheckConfig,
};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], with the file path taken from the command line when given
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[history]\ncapacity = 10\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.style.max_size, 2400);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[style]
max_size = 800
default_size = 1200
        "#;
        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(ValidationError::SizeOutOfBounds {
                field: "style.default_size",
                ..
            }))
        ));
    }

    #[test]
    fn test_malformed_value_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\nmax_upload_bytes = \"lots\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
