use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "QRSTUDIO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/qrstudio.toml";
const ENV_PREFIX: &str = "QRSTUDIO";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (serde defaults on the structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = explicit_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    load_from_sources(config_path)
}

/// Load configuration from a specific path and the environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // QRSTUDIO__STYLE__MAX_SIZE -> style.max_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:7860");
        assert_eq!(config.history.capacity, 50);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:9000"
max_upload_bytes = "4MB"

[style]
min_size = 300
max_size = 1200
font_path = "/opt/fonts/Inter.ttf"

[batch]
max_rows = 25
tile_size = 300

[url_check]
timeout_secs = 2
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(config.server.max_upload_bytes.as_u64(), 4 * 1024 * 1024);
        assert_eq!(config.style.max_size, 1200);
        assert_eq!(
            config.style.font_path.as_deref(),
            Some(std::path::Path::new("/opt/fonts/Inter.ttf"))
        );
        assert_eq!(config.batch.max_rows, 25);
        assert_eq!(config.url_check.timeout_secs, 2);
        // Untouched keys keep their defaults
        assert_eq!(config.style.default_logo_scale, 0.18);
        assert_eq!(config.batch.gallery_gap, 20);
    }

    // Environment overrides are not exercised here: `env::set_var` is unsafe in edition 2024.
}
