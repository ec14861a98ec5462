//! Configuration management for calllog
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use calllog::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Writing to: {:?}", config.store.endpoint);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `CALLLOG__<section>__<key>`
//!
//! Examples:
//! - `CALLLOG__STORE__ENDPOINT=https://acct.documents.azure.com:443/`
//! - `CALLLOG__STORE__MAX_IN_FLIGHT=250`
//! - `CALLLOG__GENERATOR__OFFSET_DAYS=30`
//!
//! The account key is a secret and is only read from `CALLLOG_AUTH_KEY`
//! (or `COSMOS_AUTH_KEY`), never from the file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/calllog.toml`.
//! This can be overridden using the `CALLLOG_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, GeneratorConfig, StoreConfig, StoreProvider};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment + secrets)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails
    /// (missing endpoint, credential, database or container).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Secrets are read from the environment as in [`Config::load`].
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load file and environment without validating
    ///
    /// Falls back to `$CALLLOG_CONFIG` / the default path when `path` is
    /// `None`. Callers validate the sections they use.
    pub fn read(path: Option<std::path::PathBuf>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => sources::load_path(path)?,
            None => sources::load()?,
        };
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_generator(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_memory_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[store]
provider = "memory"
simulated_latency = "5ms"

[generator]
count = 3
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.store.provider, StoreProvider::Memory);
        assert_eq!(
            config.store.simulated_latency,
            Some(HumanDuration::from_millis(5))
        );
        assert_eq!(config.generator.count, 3);
    }

    #[test]
    fn test_validation_catches_bad_base_location() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[store]
provider = "memory"

[generator]
base_location_id = 12
location_count = 4
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidBaseLocation { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[store]\nmax_in_flight = \"lots\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }

    #[test]
    fn test_read_generator_section_without_store() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[generator]
count = 4
subscriber = "091-123-456-7890"
base_location_id = 2
location_count = 3
        "#;

        fs::write(&config_path, toml_content).unwrap();

        // The cosmos store section is incomplete, which only matters for inserts
        assert!(Config::load_from_path(config_path.clone()).is_err());

        let config = Config::read(Some(config_path)).unwrap();
        config.generator.validate().unwrap();

        let options = config.generator.options();
        assert_eq!(options.subscriber.as_deref(), Some("091-123-456-7890"));
        assert_eq!(options.base_location_id, 2);
        assert_eq!(options.location_count, 3);
    }

    #[test]
    fn test_read_keeps_out_of_range_offset_for_validation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[generator]\noffset_days = 4294967295\n").unwrap();

        let config = Config::read(Some(config_path)).unwrap();
        assert!(matches!(
            config.generator.validate(),
            Err(ValidationError::OffsetTooLarge { .. })
        ));
    }
}
