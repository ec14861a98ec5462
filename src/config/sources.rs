use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "CALLLOG_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/calllog.toml";
const ENV_PREFIX: &str = "CALLLOG";
const ENV_SEPARATOR: &str = "__";

/// Checked in order; the first one set wins
const AUTH_KEY_ENV_VARS: &[&str] = &["CALLLOG_AUTH_KEY", "COSMOS_AUTH_KEY"];

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_path(config_path)
}

/// Same as [`load`] with an explicit file path
pub fn load_path(config_path: PathBuf) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never stored in TOML files, only in environment
pub fn load_secrets(config: &mut Config) {
    if config.store.auth_key.is_some() {
        return;
    }

    config.store.auth_key = AUTH_KEY_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok())
        .filter(|key| !key.trim().is_empty());
}

/// Load configuration from a specific path and environment
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

    // CALLLOG__STORE__ENDPOINT -> store.endpoint
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreProvider;
    use crate::humanize::HumanDuration;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.store.provider, StoreProvider::Cosmos);
        assert_eq!(config.generator.count, 15);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[store]
endpoint = "https://acct.documents.azure.com:443/"
database = "telco"
container = "calls"
bulk = false
max_in_flight = 32
request_timeout = "5s"
connect_timeout = 1500

[generator]
count = 100
offset_days = 30
subscriber = "091-123-456-7890"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(
            config.store.endpoint.as_deref(),
            Some("https://acct.documents.azure.com:443/")
        );
        assert_eq!(config.store.database.as_deref(), Some("telco"));
        assert!(!config.store.bulk);
        assert_eq!(config.store.max_in_flight, 32);
        assert_eq!(config.store.request_timeout, HumanDuration::from_secs(5));
        assert_eq!(config.store.connect_timeout, HumanDuration::from_millis(1500));
        assert_eq!(config.generator.count, 100);
        assert_eq!(config.generator.subscriber.as_deref(), Some("091-123-456-7890"));
    }

    #[test]
    fn test_auth_key_in_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[store]\nauth_key = \"from-file\"\n").unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.store.auth_key.is_none());
    }

    // Environment overrides are exercised in integration tests to avoid
    // unsafe env::set_var in parallel unit tests
}
