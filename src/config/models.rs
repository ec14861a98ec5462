use crate::humanize::HumanDuration;
use crate::record::GeneratorOptions;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Store back-end type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    #[default]
    Cosmos,
    Memory,
}

/// Target store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub provider: StoreProvider,
    /// Account endpoint, e.g. `https://<account>.documents.azure.com:443/`
    pub endpoint: Option<String>,
    pub database: Option<String>,
    pub container: Option<String>,
    /// Account key (loaded from environment, not from config file)
    #[serde(skip)]
    pub auth_key: Option<String>,
    #[serde(default = "default_bulk")]
    pub bulk: bool,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    /// Read the container once at startup so bad settings fail before dispatch
    #[serde(default = "default_verify_on_connect")]
    pub verify_on_connect: bool,
    /// Artificial per-write latency for the memory provider
    #[serde(default)]
    pub simulated_latency: Option<HumanDuration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::default(),
            endpoint: None,
            database: None,
            container: None,
            auth_key: None,
            bulk: default_bulk(),
            max_in_flight: default_max_in_flight(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            verify_on_connect: default_verify_on_connect(),
            simulated_latency: None,
        }
    }
}

fn default_bulk() -> bool {
    true
}

fn default_max_in_flight() -> usize {
    100
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_verify_on_connect() -> bool {
    true
}

/// Synthetic call generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_offset_days")]
    pub offset_days: u32,
    /// Fixed subscriber number; random per call when unset
    pub subscriber: Option<String>,
    #[serde(default = "default_base_location_id")]
    pub base_location_id: u32,
    #[serde(default = "default_location_count")]
    pub location_count: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            offset_days: default_offset_days(),
            subscriber: None,
            base_location_id: default_base_location_id(),
            location_count: default_location_count(),
        }
    }
}

impl GeneratorConfig {
    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            offset_days: self.offset_days,
            subscriber: self.subscriber.clone().filter(|s| !s.is_empty()),
            base_location_id: self.base_location_id,
            location_count: self.location_count,
        }
    }
}

fn default_count() -> usize {
    15
}

fn default_offset_days() -> u32 {
    90
}

fn default_base_location_id() -> u32 {
    5
}

fn default_location_count() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.store.provider, StoreProvider::Cosmos);
        assert!(config.store.bulk);
        assert_eq!(config.store.max_in_flight, 100);
        assert_eq!(config.store.request_timeout, HumanDuration::from_secs(60));
        assert_eq!(config.generator.count, 15);
        assert_eq!(config.generator.offset_days, 90);
    }

    #[test]
    fn test_empty_subscriber_means_random() {
        let generator = GeneratorConfig {
            subscriber: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(generator.options().subscriber, None);
    }

    #[test]
    fn test_auth_key_never_serialized() {
        let mut config = Config::default();
        config.store.auth_key = Some("secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
