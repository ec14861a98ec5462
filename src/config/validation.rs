use super::models::{Config, GeneratorConfig, StoreConfig, StoreProvider};
use crate::record::MAX_OFFSET_DAYS;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("store.{field} is required for the {provider} provider")]
    MissingStoreSetting {
        field: &'static str,
        provider: &'static str,
    },

    #[error("store.endpoint '{endpoint}' is not a valid http(s) URL: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("store.{field} '{value}' must be non-empty without '/', '\\', '?', '#' or whitespace")]
    InvalidResourceName { field: &'static str, value: String },

    #[error("Store credential missing: set CALLLOG_AUTH_KEY or COSMOS_AUTH_KEY")]
    MissingCredential,

    #[error("store.max_in_flight must be positive")]
    InvalidMaxInFlight,

    #[error("store.{field} must be positive")]
    ZeroTimeout { field: &'static str },

    #[error("generator.location_count must be positive")]
    NoLocations,

    #[error("generator.base_location_id {base} is outside 1..={count}")]
    InvalidBaseLocation { base: u32, count: u32 },

    #[error("generator.offset_days {offset_days} exceeds the maximum of {max}")]
    OffsetTooLarge { offset_days: u32, max: u32 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(&config.store)?;
    validate_generator(&config.generator)?;
    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ValidationError> {
    if store.max_in_flight == 0 {
        return Err(ValidationError::InvalidMaxInFlight);
    }
    if store.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout",
        });
    }
    if store.request_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout",
        });
    }

    if store.provider == StoreProvider::Memory {
        return Ok(());
    }

    let endpoint = required(&store.endpoint, "endpoint")?;
    let url = Url::parse(endpoint).map_err(|e| ValidationError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    resource_name(required(&store.database, "database")?, "database")?;
    resource_name(required(&store.container, "container")?, "container")?;

    match store.auth_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingCredential),
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingStoreSetting {
            field,
            provider: "cosmos",
        })
}

/// Database and container ids end up as path segments of every request
fn resource_name(value: &str, field: &'static str) -> Result<(), ValidationError> {
    let forbidden = |c: char| matches!(c, '/' | '\\' | '?' | '#') || c.is_whitespace();
    if value.is_empty() || value.contains(forbidden) {
        return Err(ValidationError::InvalidResourceName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Generator settings alone, for runs that never touch a store
pub fn validate_generator(generator: &GeneratorConfig) -> Result<(), ValidationError> {
    if generator.offset_days > MAX_OFFSET_DAYS {
        return Err(ValidationError::OffsetTooLarge {
            offset_days: generator.offset_days,
            max: MAX_OFFSET_DAYS,
        });
    }
    if generator.location_count == 0 {
        return Err(ValidationError::NoLocations);
    }
    if generator.base_location_id == 0 || generator.base_location_id > generator.location_count {
        return Err(ValidationError::InvalidBaseLocation {
            base: generator.base_location_id,
            count: generator.location_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::*;
    use crate::humanize::HumanDuration;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.store.endpoint = Some("https://acct.documents.azure.com:443/".to_string());
        config.store.database = Some("telco".to_string());
        config.store.container = Some("calls".to_string());
        config.store.auth_key = Some("a2V5".to_string());
        config
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_memory_provider_needs_no_endpoint() {
        let mut config = Config::default();
        config.store.provider = StoreProvider::Memory;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_endpoint() {
        let mut config = create_test_config();
        config.store.endpoint = None;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::MissingStoreSetting {
                field: "endpoint",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_container() {
        let mut config = create_test_config();
        config.store.container = Some("   ".to_string());

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::MissingStoreSetting {
                field: "container",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_endpoint() {
        let mut config = create_test_config();
        config.store.endpoint = Some("not a url".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidEndpoint { .. })
        ));

        config.store.endpoint = Some("ftp://acct.documents.azure.com".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_database_with_slash() {
        let mut config = create_test_config();
        config.store.database = Some("tel/co".to_string());

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidResourceName {
                field: "database",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_credential() {
        let mut config = create_test_config();
        config.store.auth_key = None;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::MissingCredential)));
    }

    #[test]
    fn test_zero_in_flight() {
        let mut config = create_test_config();
        config.store.max_in_flight = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidMaxInFlight)
        ));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = create_test_config();
        config.store.request_timeout = HumanDuration::from_millis(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroTimeout {
                field: "request_timeout"
            })
        ));
    }

    #[test]
    fn test_base_location_out_of_range() {
        let mut config = create_test_config();
        config.generator.base_location_id = 9;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseLocation { base: 9, count: 5 })
        ));

        config.generator.location_count = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::NoLocations)
        ));
    }

    #[test]
    fn test_offset_days_upper_bound() {
        let mut config = create_test_config();
        config.generator.offset_days = MAX_OFFSET_DAYS;
        assert!(validate(&config).is_ok());

        config.generator.offset_days = MAX_OFFSET_DAYS + 1;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::OffsetTooLarge { max: MAX_OFFSET_DAYS, .. })
        ));

        config.generator.offset_days = u32::MAX;
        assert!(matches!(
            validate_generator(&config.generator),
            Err(ValidationError::OffsetTooLarge { offset_days: u32::MAX, .. })
        ));
    }
}
