//! Builds the single long-lived client a run writes through

use std::sync::Arc;

use reqwest::Url;
use tracing::info;

use super::cosmos::{CosmosClient, CosmosOptions};
use super::error::ConnectionError;
use super::memory::MemoryStore;
use super::StoreClient;
use crate::config::{StoreConfig, StoreProvider};

/// Connect to the configured store
///
/// Any error here is fatal for the run: nothing is dispatched without a
/// client.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn StoreClient>, ConnectionError> {
    match config.provider {
        StoreProvider::Memory => {
            let store = match config.simulated_latency {
                Some(latency) => MemoryStore::with_latency(latency.as_duration()),
                None => MemoryStore::new(),
            };
            info!(latency = ?config.simulated_latency, "Using in-memory store");
            Ok(Arc::new(store))
        }
        StoreProvider::Cosmos => {
            let client = connect_cosmos(config).await?;
            Ok(Arc::new(client))
        }
    }
}

/// Build and, unless disabled, probe a Cosmos client
pub async fn connect_cosmos(config: &StoreConfig) -> Result<CosmosClient, ConnectionError> {
    let options = cosmos_options(config)?;
    let auth_key = config
        .auth_key
        .as_deref()
        .ok_or_else(|| ConnectionError::MissingCredential(options.endpoint.to_string()))?;

    let client = CosmosClient::new(options, auth_key)?;

    if config.verify_on_connect {
        client.verify().await?;
        info!("Cosmos container verified");
    }

    Ok(client)
}

fn cosmos_options(config: &StoreConfig) -> Result<CosmosOptions, ConnectionError> {
    let raw_endpoint = config.endpoint.as_deref().unwrap_or_default();
    let endpoint = Url::parse(raw_endpoint).map_err(|e| ConnectionError::InvalidEndpoint {
        endpoint: raw_endpoint.to_string(),
        reason: e.to_string(),
    })?;

    let name = |value: &Option<String>, field: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConnectionError::InvalidEndpoint {
                endpoint: raw_endpoint.to_string(),
                reason: format!("{} name is missing", field),
            })
    };

    Ok(CosmosOptions {
        endpoint,
        database: name(&config.database, "database")?,
        container: name(&config.container, "container")?,
        bulk: config.bulk,
        max_in_flight: config.max_in_flight,
        connect_timeout: config.connect_timeout.as_duration(),
        request_timeout: config.request_timeout.as_duration(),
    })
}
