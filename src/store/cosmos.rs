//! Cosmos DB SQL API client over REST
//!
//! Only the two calls the pipeline needs are implemented: reading the target
//! collection (connect-time probe) and creating a document.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::auth::{MasterKey, rfc1123_now};
use super::error::{ConnectionError, StoreError, SubmissionError};
use super::{PendingWrite, StoreClient, WriteReceipt, check_routing};
use crate::record::{CallRecord, PartitionKey};

pub const API_VERSION: &str = "2018-12-31";

/// Largest document the service accepts
pub const MAX_ITEM_BYTES: usize = 2 * 1024 * 1024;

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_REQUEST_CHARGE: &str = "x-ms-request-charge";
const HEADER_SUB_STATUS: &str = "x-ms-substatus";

#[derive(Debug, Clone)]
pub struct CosmosOptions {
    pub endpoint: Url,
    pub database: String,
    pub container: String,
    /// Pipeline many small writes over a pooled, bounded set of requests
    pub bulk: bool,
    pub max_in_flight: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl CosmosOptions {
    pub fn new(endpoint: Url, database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            endpoint,
            database: database.into(),
            container: container.into(),
            bulk: true,
            max_in_flight: 100,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Shared handle to one Cosmos container; cheap to clone
#[derive(Clone)]
pub struct CosmosClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    key: MasterKey,
    endpoint: Url,
    collection_link: String,
    collection_url: Url,
    docs_url: Url,
    in_flight: Option<Arc<Semaphore>>,
    closed: AtomicBool,
}

impl CosmosClient {
    /// Build the client without touching the network
    pub fn new(options: CosmosOptions, auth_key: &str) -> Result<Self, ConnectionError> {
        let key = MasterKey::parse(auth_key)?;

        let mut endpoint = options.endpoint.clone();
        if !matches!(endpoint.scheme(), "http" | "https") {
            let reason = format!("unsupported scheme '{}'", endpoint.scheme());
            return Err(invalid_endpoint(&endpoint, reason));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let collection_link = format!("dbs/{}/colls/{}", options.database, options.container);
        let collection_url = endpoint
            .join(&collection_link)
            .map_err(|e| invalid_endpoint(&endpoint, e))?;
        let docs_url = endpoint
            .join(&format!("{}/docs", collection_link))
            .map_err(|e| invalid_endpoint(&endpoint, e))?;

        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .user_agent(concat!("calllog/", env!("CARGO_PKG_VERSION")));

        let in_flight = if options.bulk {
            builder = builder
                .pool_max_idle_per_host(options.max_in_flight)
                .tcp_nodelay(true);
            Some(Arc::new(Semaphore::new(options.max_in_flight.max(1))))
        } else {
            None
        };

        let http = builder.build()?;

        info!(
            endpoint = %endpoint,
            collection = %collection_link,
            bulk = options.bulk,
            max_in_flight = options.max_in_flight,
            "Cosmos client configured"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                key,
                endpoint,
                collection_link,
                collection_url,
                docs_url,
                in_flight,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Read the target collection to prove endpoint, key and names line up
    pub async fn verify(&self) -> Result<(), ConnectionError> {
        let date = rfc1123_now();
        let authorization =
            self.inner
                .key
                .authorization("get", "colls", &self.inner.collection_link, &date);

        let response = self
            .inner
            .http
            .get(self.inner.collection_url.clone())
            .header("authorization", authorization)
            .header(HEADER_DATE, date)
            .header(HEADER_VERSION, API_VERSION)
            .send()
            .await
            .map_err(|e| ConnectionError::Unreachable {
                endpoint: self.inner.endpoint.to_string(),
                detail: error_chain(&e),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(collection = %self.inner.collection_link, "Collection reachable");
            return Ok(());
        }

        let message = read_error_message(response)
            .await
            .unwrap_or_else(|e| e.to_string());
        Err(ConnectionError::Refused {
            status: status.as_u16(),
            message,
        })
    }

    /// Refuse further submissions; writes already in flight still settle
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn docs_url(&self) -> &Url {
        &self.inner.docs_url
    }
}

impl StoreClient for CosmosClient {
    fn submit(
        &self,
        record: &CallRecord,
        partition_key: &PartitionKey,
    ) -> Result<PendingWrite, SubmissionError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SubmissionError::Closed);
        }
        check_routing(record, partition_key)?;

        let id = record.id().to_string();
        let body = serde_json::to_vec(record).map_err(|source| SubmissionError::Serialization {
            id: id.clone(),
            source,
        })?;
        if body.len() > MAX_ITEM_BYTES {
            return Err(SubmissionError::ItemTooLarge {
                id,
                size: body.len(),
                limit: MAX_ITEM_BYTES,
            });
        }
        let partition_header = serde_json::to_string(&[partition_key.as_str()])
            .map_err(|source| SubmissionError::Serialization {
                id: id.clone(),
                source,
            })?;

        let inner = Arc::clone(&self.inner);
        let body = Bytes::from(body);

        Ok(Box::pin(async move {
            let _permit = match &inner.in_flight {
                Some(semaphore) => Some(Arc::clone(semaphore).acquire_owned().await.map_err(|_| {
                    StoreError::Transport("bulk pipeline closed".to_string())
                        .context(format!("create item {}", id))
                })?),
                None => None,
            };

            // Signed only once a slot is free; the date must be fresh when sent
            let date = rfc1123_now();
            let authorization =
                inner
                    .key
                    .authorization("post", "docs", &inner.collection_link, &date);

            let response = inner
                .http
                .post(inner.docs_url.clone())
                .header("authorization", authorization)
                .header(HEADER_DATE, date)
                .header(HEADER_VERSION, API_VERSION)
                .header(HEADER_PARTITION_KEY, partition_header)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| {
                    StoreError::Transport(error_chain(&e)).context(format!("create item {}", id))
                })?;

            settle_write(response)
                .await
                .map_err(|e| e.context(format!("create item {}", id)))
        }))
    }

    fn name(&self) -> &'static str {
        "cosmos"
    }
}

async fn settle_write(response: Response) -> Result<WriteReceipt, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(WriteReceipt {
            status: status.as_u16(),
            request_charge: header_value(response.headers(), HEADER_REQUEST_CHARGE),
        });
    }

    let sub_status = header_value(response.headers(), HEADER_SUB_STATUS);
    let message = read_error_message(response).await?;

    Err(StoreError::Rejected {
        status: status.as_u16(),
        sub_status,
        message,
    })
}

/// `message` from the JSON error body, or the raw body when it is not JSON
async fn read_error_message(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| StoreError::Transport(format!("failed to read error body: {}", error_chain(&e))))?;

    let message = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(ErrorBody {
            message: Some(message),
        }) => message,
        _ if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string(),
        _ => String::from_utf8_lossy(&body).into_owned(),
    };

    Ok(message)
}

fn invalid_endpoint(endpoint: &Url, reason: impl std::fmt::Display) -> ConnectionError {
    ConnectionError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Display of an error followed by its sources, joined with ": "
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
