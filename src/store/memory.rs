use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use super::cosmos::MAX_ITEM_BYTES;
use super::error::{StoreError, SubmissionError};
use super::{PendingWrite, StoreClient, WriteReceipt, check_routing};
use crate::record::{CallRecord, PartitionKey};

type ItemKey = (PartitionKey, String);

/// In-process document store with Cosmos-like conflict and size semantics
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<HashMap<ItemKey, Value>>>,
    latency: Duration,
    closed: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write sleeps `latency` before settling
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn get(&self, partition_key: &PartitionKey, id: &str) -> Option<Value> {
        self.items
            .read()
            .await
            .get(&(partition_key.clone(), id.to_string()))
            .cloned()
    }

    /// Refuse further submissions
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl StoreClient for MemoryStore {
    fn submit(
        &self,
        record: &CallRecord,
        partition_key: &PartitionKey,
    ) -> Result<PendingWrite, SubmissionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SubmissionError::Closed);
        }
        check_routing(record, partition_key)?;

        let document = serde_json::to_value(record).map_err(|source| {
            SubmissionError::Serialization {
                id: record.id().to_string(),
                source,
            }
        })?;
        let size = document.to_string().len();

        let items = Arc::clone(&self.items);
        let latency = self.latency;
        let key = (partition_key.clone(), record.id().to_string());

        Ok(Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            if size > MAX_ITEM_BYTES {
                return Err(StoreError::rejected(
                    413,
                    "Request size is too large",
                ));
            }

            let mut items = items.write().await;
            if items.contains_key(&key) {
                return Err(StoreError::rejected(
                    409,
                    "Entity with the specified id already exists in the system.",
                ));
            }
            items.insert(key, document);

            Ok(WriteReceipt {
                status: 201,
                request_charge: None,
            })
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CallType, Device};

    fn record(id: &str) -> CallRecord {
        CallRecord::builder()
            .id(id)
            .subscriber_id("091-000-000-0001")
            .start(
                chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap(),
            )
            .duration_secs(60)
            .counterparty("091-000-000-0002")
            .call_type(CallType::Local)
            .call_location_id(5)
            .base_location_id(5)
            .device(Device::new("iOS 15", "iPhone 12"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        let record = record("a");

        let receipt = store
            .submit(&record, record.partition_key())
            .unwrap()
            .await
            .unwrap();
        assert_eq!(receipt.status, 201);

        let stored = store.get(record.partition_key(), "a").await.unwrap();
        assert_eq!(stored["pk"], "091-000-000-0001.MAR2024");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = MemoryStore::new();
        let record = record("dup");

        store.submit(&record, record.partition_key()).unwrap().await.unwrap();
        let err = store
            .submit(&record, record.partition_key())
            .unwrap()
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_misrouted_record_refused() {
        let store = MemoryStore::new();
        let record = record("stray");
        let other = PartitionKey::new("someone-else.MAR2024").unwrap();

        assert!(matches!(
            store.submit(&record, &other),
            Err(SubmissionError::PartitionKeyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_store_refuses_submission() {
        let store = MemoryStore::new();
        store.close();

        let record = record("late");
        assert!(matches!(
            store.submit(&record, record.partition_key()),
            Err(SubmissionError::Closed)
        ));
        assert!(store.is_empty().await);
    }
}
