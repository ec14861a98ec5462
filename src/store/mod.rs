//! Partitioned document store abstraction
//!
//! The pipeline only needs one capability from a store: accept a record under
//! a partition key and eventually report success or a failure. Submission is
//! split in two so a bad record can be turned away before anything goes on the
//! wire:
//!
//! - [`StoreClient::submit`] runs synchronously (serialize, sign, validate) and
//!   either refuses the record with a [`SubmissionError`] or hands back a
//!   [`PendingWrite`].
//! - The [`PendingWrite`] is a `'static` future that performs the round-trip
//!   and settles into a [`WriteReceipt`] or a [`StoreError`].
//!
//! Back-ends:
//! - [`CosmosClient`]: Cosmos DB SQL API over REST
//! - [`MemoryStore`]: in-process store for development and tests

pub mod auth;
pub mod cosmos;
pub mod error;
pub mod factory;
pub mod memory;

pub use cosmos::{CosmosClient, CosmosOptions, MAX_ITEM_BYTES};
pub use error::{ConnectionError, StoreError, SubmissionError};
pub use factory::connect;
pub use memory::MemoryStore;

use futures::future::BoxFuture;

use crate::record::{CallRecord, PartitionKey};

/// In-flight write returned by [`StoreClient::submit`]
pub type PendingWrite = BoxFuture<'static, Result<WriteReceipt, StoreError>>;

/// Acknowledgement for an accepted write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    pub status: u16,
    /// Request units charged by the store, when reported
    pub request_charge: Option<f64>,
}

pub trait StoreClient: Send + Sync {
    /// Register a "create item" request for `record` routed by `partition_key`
    fn submit(
        &self,
        record: &CallRecord,
        partition_key: &PartitionKey,
    ) -> Result<PendingWrite, SubmissionError>;

    /// Short back-end name for logs
    fn name(&self) -> &'static str;
}

/// The routing key must be the record's own partition key
pub(crate) fn check_routing(
    record: &CallRecord,
    partition_key: &PartitionKey,
) -> Result<(), SubmissionError> {
    if record.partition_key() != partition_key {
        return Err(SubmissionError::PartitionKeyMismatch {
            id: record.id().to_string(),
            record_key: record.partition_key().to_string(),
            routed_key: partition_key.to_string(),
        });
    }
    Ok(())
}
