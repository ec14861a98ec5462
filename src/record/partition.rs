use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest partition key value the store accepts
pub const MAX_PARTITION_KEY_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionKeyError {
    #[error("partition key must not be empty")]
    Empty,

    #[error("partition key is {len} bytes, limit is {limit}")]
    TooLong { len: usize, limit: usize },
}

/// Routing key for a record, guaranteed non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(value: impl Into<String>) -> Result<Self, PartitionKeyError> {
        let value = value.into();
        if value.is_empty() {
            return Err(PartitionKeyError::Empty);
        }
        if value.len() > MAX_PARTITION_KEY_BYTES {
            return Err(PartitionKeyError::TooLong {
                len: value.len(),
                limit: MAX_PARTITION_KEY_BYTES,
            });
        }
        Ok(Self(value))
    }

    /// `{subscriber}.{bill cycle}`, e.g. `091-123-456-7890.JUL2023`
    pub fn derive(subscriber_id: &str, start: NaiveDateTime) -> Result<Self, PartitionKeyError> {
        Self::new(format!("{}.{}", subscriber_id, bill_cycle_label(start)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PartitionKey {
    type Error = PartitionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionKey> for String {
    fn from(value: PartitionKey) -> Self {
        value.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-letter uppercase month followed by the four-digit year (`JUL2023`)
pub fn bill_cycle_label(start: NaiveDateTime) -> String {
    format!(
        "{}{:04}",
        start.format("%b").to_string().to_uppercase(),
        start.year()
    )
}
