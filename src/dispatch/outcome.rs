use std::fmt;

use tracing::{debug, warn};

use crate::record::PartitionKey;
use crate::store::{StoreError, WriteReceipt};

/// Final classification of one settled write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The store understood the request and refused it
    StoreRejected { code: u16, message: String },
    /// No store-level decision was reached
    TransportFailure { detail: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("Success"),
            Outcome::StoreRejected { code, message } => write!(f, "Received {} ({}).", code, message),
            Outcome::TransportFailure { detail } => write!(f, "Exception {}.", detail),
        }
    }
}

/// Identifies the record behind a pending operation in diagnostics
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Position in the submitted batch
    pub index: usize,
    pub id: String,
    pub partition_key: PartitionKey,
}

/// Map a settled write to its [`Outcome`]
///
/// Wrappers are peeled off first: the first rejection anywhere in the cause
/// chain wins, otherwise the first remaining cause becomes the transport
/// detail.
pub fn classify(result: &Result<WriteReceipt, StoreError>) -> Outcome {
    let error = match result {
        Ok(_) => return Outcome::Success,
        Err(error) => error,
    };

    let causes = error.causes();

    let rejection = causes.iter().find_map(|cause| match cause {
        StoreError::Rejected {
            status, message, ..
        } => Some(Outcome::StoreRejected {
            code: *status,
            message: message.clone(),
        }),
        _ => None,
    });

    rejection.unwrap_or_else(|| Outcome::TransportFailure {
        detail: causes
            .first()
            .map(|cause| cause.to_string())
            .unwrap_or_else(|| error.to_string()),
    })
}

/// One human-readable line per failed operation; successes only at debug
pub fn report(context: &OperationContext, outcome: &Outcome) {
    match outcome {
        Outcome::Success => debug!(
            index = context.index,
            id = %context.id,
            partition_key = %context.partition_key,
            "Item created"
        ),
        Outcome::StoreRejected { code, .. } => warn!(
            index = context.index,
            id = %context.id,
            partition_key = %context.partition_key,
            status = code,
            "{}",
            outcome
        ),
        Outcome::TransportFailure { .. } => warn!(
            index = context.index,
            id = %context.id,
            partition_key = %context.partition_key,
            "{}",
            outcome
        ),
    }
}
