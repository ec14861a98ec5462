use thiserror::Error;

/// Fatal: the run cannot start without a client
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Missing credential for {0}")]
    MissingCredential(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Store at {endpoint} is unreachable: {detail}")]
    Unreachable { endpoint: String, detail: String },

    #[error("Store refused the connection with status {status}: {message}")]
    Refused { status: u16, message: String },
}

/// A record could not be handed to the store at all
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to serialize record {id}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {id} is {size} bytes, limit is {limit}")]
    ItemTooLarge { id: String, size: usize, limit: usize },

    #[error("record {id} carries partition key '{record_key}' but was routed to '{routed_key}'")]
    PartitionKeyMismatch {
        id: String,
        record_key: String,
        routed_key: String,
    },

    #[error("store client is closed")]
    Closed,
}

/// Failure of an accepted write, possibly wrapped in context layers
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store understood the request and refused it
    #[error("Received {status} ({message})")]
    Rejected {
        status: u16,
        sub_status: Option<u32>,
        message: String,
    },

    /// The request never reached a store-level decision
    #[error("{0}")]
    Transport(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("{} errors occurred", .0.len())]
    Aggregate(Vec<StoreError>),
}

impl StoreError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        StoreError::Rejected {
            status,
            sub_status: None,
            message: message.into(),
        }
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        StoreError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost causes in depth-first order, with every wrapper removed
    pub fn causes(&self) -> Vec<&StoreError> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];

        while let Some(error) = stack.pop() {
            match error {
                StoreError::Context { source, .. } => stack.push(source),
                StoreError::Aggregate(inner) => stack.extend(inner.iter().rev()),
                leaf => leaves.push(leaf),
            }
        }

        leaves
    }
}
