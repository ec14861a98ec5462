//! Call-detail records and their synthetic generator

pub mod call;
pub mod generator;
pub mod partition;

pub use call::{Batch, CallRecord, CallType, Device};
pub use generator::{CallGenerator, GenerateError, GeneratorOptions, MAX_OFFSET_DAYS};
pub use partition::{MAX_PARTITION_KEY_BYTES, PartitionKey, PartitionKeyError, bill_cycle_label};
