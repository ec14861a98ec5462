//! Concurrent bulk-write pipeline
//!
//! [`Dispatcher`] submits every record of a [`Batch`](crate::record::Batch)
//! without waiting on earlier ones, and [`classify`] / [`report`] turn each
//! settled write into an [`Outcome`] and a diagnostic line.

pub mod dispatcher;
pub mod outcome;
pub mod report;

pub use dispatcher::{Dispatcher, dispatch};
pub use outcome::{OperationContext, Outcome, classify, report};
pub use report::DispatchReport;
