use std::fmt;
use std::time::Duration;

use super::outcome::Outcome;

/// Counters for one dispatched batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records in the batch
    pub attempted: usize,
    /// Records handed to the store
    pub submitted: usize,
    /// Records refused before submission
    pub skipped: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub transport_failed: usize,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub(crate) fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::StoreRejected { .. } => self.rejected += 1,
            Outcome::TransportFailure { .. } => self.transport_failed += 1,
        }
    }

    pub fn settled(&self) -> usize {
        self.succeeded + self.rejected + self.transport_failed
    }

    /// Every record that did not end up in the store
    pub fn failed(&self) -> usize {
        self.skipped + self.rejected + self.transport_failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} rejected, {} transport failures, {} skipped in {:.2?}",
            self.attempted,
            self.succeeded,
            self.rejected,
            self.transport_failed,
            self.skipped,
            self.elapsed
        )
    }
}
