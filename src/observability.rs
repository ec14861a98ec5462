//! Logging setup and dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber on stderr
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between `info` and
/// `debug` for this crate.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "calllog=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Counters for one or more dispatch runs
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    submitted: AtomicU64,
    skipped: AtomicU64,
    succeeded: AtomicU64,
    rejected: AtomicU64,
    transport_failed: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "submitted", "Metric incremented");
    }

    pub fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "skipped", "Metric incremented");
    }

    pub fn succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "succeeded", "Metric incremented");
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "rejected", "Metric incremented");
    }

    pub fn transport_failed(&self) {
        self.transport_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "transport_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            transport_failed: self.transport_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub skipped: u64,
    pub succeeded: u64,
    pub rejected: u64,
    pub transport_failed: u64,
}

impl MetricsSnapshot {
    pub fn settled(&self) -> u64 {
        self.succeeded + self.rejected + self.transport_failed
    }
}
