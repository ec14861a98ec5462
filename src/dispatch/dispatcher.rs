use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::outcome::{Outcome, OperationContext, classify, report};
use super::report::DispatchReport;
use crate::observability::DispatchMetrics;
use crate::record::Batch;
use crate::store::{StoreClient, StoreError};

/// Fans a batch out to the store and waits for every write to settle
///
/// Flow per batch:
/// 1. Submit each record in batch order; a synchronous refusal skips only
///    that record
/// 2. Spawn one task per accepted write that awaits the round-trip, then
///    classifies and reports the outcome
/// 3. Join every task once; nothing is cancelled or retried on failure
///
/// The client is shared by reference only. The pending list lives inside
/// [`Dispatcher::dispatch`] and is appended to before the join starts.
pub struct Dispatcher {
    client: Arc<dyn StoreClient>,
    metrics: Arc<DispatchMetrics>,
    cancel: CancellationToken,
}

/// One in-flight write and the task observing it
struct PendingOperation {
    context: OperationContext,
    handle: JoinHandle<Outcome>,
}

impl PendingOperation {
    /// A panicking completion task is reported like any other transport failure
    async fn settle(self, metrics: &DispatchMetrics) -> Outcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let outcome = Outcome::TransportFailure {
                    detail: format!("completion handler failed: {}", join_error),
                };
                metrics.transport_failed();
                report(&self.context, &outcome);
                outcome
            }
        }
    }
}

impl Dispatcher {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            metrics: Arc::new(DispatchMetrics::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Share counters with the caller (e.g. across several batches)
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Settle every pending write as a transport failure once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub async fn dispatch(&self, batch: &Batch) -> DispatchReport {
        let started = Instant::now();
        let mut summary = DispatchReport {
            attempted: batch.len(),
            ..Default::default()
        };

        if batch.is_empty() {
            return summary;
        }

        debug!(records = batch.len(), store = self.client.name(), "Dispatching batch");

        let mut pending = Vec::with_capacity(batch.len());

        for (index, record) in batch.iter().enumerate() {
            let context = OperationContext {
                index,
                id: record.id().to_string(),
                partition_key: record.partition_key().clone(),
            };

            let write = match self.client.submit(record, record.partition_key()) {
                Ok(write) => write,
                Err(e) => {
                    warn!(index, id = %context.id, error = %e, "Submission failed, record skipped");
                    self.metrics.skipped();
                    summary.skipped += 1;
                    continue;
                }
            };

            self.metrics.submitted();
            summary.submitted += 1;

            let metrics = Arc::clone(&self.metrics);
            let cancel = self.cancel.clone();
            let task_context = context.clone();

            let handle = tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(StoreError::Cancelled),
                    result = write => result,
                };

                if let Ok(receipt) = &result {
                    debug!(
                        id = %task_context.id,
                        status = receipt.status,
                        request_charge = receipt.request_charge,
                        "Write settled"
                    );
                }

                let outcome = classify(&result);
                match &outcome {
                    Outcome::Success => metrics.succeeded(),
                    Outcome::StoreRejected { .. } => metrics.rejected(),
                    Outcome::TransportFailure { .. } => metrics.transport_failed(),
                }
                report(&task_context, &outcome);
                outcome
            });

            pending.push(PendingOperation { context, handle });
        }

        let metrics = &self.metrics;
        let outcomes =
            futures::future::join_all(pending.into_iter().map(|op| op.settle(metrics))).await;

        for outcome in &outcomes {
            summary.record(outcome);
        }
        summary.elapsed = started.elapsed();

        debug!(%summary, "Batch settled");
        summary
    }
}

/// Dispatch `batch` with a fresh [`Dispatcher`]
pub async fn dispatch(batch: &Batch, client: Arc<dyn StoreClient>) -> DispatchReport {
    Dispatcher::new(client).dispatch(batch).await
}
