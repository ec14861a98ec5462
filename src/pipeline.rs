//! Generate → connect → dispatch, as one run

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::observability::DispatchMetrics;
use crate::record::{CallGenerator, GenerateError};
use crate::store::{self, ConnectionError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Record generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("Could not connect to the store: {0}")]
    Connection(#[from] ConnectionError),
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub generated: usize,
    pub report: DispatchReport,
}

/// Generate `config.generator.count` calls and write them to the configured store
///
/// Only generation and connection errors fail the run; per-record write
/// failures are reported and counted in [`RunSummary::report`].
pub async fn run(
    config: &Config,
    metrics: Arc<DispatchMetrics>,
    cancel: CancellationToken,
) -> Result<RunSummary, PipelineError> {
    let generator_config = &config.generator;
    info!(
        "Generating {} calls with offset of {} days",
        generator_config.count, generator_config.offset_days
    );

    let mut generator = CallGenerator::new(generator_config.options());
    let batch = generator.generate(generator_config.count)?;

    let client = store::connect(&config.store).await?;

    info!(records = batch.len(), store = client.name(), "Insert started");

    let report = Dispatcher::new(client)
        .with_metrics(metrics)
        .with_cancellation(cancel)
        .dispatch(&batch)
        .await;

    info!(%report, "Insert complete");

    Ok(RunSummary {
        generated: batch.len(),
        report,
    })
}
