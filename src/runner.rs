use std::io::{self, Write};
use std::sync::Arc;

use calllog::config::{Config, GeneratorConfig};
use calllog::observability::DispatchMetrics;
use calllog::pipeline;
use calllog::record::CallGenerator;
use chrono::Local;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{GenerateArgs, InsertArgs, RecordArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[error("{failed} of {attempted} records were not written")]
pub struct IncompleteRun {
    pub failed: usize,
    pub attempted: usize,
}

pub async fn insert(args: InsertArgs) -> Result<(), AnyError> {
    let mut config = Config::read(args.config)?;
    apply_overrides(&mut config.generator, &args.records);
    config.validate()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let metrics = Arc::new(DispatchMetrics::new());
    let summary = pipeline::run(&config, metrics.clone(), cancel).await?;
    let report = &summary.report;

    info!(
        generated = summary.generated,
        attempted = report.attempted,
        metrics = ?metrics.snapshot(),
        "Finished inserting calls"
    );

    if args.strict && report.failed() > 0 {
        return Err(IncompleteRun {
            failed: report.failed(),
            attempted: report.attempted,
        }
        .into());
    }

    Ok(())
}

pub fn generate(args: GenerateArgs) -> Result<(), AnyError> {
    let mut generator_config = Config::read(args.config)?.generator;
    apply_overrides(&mut generator_config, &args.records);
    generator_config.validate()?;

    let options = generator_config.options();
    let mut generator = match args.seed {
        Some(seed) => CallGenerator::with_seed(seed, options, Local::now().date_naive()),
        None => CallGenerator::new(options),
    };
    let batch = generator.generate(generator_config.count)?;

    let mut out = io::stdout().lock();
    for record in &batch {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(())
}

fn apply_overrides(generator: &mut GeneratorConfig, args: &RecordArgs) {
    if let Some(count) = args.count {
        generator.count = count;
    }
    if let Some(offset) = args.offset {
        generator.offset_days = offset;
    }
    if let Some(caller) = &args.caller {
        generator.subscriber = Some(caller.clone());
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Shutdown signal received, cancelling in-flight writes");
}
