//! Worker command: periodic full rescan and cache rebuild.

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::commands::shutdown_signal;

/// Arguments for the worker command.
#[derive(Args)]
pub struct WorkerArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Run the worker command.
///
/// # Errors
///
/// With `--once`, returns the cycle's failure. The looping worker only
/// logs failed cycles.
pub async fn run(app: &AppContext, args: &WorkerArgs) -> Result<()> {
    let worker = app.worker();
    if args.once {
        let summary = worker.run_once().await.context("scan cycle failed")?;
        tracing::info!(
            flushed = summary.flushed,
            written = summary.written,
            collisions = summary.collisions,
            "scan cycle finished",
        );
        return Ok(());
    }
    tracing::info!(
        interval_secs = app.config.scan_interval_secs,
        "scan worker started"
    );
    let failed = worker.run(shutdown_signal()).await;
    tracing::info!(failed, "scan worker exited");
    Ok(())
}
