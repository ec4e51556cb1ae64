//! Serve command: HTTP action API, optionally with the scan worker.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::commands::shutdown_signal;
use crate::http;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides OCIACTION_LISTEN_ADDR)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Also run the periodic scan worker in this process
    #[arg(long)]
    pub with_worker: bool,
}

/// Run the serve command.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run(app: &AppContext, args: &ServeArgs) -> Result<()> {
    let addr = args.listen.unwrap_or(app.config.listen_addr);

    let worker = args.with_worker.then(|| {
        let worker = app.worker();
        tokio::spawn(async move { worker.run(shutdown_signal()).await })
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, with_worker = args.with_worker, "action API ready");

    axum::serve(listener, http::router(Arc::new(app.dispatcher())))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(handle) = worker {
        tracing::info!("waiting for the scan worker to finish its cycle");
        handle.await.context("scan worker panicked")?;
    }
    tracing::info!("ociaction shut down");
    Ok(())
}
