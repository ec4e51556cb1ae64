//! Command implementations

pub mod scan;
pub mod serve;
pub mod worker;

/// Resolve on SIGINT (Ctrl-C). If the handler cannot be installed the
/// future never resolves and the process runs until killed.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
