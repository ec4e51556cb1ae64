//! ociaction - VM inventory cache and start/stop/restart API for OCI tenancies

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ociaction::cli::Cli;

#[tokio::main]
async fn main() {
    // Logs go to stderr; `scan` prints its inventory on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
