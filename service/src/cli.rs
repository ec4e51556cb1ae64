//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ociaction_common::ServiceConfig;

use crate::app::AppContext;
use crate::commands;

/// VM inventory cache and start/stop/restart API for OCI tenancies
#[derive(Parser)]
#[command(
    name = "ociaction",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Provider config file (overrides OCIACTION_OCI_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub oci_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the action API
    Serve(commands::serve::ServeArgs),

    /// Rescan every profile and rebuild the cache on an interval
    Worker(commands::worker::WorkerArgs),

    /// Scan once and print the inventory as JSON, leaving the cache alone
    Scan(commands::scan::ScanArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            oci_config,
            command,
        } = self;
        let mut config = ServiceConfig::from_env()
            .context("failed to load config from OCIACTION_* env vars")?;
        if let Some(path) = oci_config {
            config.oci_config = path;
        }
        let app = AppContext::new(config)?;
        match command {
            Command::Serve(args) => commands::serve::run(&app, &args).await,
            Command::Worker(args) => commands::worker::run(&app, &args).await,
            Command::Scan(args) => commands::scan::run(&app, &args).await,
        }
    }
}
