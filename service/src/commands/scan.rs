//! Scan command: one inventory pass printed as JSON.

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::tenant_scan::{by_profile, scan_all, scan_profile};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Scan only this profile
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,
}

/// Run the scan command. The cache is not touched.
///
/// # Errors
///
/// Returns an error if any listing fails past the retry policy.
pub async fn run(app: &AppContext, args: &ScanArgs) -> Result<()> {
    let inventories = match &args.profile {
        Some(profile) => vec![
            scan_profile(app.cloud.as_ref(), profile, &app.policy)
                .await
                .with_context(|| format!("scan of profile {profile} failed"))?,
        ],
        None => scan_all(app.cloud.as_ref(), &app.policy)
            .await
            .context("scan failed")?,
    };
    let json = serde_json::to_string_pretty(&by_profile(&inventories))
        .context("failed to serialize inventory")?;
    println!("{json}");
    Ok(())
}
