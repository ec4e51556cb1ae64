//! Periodic full rescan.
//!
//! One serial loop: a cycle never starts while the previous one runs, and
//! a failed cycle is logged and retried at the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::application::ports::{CacheBackend, CloudConnector};
use crate::domain::{RetryPolicy, ScanError};

use super::tenant_scan::{RebuildSummary, rebuild_cache, scan_all};

/// Shortest accepted interval between cycles.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Scan every profile, then replace the cache contents.
///
/// The scan completes before the flush, so a failed scan leaves the
/// previous cache untouched.
///
/// # Errors
///
/// Returns the first scan or cache failure.
pub async fn run_cycle(
    cloud: &dyn CloudConnector,
    cache: &dyn CacheBackend,
    policy: &RetryPolicy,
) -> Result<RebuildSummary, ScanError> {
    let inventories = scan_all(cloud, policy).await?;
    rebuild_cache(cache, &inventories).await
}

pub struct ScanWorker {
    cloud: Arc<dyn CloudConnector>,
    cache: Arc<dyn CacheBackend>,
    policy: RetryPolicy,
    interval: Duration,
}

impl ScanWorker {
    pub fn new(
        cloud: Arc<dyn CloudConnector>,
        cache: Arc<dyn CacheBackend>,
        policy: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            cloud,
            cache,
            policy,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// # Errors
    ///
    /// See [`run_cycle`].
    pub async fn run_once(&self) -> Result<RebuildSummary, ScanError> {
        run_cycle(self.cloud.as_ref(), self.cache.as_ref(), &self.policy).await
    }

    /// Run a cycle immediately, then once per interval until `shutdown`
    /// resolves. A cycle in progress is finished before the loop exits.
    /// Returns the number of cycles that failed.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycle: u64 = 0;
        let mut failed: u64 = 0;
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(cycles = cycle, failed, "scan worker stopping");
                    return failed;
                }
                _ = ticker.tick() => {}
            }
            cycle += 1;
            tracing::info!(cycle, "scan cycle starting");
            match self.run_once().await {
                Ok(summary) => tracing::info!(
                    cycle,
                    flushed = summary.flushed,
                    written = summary.written,
                    collisions = summary.collisions,
                    "scan cycle finished",
                ),
                Err(err) => {
                    failed += 1;
                    tracing::error!(
                        cycle,
                        error = %err,
                        next_in_secs = self.interval.as_secs(),
                        "scan cycle failed, retrying at the next interval",
                    );
                }
            }
        }
    }
}
