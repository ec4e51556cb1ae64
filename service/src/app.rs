//! Application context: the wiring shared by every command handler.
//!
//! Built once from [`ServiceConfig`]. The provider config file is loaded
//! and validated here, so a bad profile stops the process before any
//! command starts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use ociaction_common::ServiceConfig;

use crate::application::ports::{CacheBackend, CloudConnector};
use crate::application::services::dispatch::ActionDispatcher;
use crate::application::services::worker::ScanWorker;
use crate::domain::RetryPolicy;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::oci_cli::OciCliConnector;
use crate::infra::oci_config::OciConfigFile;
use crate::infra::valkey::{ValkeyBackend, ValkeyConfig};

pub struct AppContext {
    pub config: ServiceConfig,
    /// Listing policy for scan runs.
    pub policy: RetryPolicy,
    pub cloud: Arc<dyn CloudConnector>,
    pub cache: Arc<dyn CacheBackend>,
}

impl AppContext {
    /// # Errors
    ///
    /// Returns an error if the provider config is unreadable or invalid,
    /// or the cache settings do not form a valid URL.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let oci = OciConfigFile::load(&config.oci_config).with_context(|| {
            format!("invalid provider config {}", config.oci_config.display())
        })?;
        let runner = Arc::new(TokioCommandRunner::new(Duration::from_secs(
            config.oci_timeout_secs,
        )));
        let cloud: Arc<dyn CloudConnector> =
            Arc::new(OciCliConnector::new(runner, config.oci_cli.clone(), oci));

        let valkey = ValkeyConfig::from(&config);
        tracing::info!(
            host = %valkey.host,
            port = valkey.port,
            tls = valkey.tls,
            "cache backend configured",
        );
        let cache: Arc<dyn CacheBackend> =
            Arc::new(ValkeyBackend::new(&valkey).context("invalid cache backend settings")?);

        let policy = RetryPolicy::fixed(
            config.retry_attempts,
            Duration::from_secs(config.retry_delay_secs),
        );
        Ok(Self::from_parts(config, policy, cloud, cache))
    }

    /// Assemble a context from already-built capabilities.
    pub fn from_parts(
        config: ServiceConfig,
        policy: RetryPolicy,
        cloud: Arc<dyn CloudConnector>,
        cache: Arc<dyn CacheBackend>,
    ) -> Self {
        Self {
            config,
            policy,
            cloud,
            cache,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> ActionDispatcher {
        ActionDispatcher::new(Arc::clone(&self.cloud), Arc::clone(&self.cache))
    }

    #[must_use]
    pub fn worker(&self) -> ScanWorker {
        ScanWorker::new(
            Arc::clone(&self.cloud),
            Arc::clone(&self.cache),
            self.policy,
            Duration::from_secs(self.config.scan_interval_secs),
        )
    }
}
