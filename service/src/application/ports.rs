//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `ociaction_common`,
//! never from `crate::infra`, `crate::commands`, or `crate::http`.
//!
//! Ports are object-safe `async_trait`s so they can sit behind `Arc<dyn _>`
//! inside the HTTP state, whose handler futures must be `Send`.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ociaction_common::{Compartment, Instance, InstanceAction};

use crate::domain::{CacheError, ProviderError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page; `None` on the last page.
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

// ── Provider Ports ────────────────────────────────────────────────────────────

/// Tenancy-scoped identity calls for one profile.
#[async_trait]
pub trait TenancyApi: Send + Sync {
    /// Id of the tenancy this capability is bound to.
    fn tenancy_id(&self) -> &str;

    /// Regions the tenancy is subscribed to.
    async fn list_region_subscriptions(
        &self,
        page: Option<&str>,
    ) -> Result<Page<String>, ProviderError>;

    /// Active compartments anywhere below the tenancy root.
    async fn list_compartments(
        &self,
        page: Option<&str>,
    ) -> Result<Page<Compartment>, ProviderError>;
}

/// Region-scoped compute calls for one profile.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Region this capability is bound to.
    fn region(&self) -> &str;

    /// Instances directly inside one compartment.
    async fn list_instances(
        &self,
        compartment_id: &str,
        page: Option<&str>,
    ) -> Result<Page<Instance>, ProviderError>;

    /// Authoritative state of one instance; `None` when the provider no
    /// longer knows it.
    async fn get_instance(&self, instance_id: &str) -> Result<Option<Instance>, ProviderError>;

    /// Issue a lifecycle transition.
    async fn instance_action(
        &self,
        instance_id: &str,
        action: InstanceAction,
    ) -> Result<(), ProviderError>;
}

/// Credential context: turns a named profile into provider capabilities.
pub trait CloudConnector: Send + Sync {
    /// Profiles available in the configuration source, in file order.
    fn profiles(&self) -> Vec<String>;

    /// Tenancy-scoped capability in the profile's home region.
    fn tenancy(&self, profile: &str) -> Result<Box<dyn TenancyApi>, ProviderError>;

    /// Capability bound to `region`, independent of the profile's home region.
    fn compute(&self, profile: &str, region: &str) -> Result<Box<dyn ComputeApi>, ProviderError>;
}

// ── Cache Backend Ports ───────────────────────────────────────────────────────

/// Key-value backend that hands out scoped sessions.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Acquire a session. The underlying connection is released when the
    /// returned session is dropped.
    async fn connect(&self) -> Result<Box<dyn CacheSession>, CacheError>;
}

/// Raw string get/set/delete over one backend connection.
#[async_trait]
pub trait CacheSession: Send {
    async fn get(&mut self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Atomically overwrite `key` only if it already exists. Returns whether
    /// the value was written.
    async fn set_if_exists(&mut self, key: &str, value: &str) -> Result<bool, CacheError>;

    /// Returns whether a key was removed.
    async fn delete(&mut self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key matching a `prefix*` glob. Returns the count removed.
    async fn delete_matching(&mut self, pattern: &str) -> Result<usize, CacheError>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output, bounded by the runner's
    /// default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}
