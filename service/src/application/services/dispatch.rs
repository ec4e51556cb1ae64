//! Verify-reconcile-dispatch for one action request.
//!
//! ```text
//! Requested -> Verifying -> Reconciled -> Dispatched
//!                        \-> Evicted   -> Rejected
//! ```
//!
//! Every request holds the dispatcher lock from the cache read until the
//! provider call returns, so two requests never interleave on one entry.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use ociaction_common::{
    ActionKind, ActionRequest, Instance, InstanceAction, Resource, UnknownAction, normalize_name,
    validate_resource_name,
};

use crate::application::ports::{CacheBackend, CloudConnector, ComputeApi};
use crate::domain::{ActionError, ProviderError, RetryPolicy, ScanError};

use super::cache::ResourceCache;
use super::compartments::list_compartments;

/// Progress of one request through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Requested,
    Verifying,
    Reconciled,
    Evicted,
    Dispatched,
    Rejected,
}

impl DispatchState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Verifying => "verifying",
            Self::Reconciled => "reconciled",
            Self::Evicted => "evicted",
            Self::Dispatched => "dispatched",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle transition accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// The record as reconciled right before the call.
    pub resource: Resource,
    pub action: InstanceAction,
}

/// A cache record confirmed against the provider, with the compute
/// capability of the record's own region.
struct Verified {
    resource: Resource,
    compute: Box<dyn ComputeApi>,
}

pub struct ActionDispatcher {
    cloud: Arc<dyn CloudConnector>,
    cache: Arc<dyn CacheBackend>,
    /// Applies to the compartment re-listing after a move.
    policy: RetryPolicy,
    lock: Mutex<()>,
}

impl ActionDispatcher {
    pub fn new(cloud: Arc<dyn CloudConnector>, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            cloud,
            cache,
            policy: RetryPolicy::once(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one action request to completion.
    ///
    /// Reconciliation and eviction done while verifying are kept even if
    /// the final provider call fails.
    ///
    /// # Errors
    ///
    /// Validation failures are returned before any provider or cache call.
    /// An absent, vanished or filtered-out record is [`ActionError::NotFound`].
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<Dispatched, ActionError> {
        let name = request.name.as_str();
        transition(name, DispatchState::Requested);
        self.dispatch_inner(request)
            .await
            .inspect_err(|err| rejected(name, err))
    }

    /// Return the reconciled record for a name, evicting it if the
    /// provider no longer knows it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dispatch`], minus the action-related ones.
    pub async fn lookup(&self, name: &str) -> Result<Resource, ActionError> {
        transition(name, DispatchState::Requested);
        self.lookup_inner(name)
            .await
            .inspect_err(|err| rejected(name, err))
    }

    async fn lookup_inner(&self, name: &str) -> Result<Resource, ActionError> {
        validate(name)?;
        let _guard = self.lock.lock().await;
        let mut cache = ResourceCache::connect(self.cache.as_ref()).await?;
        Ok(self.verify(&mut cache, name).await?.resource)
    }

    async fn dispatch_inner(&self, request: &ActionRequest) -> Result<Dispatched, ActionError> {
        let kind: ActionKind = request
            .action
            .parse()
            .map_err(|UnknownAction(action)| ActionError::UnrecognizedAction(action))?;
        validate(&request.name)?;

        let _guard = self.lock.lock().await;
        let verified = {
            let mut cache = ResourceCache::connect(self.cache.as_ref()).await?;
            self.verify(&mut cache, &request.name).await?
        };

        if let Some(filter) = request.compartment.as_deref().map(str::trim)
            && !filter.is_empty()
            && !in_compartment(&verified.resource, filter)
        {
            tracing::debug!(
                name = %request.name,
                compartment = filter,
                actual = %verified.resource.compartment_path,
                "record is outside the requested compartment",
            );
            return Err(ActionError::NotFound(request.name.clone()));
        }

        let action = kind.instance_action();
        verified
            .compute
            .instance_action(&verified.resource.id, action)
            .await
            .map_err(ActionError::Dispatch)?;
        tracing::info!(
            name = %verified.resource.display_name,
            region = %verified.resource.region,
            action = action.as_str(),
            state = %DispatchState::Dispatched,
            "action dispatched",
        );
        Ok(Dispatched {
            resource: verified.resource,
            action,
        })
    }

    async fn verify(&self, cache: &mut ResourceCache, name: &str) -> Result<Verified, ActionError> {
        transition(name, DispatchState::Verifying);
        let Some(cached) = cache.get(name).await? else {
            return Err(ActionError::NotFound(name.to_string()));
        };

        let compute = self
            .cloud
            .compute(&cached.profile, &cached.region)
            .map_err(ActionError::Verify)?;
        match compute.get_instance(&cached.id).await {
            Ok(Some(live)) if !live.lifecycle_state.is_gone() => {
                let resource = self.reconcile(cache, cached, live).await?;
                Ok(Verified { resource, compute })
            }
            Ok(_) | Err(ProviderError::NotFound(_)) => {
                cache.delete(&cached.display_name).await?;
                tracing::warn!(
                    name,
                    id = %cached.id,
                    region = %cached.region,
                    state = %DispatchState::Evicted,
                    "resource no longer exists, cache entry evicted",
                );
                Err(ActionError::NotFound(name.to_string()))
            }
            Err(err) => Err(ActionError::Verify(err)),
        }
    }

    /// Refresh the cached record with the provider's view of it.
    async fn reconcile(
        &self,
        cache: &mut ResourceCache,
        cached: Resource,
        live: Instance,
    ) -> Result<Resource, ActionError> {
        let mut fresh = cached.clone();
        fresh.lifecycle_state = live.lifecycle_state;

        if live.compartment_id != cached.compartment_id {
            let tenancy = self
                .cloud
                .tenancy(&cached.profile)
                .map_err(ActionError::Verify)?;
            let tree = list_compartments(tenancy.as_ref(), &self.policy)
                .await
                .map_err(from_scan)?;
            fresh.compartment_name = tree.name(&live.compartment_id)?.to_string();
            fresh.compartment_path = tree.resolve_path(&live.compartment_id)?;
            tracing::info!(
                name = %cached.display_name,
                from = %cached.compartment_path,
                to = %fresh.compartment_path,
                "resource moved compartments",
            );
            fresh.compartment_id = live.compartment_id;
        }

        let renamed = normalize_name(&live.display_name) != normalize_name(&cached.display_name);
        if renamed {
            cache.delete(&cached.display_name).await?;
            tracing::info!(
                from = %cached.display_name,
                to = %live.display_name,
                "resource renamed, stale key evicted",
            );
        }
        fresh.display_name = live.display_name;

        if renamed
            && let Some(holder) = cache.get(&fresh.display_name).await?
            && holder.id != fresh.id
        {
            tracing::warn!(
                name = %fresh.display_name,
                id = %fresh.id,
                holder = %holder.id,
                "renamed key belongs to another resource, record not written",
            );
            transition(&fresh.display_name, DispatchState::Reconciled);
            return Ok(fresh);
        }

        cache.update(&fresh).await?;
        transition(&fresh.display_name, DispatchState::Reconciled);
        Ok(fresh)
    }
}

fn validate(name: &str) -> Result<(), ActionError> {
    validate_resource_name(name).map_err(|reason| ActionError::InvalidName(reason.to_string()))
}

fn in_compartment(resource: &Resource, filter: &str) -> bool {
    resource.compartment_id == filter
        || resource.compartment_name.eq_ignore_ascii_case(filter)
        || resource.compartment_path.eq_ignore_ascii_case(filter)
}

fn from_scan(err: ScanError) -> ActionError {
    match err {
        ScanError::RetriesExhausted { source, .. } | ScanError::Provider(source) => {
            ActionError::Verify(source)
        }
        ScanError::Compartment(err) => ActionError::Compartment(err),
        ScanError::Cache(err) => ActionError::Cache(err),
    }
}

fn transition(name: &str, state: DispatchState) {
    tracing::info!(name, state = %state, "dispatch state");
}

fn rejected(name: &str, err: &ActionError) {
    tracing::warn!(
        name,
        state = %DispatchState::Rejected,
        status = err.status_code(),
        error = %err,
        "request rejected",
    );
}
