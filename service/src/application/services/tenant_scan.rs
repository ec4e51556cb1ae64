//! Full-tenancy scans across every profile and subscribed region, and the
//! flush-then-repopulate cache rebuild fed by them.

use std::collections::{BTreeMap, HashMap};

use ociaction_common::{Resource, normalize_name};

use crate::application::ports::{CacheBackend, CloudConnector, TenancyApi};
use crate::domain::{RetryPolicy, ScanError};

use super::cache::ResourceCache;
use super::compartments::list_compartments;
use super::region_scan::{RegionScan, scan_region};
use super::paging::PageCursor;
use super::retry::with_retry;

/// Inventory discovered under one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub profile: String,
    pub tenancy_id: String,
    pub regions: Vec<String>,
    pub compartments: usize,
    /// One record per display name, ordered by normalized name.
    pub resources: Vec<Resource>,
}

/// Counters from one cache rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub flushed: usize,
    pub written: usize,
    pub collisions: usize,
}

/// Subscribed regions of the tenancy, following the next-page cursor.
///
/// # Errors
///
/// Returns an error if a page cannot be listed within the retry policy.
pub async fn list_regions(
    api: &dyn TenancyApi,
    policy: &RetryPolicy,
) -> Result<Vec<String>, ScanError> {
    let operation = format!("list region subscriptions of {}", api.tenancy_id());
    let mut regions = Vec::new();
    let mut cursor = PageCursor::default();
    loop {
        let page = with_retry(policy, &operation, || {
            api.list_region_subscriptions(cursor.token())
        })
        .await?;
        for region in page.items {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        if !cursor.advance(&operation, page.next_page)? {
            break;
        }
    }
    Ok(regions)
}

/// Scan one profile: compartments, subscribed regions, then every
/// compartment of every region.
///
/// Within the profile a later discovery of the same display name replaces
/// the earlier one.
///
/// # Errors
///
/// Any listing failure past the retry policy aborts the profile.
pub async fn scan_profile(
    cloud: &dyn CloudConnector,
    profile: &str,
    policy: &RetryPolicy,
) -> Result<Inventory, ScanError> {
    tracing::info!(profile, "scanning tenancy");
    let tenancy = cloud.tenancy(profile)?;
    let tree = list_compartments(tenancy.as_ref(), policy).await?;
    let regions = list_regions(tenancy.as_ref(), policy).await?;
    tracing::info!(profile, regions = ?regions, "subscribed regions");

    let mut by_name: BTreeMap<String, Resource> = BTreeMap::new();
    for region in &regions {
        let compute = cloud.compute(profile, region)?;
        let scan = RegionScan {
            profile,
            region,
            tree: &tree,
            policy,
        };
        for resource in scan_region(compute.as_ref(), scan).await? {
            let key = normalize_name(&resource.display_name);
            if let Some(previous) = by_name.insert(key, resource) {
                tracing::debug!(
                    name = %previous.display_name,
                    region = %previous.region,
                    "display name seen twice in one profile, keeping the later record",
                );
            }
        }
    }

    let resources: Vec<Resource> = by_name.into_values().collect();
    tracing::info!(profile, count = resources.len(), "virtual machines found");
    Ok(Inventory {
        profile: profile.to_string(),
        tenancy_id: tree.tenancy_id().to_string(),
        regions,
        compartments: tree.len(),
        resources,
    })
}

/// Scan every profile of the configuration source, in order.
///
/// # Errors
///
/// The first failing profile aborts the whole run so a partial inventory
/// is never produced.
pub async fn scan_all(
    cloud: &dyn CloudConnector,
    policy: &RetryPolicy,
) -> Result<Vec<Inventory>, ScanError> {
    let profiles = cloud.profiles();
    tracing::info!(profiles = ?profiles, "profiles found in config");
    let mut inventories = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        inventories.push(scan_profile(cloud, profile, policy).await?);
    }
    Ok(inventories)
}

/// Profile → resources view of a scan run.
#[must_use]
pub fn by_profile(inventories: &[Inventory]) -> BTreeMap<String, Vec<Resource>> {
    inventories
        .iter()
        .map(|inv| (inv.profile.clone(), inv.resources.clone()))
        .collect()
}

/// Replace the cache contents with a finished scan run.
///
/// The namespace is flushed first and repopulated profile by profile, so
/// resources removed outside this service disappear from the cache.
///
/// # Errors
///
/// A failed flush or a failed write aborts the rebuild.
pub async fn rebuild_cache(
    backend: &dyn CacheBackend,
    inventories: &[Inventory],
) -> Result<RebuildSummary, ScanError> {
    let collisions = report_collisions(inventories);
    let mut cache = ResourceCache::connect(backend).await?;
    tracing::info!("flushing resource cache");
    let flushed = cache.flush_all().await?;

    let mut written = 0;
    for inventory in inventories {
        cache.set(&inventory.resources).await?;
        written += inventory.resources.len();
    }
    tracing::info!(flushed, written, collisions, "resource cache rebuilt");
    Ok(RebuildSummary {
        flushed,
        written,
        collisions,
    })
}

/// Cache keys ignore the profile; warn about every name a later profile
/// will overwrite.
fn report_collisions(inventories: &[Inventory]) -> usize {
    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut collisions = 0;
    for inventory in inventories {
        for resource in &inventory.resources {
            let key = normalize_name(&resource.display_name);
            if let Some(owner) = owners.insert(key, &inventory.profile)
                && owner != inventory.profile
            {
                collisions += 1;
                tracing::warn!(
                    name = %resource.display_name,
                    overwritten = owner,
                    kept = %inventory.profile,
                    "display name exists in several profiles, last profile wins",
                );
            }
        }
    }
    collisions
}
