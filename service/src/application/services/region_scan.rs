//! Instance enumeration for one region.
//!
//! Each compartment is listed page by page under the retry policy.
//! TERMINATED and TERMINATING instances are dropped; every other instance
//! becomes a [`Resource`] carrying its compartment path and the profile it
//! was discovered under.

use futures::stream::{self, Stream, StreamExt, TryStreamExt};

use ociaction_common::{Instance, Resource};

use crate::application::ports::ComputeApi;
use crate::domain::{CompartmentTree, RetryPolicy, ScanError};

use super::paging::PageCursor;
use super::retry::with_retry;

/// Everything a region scan needs besides the compute capability.
#[derive(Debug, Clone, Copy)]
pub struct RegionScan<'a> {
    pub profile: &'a str,
    pub region: &'a str,
    pub tree: &'a CompartmentTree,
    pub policy: &'a RetryPolicy,
}


/// Lazily list the live instances of one compartment.
///
/// Pages are fetched only as the stream is polled. A page that still fails
/// after the policy's last attempt ends the stream with an error.
pub fn list_instances<'a>(
    compute: &'a dyn ComputeApi,
    scan: RegionScan<'a>,
    compartment_id: &'a str,
) -> impl Stream<Item = Result<Resource, ScanError>> + Send + 'a {
    stream::try_unfold(Some(PageCursor::default()), move |cursor| async move {
        let Some(mut cursor) = cursor else {
            return Ok::<_, ScanError>(None);
        };
        let operation = format!("list instances in {compartment_id} ({})", scan.region);
        let page = with_retry(scan.policy, &operation, || {
            compute.list_instances(compartment_id, cursor.token())
        })
        .await?;

        let next = cursor.advance(&operation, page.next_page)?.then_some(cursor);
        let resources = page
            .items
            .into_iter()
            .filter(|instance| !instance.lifecycle_state.is_gone())
            .map(|instance| to_resource(scan, instance))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some((resources, next)))
    })
    .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<Resource, ScanError>)))
    .try_flatten()
}

/// List every scan target of the tree in one region.
///
/// # Errors
///
/// The first listing or path-resolution failure aborts the region.
pub async fn scan_region(
    compute: &dyn ComputeApi,
    scan: RegionScan<'_>,
) -> Result<Vec<Resource>, ScanError> {
    let mut found = Vec::new();
    for compartment_id in scan.tree.scan_targets() {
        let mut instances = list_instances(compute, scan, compartment_id).boxed();
        while let Some(resource) = instances.try_next().await? {
            tracing::debug!(
                name = %resource.display_name,
                compartment = %resource.compartment_path,
                region = %resource.region,
                "machine added",
            );
            found.push(resource);
        }
    }
    tracing::info!(
        profile = scan.profile,
        region = scan.region,
        count = found.len(),
        "region scanned",
    );
    Ok(found)
}

fn to_resource(scan: RegionScan<'_>, instance: Instance) -> Result<Resource, ScanError> {
    let compartment_name = scan.tree.name(&instance.compartment_id)?.to_string();
    let compartment_path = scan.tree.resolve_path(&instance.compartment_id)?;
    Ok(Resource {
        display_name: instance.display_name,
        id: instance.id,
        compartment_id: instance.compartment_id,
        compartment_name,
        compartment_path,
        region: scan.region.to_string(),
        lifecycle_state: instance.lifecycle_state,
        profile: scan.profile.to_string(),
    })
}
