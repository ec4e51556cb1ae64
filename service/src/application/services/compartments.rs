//! Compartment enumeration for one tenancy.

use ociaction_common::Compartment;

use crate::application::ports::TenancyApi;
use crate::domain::{CompartmentTree, RetryPolicy, ScanError};

use super::paging::PageCursor;
use super::retry::with_retry;

/// Enumerate every active compartment below the tenancy, following the
/// next-page cursor until the provider stops returning one.
///
/// # Errors
///
/// Returns an error if a page cannot be listed within the retry policy.
pub async fn list_compartments(
    api: &dyn TenancyApi,
    policy: &RetryPolicy,
) -> Result<CompartmentTree, ScanError> {
    let tenancy_id = api.tenancy_id().to_string();
    let operation = format!("list compartments of {tenancy_id}");
    let mut compartments: Vec<Compartment> = Vec::new();
    let mut cursor = PageCursor::default();

    loop {
        let page = with_retry(policy, &operation, || {
            api.list_compartments(cursor.token())
        })
        .await?;
        for compartment in &page.items {
            tracing::debug!(
                id = %compartment.id,
                name = %compartment.name,
                parent = %compartment.parent_id,
                "compartment found",
            );
        }
        compartments.extend(page.items);
        if !cursor.advance(&operation, page.next_page)? {
            break;
        }
    }

    tracing::info!(tenancy = %tenancy_id, count = compartments.len(), "compartments enumerated");
    Ok(CompartmentTree::new(tenancy_id, compartments))
}
