//! Region scans: pagination, retry bound, lifecycle filtering and
//! compartment paths.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use futures::TryStreamExt;
use ociaction::application::ports::CloudConnector;
use ociaction::application::services::region_scan::{RegionScan, list_instances, scan_region};
use ociaction::domain::{CompartmentError, CompartmentTree, ProviderError, ScanError};
use ociaction_common::LifecycleState;

use crate::helpers::{instant_policy, listing_policy};
use crate::mocks::{ASHBURN, Call, FakeCloud, TENANCY, instance, standard_compartments};

fn tree() -> CompartmentTree {
    CompartmentTree::new(TENANCY, standard_compartments())
}

fn abc_in_ops() -> FakeCloud {
    FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN], standard_compartments())
        .with_instance("DEFAULT", instance("i-a", "A", "c-ops", ASHBURN))
        .with_instance("DEFAULT", instance("i-b", "B", "c-ops", ASHBURN))
        .with_instance("DEFAULT", instance("i-c", "C", "c-ops", ASHBURN))
}

#[tokio::test]
async fn pages_are_concatenated_without_gaps_or_duplicates() {
    let cloud = abc_in_ops().with_page_size(2);
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let found: Vec<_> = list_instances(compute.as_ref(), scan, "c-ops")
        .try_collect()
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let listings = cloud.count(|c| {
        matches!(c, Call::ListInstances { compartment, .. } if compartment == "c-ops")
    });
    assert_eq!(listings, 2, "pages [A,B] then [C]");
}

#[tokio::test]
async fn repeated_page_token_ends_the_listing_with_an_error() {
    let cloud = abc_in_ops().with_page_size(2).with_stuck_paging();
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let err = list_instances(compute.as_ref(), scan, "c-ops")
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScanError::Provider(ProviderError::Decode(_))),
        "{err:?}"
    );
    assert_eq!(cloud.count(|c| matches!(c, Call::ListInstances { .. })), 2);
}

#[tokio::test]
async fn page_size_does_not_change_the_result() {
    for size in [1, 2, 3, 50] {
        let cloud = abc_in_ops().with_page_size(size);
        let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
        let tree = tree();
        let policy = instant_policy(1);
        let scan = RegionScan {
            profile: "DEFAULT",
            region: ASHBURN,
            tree: &tree,
            policy: &policy,
        };
        let found = scan_region(compute.as_ref(), scan).await.unwrap();
        let mut ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["i-a", "i-b", "i-c"], "page size {size}");
    }
}

#[tokio::test]
async fn records_carry_path_region_and_profile() {
    let cloud = abc_in_ops();
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };
    let found = scan_region(compute.as_ref(), scan).await.unwrap();
    let a = found.iter().find(|r| r.display_name == "A").unwrap();
    assert_eq!(a.compartment_id, "c-ops");
    assert_eq!(a.compartment_name, "ops");
    assert_eq!(a.compartment_path, "root/prod/ops");
    assert_eq!(a.region, ASHBURN);
    assert_eq!(a.profile, "DEFAULT");
}

#[tokio::test]
async fn every_compartment_and_the_root_are_listed() {
    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN], standard_compartments())
        .with_instance("DEFAULT", instance("i-root", "bastion", TENANCY, ASHBURN))
        .with_instance("DEFAULT", instance("i-dev", "dev-box", "c-dev", ASHBURN));
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let found = scan_region(compute.as_ref(), scan).await.unwrap();
    let bastion = found.iter().find(|r| r.display_name == "bastion").unwrap();
    assert_eq!(bastion.compartment_path, "root");
    assert_eq!(bastion.compartment_name, "root");
    assert!(found.iter().any(|r| r.compartment_path == "root/dev"));
    assert_eq!(
        cloud.count(|c| matches!(c, Call::ListInstances { .. })),
        4,
        "root plus three compartments"
    );
}

#[tokio::test]
async fn terminated_and_terminating_instances_are_dropped() {
    let mut gone = instance("i-x", "X", "c-ops", ASHBURN);
    gone.lifecycle_state = LifecycleState::Terminated;
    let mut going = instance("i-y", "Y", "c-ops", ASHBURN);
    going.lifecycle_state = LifecycleState::Terminating;
    let mut stopped = instance("i-z", "Z", "c-ops", ASHBURN);
    stopped.lifecycle_state = LifecycleState::Stopped;

    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN], standard_compartments())
        .with_instance("DEFAULT", gone)
        .with_instance("DEFAULT", going)
        .with_instance("DEFAULT", stopped);
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let found = scan_region(compute.as_ref(), scan).await.unwrap();
    let names: Vec<&str> = found.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["Z"]);
}

#[tokio::test(start_paused = true)]
async fn nine_failures_then_success_proceeds() {
    let cloud = abc_in_ops().failing_listings(9);
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = listing_policy();
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let started = tokio::time::Instant::now();
    let found = scan_region(compute.as_ref(), scan).await.unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(18), "nine 2 s pauses");
}

#[tokio::test(start_paused = true)]
async fn eleven_failures_abort_the_scan() {
    let cloud = abc_in_ops().failing_listings(11);
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    let tree = tree();
    let policy = listing_policy();
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &tree,
        policy: &policy,
    };

    let err = scan_region(compute.as_ref(), scan).await.unwrap_err();
    assert!(
        matches!(err, ScanError::RetriesExhausted { attempts: 10, .. }),
        "got {err:?}"
    );
    assert_eq!(cloud.count(|c| matches!(c, Call::ListInstances { .. })), 10);
}

#[tokio::test]
async fn unknown_compartment_is_a_consistency_error() {
    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN], standard_compartments())
        .with_instance("DEFAULT", instance("i-a", "A", "c-ops", ASHBURN));
    let compute = cloud.compute("DEFAULT", ASHBURN).unwrap();
    // Tree enumerated without `prod`, so `ops` cannot reach the root.
    let partial = CompartmentTree::new(
        TENANCY,
        standard_compartments()
            .into_iter()
            .filter(|c| c.id != "c-prod")
            .collect(),
    );
    let policy = instant_policy(1);
    let scan = RegionScan {
        profile: "DEFAULT",
        region: ASHBURN,
        tree: &partial,
        policy: &policy,
    };

    let err = scan_region(compute.as_ref(), scan).await.unwrap_err();
    assert!(matches!(
        err,
        ScanError::Compartment(CompartmentError::NotFound(ref id)) if id == "c-prod"
    ));
}
