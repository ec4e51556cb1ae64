//! Tenancy-wide scans and the flush-then-repopulate cache rebuild.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ociaction::application::ports::CloudConnector;
use ociaction::application::services::tenant_scan::{
    by_profile, list_regions, rebuild_cache, scan_all, scan_profile,
};
use ociaction::application::services::worker::run_cycle;
use ociaction::domain::{ProviderError, ScanError};

use crate::helpers::instant_policy;
use crate::mocks::{
    ASHBURN, Call, FRANKFURT, FakeCloud, MemoryBackend, TENANCY, compartment, instance,
    resource, standard_compartments,
};

const EU_TENANCY: &str = "ocid1.tenancy.oc1..eu";

fn two_regions() -> FakeCloud {
    FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN, FRANKFURT], standard_compartments())
        .with_instance("DEFAULT", instance("i-web", "web-01", "c-ops", ASHBURN))
        .with_instance("DEFAULT", instance("i-db", "db-01", "c-dev", FRANKFURT))
}

#[tokio::test]
async fn profile_scan_covers_every_subscribed_region() {
    let cloud = two_regions();
    let inventory = scan_profile(&cloud, "DEFAULT", &instant_policy(1))
        .await
        .unwrap();

    assert_eq!(inventory.tenancy_id, TENANCY);
    assert_eq!(inventory.regions, vec![ASHBURN, FRANKFURT]);
    assert_eq!(inventory.compartments, 3);
    let db = inventory
        .resources
        .iter()
        .find(|r| r.display_name == "db-01")
        .unwrap();
    assert_eq!(db.region, FRANKFURT, "region of the scan that found it");
    assert_eq!(db.compartment_path, "root/dev");

    let listed_regions: Vec<String> = cloud
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::ListInstances { region, .. } => Some(region),
            _ => None,
        })
        .collect();
    assert_eq!(listed_regions.iter().filter(|r| *r == ASHBURN).count(), 4);
    assert_eq!(listed_regions.iter().filter(|r| *r == FRANKFURT).count(), 4);
}

#[tokio::test]
async fn same_name_within_a_profile_keeps_the_later_record() {
    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN, FRANKFURT], standard_compartments())
        .with_instance("DEFAULT", instance("i-old", "app", "c-ops", ASHBURN))
        .with_instance("DEFAULT", instance("i-new", "App", "c-ops", FRANKFURT));

    let inventory = scan_profile(&cloud, "DEFAULT", &instant_policy(1))
        .await
        .unwrap();
    assert_eq!(inventory.resources.len(), 1);
    assert_eq!(inventory.resources[0].id, "i-new");
}

#[tokio::test]
async fn scan_all_visits_profiles_in_config_order() {
    let cloud = two_regions()
        .with_profile(
            "EU",
            EU_TENANCY,
            &[FRANKFURT],
            vec![compartment("c-eu", "eu", EU_TENANCY)],
        )
        .with_instance("EU", instance("i-eu", "eu-app", "c-eu", FRANKFURT));

    let inventories = scan_all(&cloud, &instant_policy(1)).await.unwrap();
    let profiles: Vec<&str> = inventories.iter().map(|i| i.profile.as_str()).collect();
    assert_eq!(profiles, vec!["DEFAULT", "EU"]);

    let map = by_profile(&inventories);
    assert_eq!(map["EU"].len(), 1);
    assert_eq!(map["EU"][0].profile, "EU");
    assert_eq!(map["DEFAULT"].len(), 2);
}

#[tokio::test]
async fn unknown_profile_aborts_the_scan() {
    let cloud = two_regions();
    let err = scan_profile(&cloud, "MISSING", &instant_policy(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScanError::Provider(ProviderError::UnknownProfile(_))
    ));
}

#[tokio::test]
async fn regions_are_paginated_and_deduplicated() {
    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN, FRANKFURT, ASHBURN], vec![])
        .with_page_size(1);
    let tenancy = cloud.tenancy("DEFAULT").unwrap();
    let regions = list_regions(tenancy.as_ref(), &instant_policy(1))
        .await
        .unwrap();
    assert_eq!(regions, vec![ASHBURN, FRANKFURT]);
    assert_eq!(cloud.count(|c| matches!(c, Call::ListRegions { .. })), 3);
}

#[tokio::test]
async fn repeated_region_page_token_fails_the_listing() {
    let cloud = FakeCloud::new()
        .with_profile("DEFAULT", TENANCY, &[ASHBURN, FRANKFURT], vec![])
        .with_page_size(1)
        .with_stuck_paging();
    let tenancy = cloud.tenancy("DEFAULT").unwrap();
    let err = list_regions(tenancy.as_ref(), &instant_policy(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Provider(ProviderError::Decode(_))));
    assert_eq!(cloud.count(|c| matches!(c, Call::ListRegions { .. })), 2);
}

#[tokio::test]
async fn repeated_compartment_page_token_fails_the_profile_scan() {
    let cloud = two_regions().with_page_size(2).with_stuck_paging();
    let err = scan_profile(&cloud, "DEFAULT", &instant_policy(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Provider(ProviderError::Decode(_))));
    assert_eq!(cloud.count(|c| matches!(c, Call::ListCompartments { .. })), 2);
    assert_eq!(cloud.count(|c| matches!(c, Call::ListInstances { .. })), 0);
}

#[tokio::test]
async fn rebuild_drops_records_missing_from_the_scan() {
    let cache = MemoryBackend::new();
    cache.put(&resource("deleted-long-ago", "i-gone", ASHBURN, "DEFAULT"));
    cache.insert_raw("session:unrelated", "keep me");

    let cloud = two_regions();
    let inventories = scan_all(&cloud, &instant_policy(1)).await.unwrap();
    let summary = rebuild_cache(&cache, &inventories).await.unwrap();

    assert_eq!(summary.flushed, 1);
    assert_eq!(summary.written, 2);
    assert!(cache.record("deleted-long-ago").is_none());
    assert!(cache.record("web-01").is_some());
    assert!(cache.record("DB-01").is_some(), "names are case-insensitive");
    assert_eq!(
        cache.raw("session:unrelated").as_deref(),
        Some("keep me"),
        "keys outside the namespace survive a flush"
    );
    assert_eq!(cache.open_sessions(), 0);
}

#[tokio::test]
async fn cross_profile_collisions_are_counted_and_last_profile_wins() {
    let cloud = two_regions()
        .with_profile(
            "EU",
            EU_TENANCY,
            &[FRANKFURT],
            vec![compartment("c-eu", "eu", EU_TENANCY)],
        )
        .with_instance("EU", instance("i-eu-web", "web-01", "c-eu", FRANKFURT));
    let cache = MemoryBackend::new();

    let inventories = scan_all(&cloud, &instant_policy(1)).await.unwrap();
    let summary = rebuild_cache(&cache, &inventories).await.unwrap();

    assert_eq!(summary.collisions, 1);
    let web = cache.record("web-01").unwrap();
    assert_eq!(web.profile, "EU");
    assert_eq!(web.id, "i-eu-web");
}

#[tokio::test]
async fn failed_scan_leaves_the_previous_cache_untouched() {
    let cache = MemoryBackend::new();
    let previous = resource("web-01", "i-web", ASHBURN, "DEFAULT");
    cache.put(&previous);

    let cloud = two_regions().failing_listings(5);
    let err = run_cycle(&cloud, &cache, &instant_policy(3)).await.unwrap_err();
    assert!(matches!(err, ScanError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(cache.record("web-01"), Some(previous));
    assert_eq!(cache.connects(), 0, "cache never touched");
}

#[tokio::test]
async fn failed_write_aborts_the_rebuild() {
    let cache = MemoryBackend::new();
    cache.fail_writes_to("ociaction:vm:db-01");
    let cloud = two_regions();

    let inventories = scan_all(&cloud, &instant_policy(1)).await.unwrap();
    let err = rebuild_cache(&cache, &inventories).await.unwrap_err();
    assert!(matches!(err, ScanError::Cache(_)));
    assert_eq!(cache.open_sessions(), 0, "session released on the error path");
}
