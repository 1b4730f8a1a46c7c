mod common;

use algolia_mcp::config::{Credentials, EnabledToolsets};
use algolia_mcp::providers::{abtesting, build_registry, monitoring, usage, Toolset};
use algolia_mcp::registry::{Registry, RegistryError};
use common::{config_with, credentials};
use std::collections::BTreeSet;

fn names(registry: &Registry) -> Vec<String> {
    registry.names().map(str::to_string).collect()
}

#[test]
fn test_registration_order_does_not_matter() {
    let mut forward = Registry::builder();
    forward
        .register_toolset("usage", usage::descriptors().unwrap())
        .unwrap()
        .register_toolset("monitoring", monitoring::descriptors().unwrap())
        .unwrap();

    let mut backward = Registry::builder();
    backward
        .register_toolset("monitoring", monitoring::descriptors().unwrap())
        .unwrap()
        .register_toolset("usage", usage::descriptors().unwrap())
        .unwrap();

    let forward = forward.build();
    let backward = backward.build();
    assert_eq!(names(&forward), names(&backward));
    assert_eq!(forward.len(), 12);
    assert_eq!(forward.toolset_of("usage_get_daily_metrics"), Some("usage"));
}

#[test]
fn test_duplicate_name_across_toolsets_is_fatal() {
    let mut builder = Registry::builder();
    builder
        .register_toolset("usage", usage::descriptors().unwrap())
        .unwrap();

    let err = builder
        .register_toolset("usage_again", usage::descriptors().unwrap())
        .unwrap_err();

    match err {
        RegistryError::DuplicateTool {
            name,
            existing,
            toolset,
        } => {
            assert!(name.starts_with("usage_"));
            assert_eq!(existing, "usage");
            assert_eq!(toolset, "usage_again");
        }
        other => panic!("expected duplicate tool error, got {:?}", other),
    }
    // The failed batch left nothing behind.
    assert_eq!(builder.len(), 3);
}

#[test]
fn test_single_registration_rejects_duplicates() {
    let mut descriptors = usage::descriptors().unwrap().into_iter();
    let first = descriptors.next().unwrap();

    let mut builder = Registry::builder();
    builder.register(first.clone()).unwrap();
    assert!(matches!(
        builder.register(first),
        Err(RegistryError::DuplicateTool { .. })
    ));

    let registry = builder.build();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.toolset_of("usage_get_daily_metrics"), Some("default"));
}

#[test]
fn test_toolset_batch_is_atomic() {
    let mut builder = Registry::builder();
    builder
        .register_toolset("monitoring", monitoring::descriptors().unwrap())
        .unwrap();

    let mut batch = abtesting::descriptors().unwrap();
    batch.extend(monitoring::descriptors().unwrap());
    assert!(builder.register_toolset("mixed", batch).is_err());

    let registry = builder.build();
    assert!(registry.lookup("abtesting_list_abtests").is_none());
    assert_eq!(registry.len(), 9);
}

#[test]
fn test_lookup() {
    let mut builder = Registry::builder();
    builder
        .register_toolset("usage", usage::descriptors().unwrap())
        .unwrap();
    let registry = builder.build();

    let descriptor = registry.lookup("usage_get_hourly_metrics").unwrap();
    assert_eq!(descriptor.label(), "Hourly Metrics");
    assert!(descriptor.schema().field("application").unwrap().required);
    assert!(!descriptor.schema().field("endTime").unwrap().required);
    assert!(registry.lookup("does_not_exist").is_none());
}

#[test]
fn test_default_policy_leaves_opt_in_toolsets_out() {
    let defaults = EnabledToolsets::default();
    assert!(Registry::is_enabled("search", &defaults));
    assert!(Registry::is_enabled("usage", &defaults));
    assert!(!Registry::is_enabled("search_read", &defaults));
    assert!(!Registry::is_enabled("search_write", &defaults));
    assert!(!Registry::is_enabled("ingestion", &defaults));

    let explicit = EnabledToolsets::explicit(["ingestion"]);
    assert!(Registry::is_enabled("ingestion", &explicit));
    assert!(!Registry::is_enabled("search", &explicit));
}

#[test]
fn test_default_registry_covers_every_default_toolset() {
    let mut config = config_with(&[], credentials());
    config.toolsets = EnabledToolsets::default();
    let registry = build_registry(&config).unwrap();

    let toolsets: BTreeSet<&str> = registry.toolsets().into_iter().collect();
    let expected: BTreeSet<&str> = [
        "abtesting",
        "analytics",
        "collections",
        "monitoring",
        "querysuggestions",
        "recommend",
        "search",
        "usage",
    ]
    .into_iter()
    .collect();
    assert_eq!(toolsets, expected);

    assert!(registry.lookup("run_query").is_some());
    assert!(registry.lookup("insert_object").is_some());
    assert!(registry.lookup("list_connector").is_none());
}

#[test]
fn test_search_supersedes_split_toolsets() {
    let config = config_with(&["search", "search_read", "search_write"], credentials());
    let registry = build_registry(&config).unwrap();

    assert_eq!(registry.toolsets(), vec!["search"]);
    assert_eq!(registry.len(), 23);
}

#[test]
fn test_explicit_write_toolset_needs_write_key() {
    let config = config_with(&["search_write"], Credentials::new("APPID1", "read-key"));
    let err = build_registry(&config).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::MissingCredentials { ref toolset, .. } if toolset == "search_write"
    ));

    let config = config_with(&["ingestion"], Credentials::default());
    assert!(build_registry(&config).is_err());

    // Read toolsets still start without credentials; calls fail individually.
    let config = config_with(&["search_read", "usage"], Credentials::default());
    assert!(build_registry(&config).is_ok());
}

#[test]
fn test_write_key_checked_even_when_search_covers_the_toolset() {
    let config = config_with(&["search", "search_write"], Credentials::new("APPID1", "read-key"));
    let err = build_registry(&config).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::MissingCredentials { ref toolset, .. } if toolset == "search_write"
    ));

    let config = config_with(&["search", "search_read"], Credentials::new("APPID1", "read-key"));
    assert!(build_registry(&config).is_ok());
}

#[test]
fn test_acl_gating_drops_ungranted_tools() {
    let mut config = config_with(&["search_read"], credentials());
    config.acl = Some(["search".to_string()].into_iter().collect());
    let registry = build_registry(&config).unwrap();

    assert!(registry.lookup("get_object").is_some());
    assert!(registry.lookup("get_settings").is_none());
    assert!(registry.lookup("run_query").is_some());

    config.acl = None;
    let registry = build_registry(&config).unwrap();
    assert!(registry.lookup("get_settings").is_some());
}

#[test]
fn test_unknown_toolset_names_are_ignored() {
    let config = config_with(&["usage", "nonsense"], credentials());
    let registry = build_registry(&config).unwrap();
    assert_eq!(registry.toolsets(), vec!["usage"]);
}

#[test]
fn test_catalogue_names_are_unique() {
    let config = config_with(&[], credentials());
    let mut seen = BTreeSet::new();
    for toolset in Toolset::ALL {
        if matches!(toolset, Toolset::Search) {
            continue;
        }
        for descriptor in toolset.descriptors(&config).unwrap() {
            assert!(
                seen.insert(descriptor.name().to_string()),
                "{} is defined twice",
                descriptor.name()
            );
            assert!(!descriptor.description().is_empty());
        }
    }
}
