//! Integration tests for the YAML rule store
//!
//! These exercise the store against real files: write idempotence, parameter
//! round trips and the handling of malformed files.

use dataquality_catalog::{ConfigurationStore, YamlRuleStore};
use dataquality_core::RecordingSink;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn setup() -> (tempfile::TempDir, YamlRuleStore, Arc<RecordingSink>) {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::new());
    let store = YamlRuleStore::new(dir.path().join("config").join("constraints.yml"), sink.clone());
    (dir, store, sink)
}

#[test]
fn add_class_attribute_twice_leaves_file_unchanged() {
    let (_dir, store, _) = setup();

    store.add_class_attribute("Product", "sku").unwrap();
    let first = std::fs::read(store.path()).unwrap();
    let modified = std::fs::metadata(store.path()).unwrap().modified().unwrap();

    store.add_class_attribute("Product", "sku").unwrap();
    assert_eq!(std::fs::read(store.path()).unwrap(), first);
    assert_eq!(std::fs::metadata(store.path()).unwrap().modified().unwrap(), modified);

    assert!(store.is_class_attribute_configured("Product", "sku"));
    let config = store.attribute_config("Product", "sku").unwrap();
    assert_eq!(config.note, None);
    assert!(config.rules.is_empty());
}

#[test]
fn remove_unconfigured_attribute_succeeds_without_writing() {
    let (_dir, store, sink) = setup();

    store.remove_class_attribute("Product", "sku").unwrap();
    assert!(!store.path().exists());
    assert_eq!(sink.invalid_config_count(), 0);
}

#[test]
fn add_or_modify_constraint_round_trips_params() {
    let (_dir, store, _) = setup();

    let cases = [
        (Some(r#"{"min": 1, "max": 5}"#), json!({"min": 1, "max": 5})),
        (Some("[\"red\", \"green\"]"), json!(["red", "green"])),
        (Some("42"), json!(42)),
        (Some("plain text"), json!("plain text")),
        (Some(""), Value::Null),
        (None, Value::Null),
    ];

    for (raw, expected) in cases {
        store
            .add_or_modify_constraint("Product", "sku", "Custom", raw)
            .unwrap();
        let rules = store.rules_for_class("Product");
        assert_eq!(rules.attributes["sku"].rules["Custom"], expected, "raw = {:?}", raw);
    }
}

#[test]
fn malformed_store_reads_as_empty_and_reports_each_read() {
    let (_dir, store, sink) = setup();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "just a string").unwrap();

    assert!(store.rules_for_class("Product").is_empty());
    assert_eq!(sink.invalid_config_count(), 1);

    assert!(store.rules_for_class("Category").is_empty());
    assert_eq!(sink.invalid_config_count(), 2);

    assert!(!store.is_class_configured("Product"));
    assert_eq!(sink.invalid_config_count(), 3);
}

#[test]
fn broken_yaml_is_reported() {
    let (_dir, store, sink) = setup();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "Product: [unclosed").unwrap();

    assert!(store.configured_classes().is_empty());
    assert_eq!(sink.invalid_config_count(), 1);
}

#[test]
fn namespaced_class_names_resolve_to_base_name() {
    let (_dir, store, _) = setup();

    store
        .add_or_modify_constraint("App\\Model\\Product", "sku", "NotBlank", None)
        .unwrap();

    assert_eq!(store.configured_classes(), vec!["Product".to_string()]);
    assert!(store.is_class_configured("Product"));
    assert_eq!(store.rules_for_class("App\\Model\\Product").len(), 1);
}
