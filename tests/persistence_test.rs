use chargedeck::persistence::{FileStore, KeyValueStore};
use std::fs;

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("absent.json")).unwrap();
    assert!(store.keys().is_empty());
}

#[test]
fn writes_are_visible_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = FileStore::open(&path).unwrap();
    store.set("onboarding.active", "true").unwrap();
    store.set("onboarding.step", "3").unwrap();
    store.remove("onboarding.step").unwrap();

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("onboarding.active").as_deref(), Some("true"));
    assert!(reopened.get("onboarding.step").is_none());
    assert_eq!(reopened.keys(), vec!["onboarding.active".to_string()]);
}

#[test]
fn file_is_a_flat_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut store = FileStore::new(&path);
    store.set("a", "1").unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"a": "1"}));
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[test]
fn unreadable_file_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let mut store = FileStore::open(&path).unwrap();
    assert!(store.keys().is_empty());
    store.set("k", "v").unwrap();
    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("k").as_deref(), Some("v"));
}
