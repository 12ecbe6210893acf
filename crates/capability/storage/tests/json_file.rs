use serde_json::json;
use van_storage::{BlobStore, InMemoryBlobStore, JsonFileStore, StorageError};

#[tokio::test]
async fn save_load_delete_round() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join("data"));

    assert!(store.load("tanks.json").await.expect("load").is_none());
    assert!(!store.exists("tanks.json").await.expect("exists"));

    store
        .save("tanks.json", &json!([{"id": "t1"}]))
        .await
        .expect("save");
    assert!(store.exists("tanks.json").await.expect("exists"));
    let loaded = store.load("tanks.json").await.expect("load").expect("some");
    assert_eq!(loaded, json!([{"id": "t1"}]));

    let raw = std::fs::read_to_string(dir.path().join("data").join("tanks.json")).expect("read");
    assert!(raw.contains('\n'), "documents are written indented");

    store.delete("tanks.json").await.expect("delete");
    store.delete("tanks.json").await.expect("delete twice");
    assert!(!store.exists("tanks.json").await.expect("exists"));
}

#[tokio::test]
async fn keys_without_extension_map_to_json_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    store.save("settings", &json!({"vanModel": "x"})).await.expect("save");
    store.save("alerts.json", &json!([])).await.expect("save");
    let keys = store.keys().await.expect("keys");
    assert_eq!(keys, vec!["alerts.json".to_string(), "settings.json".to_string()]);
}

#[tokio::test]
async fn path_traversal_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    let err = store.save("../escape.json", &json!({})).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(_)));
}

#[tokio::test]
async fn corrupt_file_surfaces_serde_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("broken.json"), b"{not json").expect("write");
    let store = JsonFileStore::new(dir.path());
    let err = store.load("broken.json").await.unwrap_err();
    assert!(matches!(err, StorageError::Serde(_)));
}

#[tokio::test]
async fn concurrent_saves_leave_a_valid_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = std::sync::Arc::new(JsonFileStore::new(dir.path()));
    let mut handles = Vec::new();
    for idx in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.save("shared.json", &json!({"writer": idx})).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("save");
    }
    let loaded = store.load("shared.json").await.expect("load").expect("some");
    assert!(loaded.get("writer").and_then(|v| v.as_u64()).is_some());
}

#[tokio::test]
async fn in_memory_blob_store_behaves_like_files() {
    let store = InMemoryBlobStore::new();
    assert!(store.load("k").await.expect("load").is_none());
    store.save("k", &json!(1)).await.expect("save");
    assert!(store.exists("k").await.expect("exists"));
    assert_eq!(store.keys().await.expect("keys"), vec!["k".to_string()]);
    store.delete("k").await.expect("delete");
    assert!(!store.exists("k").await.expect("exists"));
}
