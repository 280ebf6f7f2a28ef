//! At-rest encryption behavior across store instances and the read-only view.

use mnemon_rs_config::StorageConfig;
use mnemon_rs_store::{ReadOnlyStore, Store};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::Path;
use tempfile::tempdir;

fn encrypted_config(data_dir: &Path, key_name: &str) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        max_file_size: 1024 * 1024,
        max_storage_size: 10 * 1024 * 1024,
        enable_async: false,
        enable_compression: true,
        compression_level: 6,
        enable_encryption: true,
        encryption_key_path: data_dir.join(key_name),
        ..StorageConfig::default()
    }
}

#[test]
fn encrypted_records_round_trip_across_instances() {
    let temp = tempdir().expect("tempdir");
    let config = encrypted_config(temp.path(), "test.key");

    let content = "This is a test memory that should be encrypted";
    let stored = {
        let store = Store::open(config.clone()).expect("store");
        let stored = store
            .store(
                content,
                "Test encrypted memory",
                "test",
                vec!["encryption".to_string(), "test".to_string()],
                HashMap::new(),
            )
            .expect("store");

        let retrieved = store.get(&stored.id).expect("get");
        assert_eq!(retrieved.content, content);
        store.close().expect("close");
        stored
    };

    // The bytes on disk must not leak the plaintext.
    let file = std::fs::read_dir(temp.path().join("memories"))
        .expect("read dir")
        .filter_map(Result::ok)
        .find(|entry| entry.file_name().to_string_lossy().starts_with(&stored.id))
        .expect("record file");
    let raw = std::fs::read(file.path()).expect("read record file");
    assert!(!raw
        .windows(content.len())
        .any(|window| window == content.as_bytes()));

    let reopened = Store::open(config).expect("reopen");
    let retrieved = reopened.get(&stored.id).expect("get after restart");
    assert_eq!(retrieved.content, content);
    reopened.close().expect("close");
}

#[test]
fn wrong_key_skips_every_record_at_load() {
    let temp = tempdir().expect("tempdir");

    {
        let store = Store::open(encrypted_config(temp.path(), "test.key")).expect("store");
        store
            .store(
                "sealed with the original key",
                "",
                "test",
                Vec::new(),
                HashMap::new(),
            )
            .expect("store");
        store.close().expect("close");
    }

    // A different key path generates a fresh key; the existing files fail
    // authentication and are skipped rather than crashing startup.
    let store = Store::open(encrypted_config(temp.path(), "wrong.key")).expect("store");
    assert_eq!(store.stats().total_memories, 0);
    store.close().expect("close");
}

#[test]
fn replacing_the_key_bytes_orphans_existing_records() {
    let temp = tempdir().expect("tempdir");
    let config = encrypted_config(temp.path(), "test.key");

    {
        let store = Store::open(config.clone()).expect("store");
        store
            .store("sealed content", "", "", Vec::new(), HashMap::new())
            .expect("store");
        store.close().expect("close");
    }

    std::fs::write(&config.encryption_key_path, [7u8; 32]).expect("overwrite key");

    let store = Store::open(config).expect("store");
    assert_eq!(store.stats().total_memories, 0);
    store.close().expect("close");
}

#[test]
fn read_only_view_decrypts_with_the_same_key() {
    let temp = tempdir().expect("tempdir");
    let config = encrypted_config(temp.path(), "test.key");

    let content = "This is a test memory for read-only access";
    {
        let store = Store::open(config.clone()).expect("store");
        store
            .store(
                content,
                "Test read-only encrypted memory",
                "readonly-test",
                vec!["encryption".to_string(), "readonly".to_string()],
                HashMap::new(),
            )
            .expect("store");
        store.close().expect("close");
    }

    let view = ReadOnlyStore::open(&config).expect("view");

    let listed = view.list("", &[], 10);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, content);

    let stats = view.stats();
    assert_eq!(stats.total_memories, 1);
    assert!(stats.total_size > 0);
}

#[test]
fn read_only_refresh_picks_up_new_records() {
    let temp = tempdir().expect("tempdir");
    let config = encrypted_config(temp.path(), "test.key");

    let store = Store::open(config.clone()).expect("store");
    store
        .store("first", "", "", Vec::new(), HashMap::new())
        .expect("store");

    let view = ReadOnlyStore::open(&config).expect("view");
    assert_eq!(view.stats().total_memories, 1);

    store
        .store("second", "", "", Vec::new(), HashMap::new())
        .expect("store");
    view.refresh().expect("refresh");
    assert_eq!(view.stats().total_memories, 2);

    store.close().expect("close");
}
