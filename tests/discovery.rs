use mission_catalog_sync::contract::{MockStorageProvider, StorageEntry};
use mission_catalog_sync::discover::list_json_objects;

fn file_entry(name: &str) -> StorageEntry {
    StorageEntry {
        name: name.to_string(),
        id: Some(format!("id-{name}")),
        updated_at: Some("2024-01-01T00:00:00Z".to_string()),
        size: Some(128),
    }
}

fn folder_entry(name: &str) -> StorageEntry {
    StorageEntry {
        name: name.to_string(),
        ..StorageEntry::default()
    }
}

#[tokio::test]
async fn collects_nested_json_files_depth_first() {
    let mut storage = MockStorageProvider::new();
    storage.expect_list().returning(|bucket, prefix| {
        assert_eq!(bucket, "missions");
        match prefix {
            "" => Ok(vec![
                folder_entry("a"),
                file_entry("root.json"),
                file_entry("notes.txt"),
            ]),
            "a" => Ok(vec![folder_entry("b"), file_entry("one.json")]),
            "a/b" => Ok(vec![file_entry("two.json")]),
            other => panic!("unexpected prefix: {other}"),
        }
    });

    let paths = list_json_objects(&storage, "missions", "")
        .await
        .expect("listing should succeed");

    // Folders are descended into as they are met, so nested files precede
    // later root siblings; non-json leaves are dropped.
    assert_eq!(paths, vec!["a/b/two.json", "a/one.json", "root.json"]);
}

#[tokio::test]
async fn starts_from_the_given_prefix() {
    let mut storage = MockStorageProvider::new();
    storage.expect_list().returning(|_, prefix| {
        assert_eq!(prefix, "season-2");
        Ok(vec![file_entry("intro.json")])
    });

    let paths = list_json_objects(&storage, "missions", "season-2")
        .await
        .expect("listing should succeed");

    assert_eq!(paths, vec!["season-2/intro.json"]);
}

#[tokio::test]
async fn entry_with_any_metadata_is_a_file() {
    // Size alone is enough to mark a leaf; a bare name means a folder, and
    // this one lists as empty.
    let mut storage = MockStorageProvider::new();
    storage.expect_list().returning(|_, prefix| match prefix {
        "" => Ok(vec![
            StorageEntry {
                name: "sized.json".to_string(),
                size: Some(1),
                ..StorageEntry::default()
            },
            folder_entry("empty"),
        ]),
        "empty" => Ok(vec![]),
        other => panic!("unexpected prefix: {other}"),
    });

    let paths = list_json_objects(&storage, "missions", "")
        .await
        .expect("listing should succeed");

    assert_eq!(paths, vec!["sized.json"]);
}

#[tokio::test]
async fn listing_failure_aborts_discovery() {
    let mut storage = MockStorageProvider::new();
    storage.expect_list().returning(|_, prefix| match prefix {
        "" => Ok(vec![folder_entry("deep")]),
        _ => Err("listing failed: internal error".into()),
    });

    let result = list_json_objects(&storage, "missions", "").await;

    assert!(result.is_err(), "a nested listing error must be fatal");
}
