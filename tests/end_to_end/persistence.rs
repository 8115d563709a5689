//! Persistence round trip through the manager

use crate::common::*;
use mnemos::storage::CollectionLayout;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_round_trip_preserves_every_record() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(dir.path(), "memories", 3);

    let manager = CollectionManager::from_config(config.clone());
    manager.connect().unwrap();
    let ids: Vec<RecordId> = vec![1.into(), "two".into(), 3.into()];
    manager
        .insert(
            &[vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6], vec![0.7, 0.8, 0.9]],
            &ids,
            &[
                payload(json!({"kind": "fact", "tags": ["a", "b"]})),
                payload(json!({"importance": 0.75})),
                Payload::new(),
            ],
        )
        .unwrap();
    let before: Vec<_> = ids.iter().map(|id| manager.get(id).unwrap()).collect();
    manager.disconnect().unwrap();

    let layout = CollectionLayout::for_config(&config);
    assert!(layout.metadata_path.is_file());
    assert!(layout.payloads_path.is_file());
    assert!(layout.index_path.is_file());

    let reopened = CollectionManager::from_config(config);
    reopened.connect().unwrap();
    let after: Vec<_> = ids.iter().map(|id| reopened.get(id).unwrap()).collect();
    assert_eq!(before, after);

    let (records, total) = reopened.list(None, None).unwrap();
    assert_eq!(total, 3);
    let order: Vec<_> = records.into_iter().map(|r| r.id).collect();
    assert_eq!(order, ids);
}

#[test]
fn test_corrupt_files_never_block_startup() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(dir.path(), "corrupt", 2);
    let layout = CollectionLayout::for_config(&config);
    std::fs::create_dir_all(&layout.dir).unwrap();
    std::fs::write(&layout.metadata_path, b"{\"dimension\": 2, \"vectors\": ").unwrap();
    std::fs::write(&layout.payloads_path, b"[[1, ").unwrap();

    let manager = CollectionManager::from_config(config);
    manager.connect().unwrap();
    assert_eq!(manager.info().vector_count, 0);

    // the collection is usable and overwrites the damaged files
    manager
        .insert(&[vec![1.0, 0.0]], &[1.into()], &empty_payloads(1))
        .unwrap();
    manager.flush().unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(
        &std::fs::read(&layout.metadata_path).unwrap()
    )
    .is_ok());
}

#[test]
fn test_delete_collection_removes_files() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(dir.path(), "doomed", 2);
    let manager = CollectionManager::from_config(config.clone());
    manager.connect().unwrap();
    manager
        .insert(&[vec![1.0, 0.0]], &[1.into()], &empty_payloads(1))
        .unwrap();
    manager.delete_collection().unwrap();

    assert!(!CollectionLayout::for_config(&config).exists());
    manager.disconnect().unwrap();

    let reopened = CollectionManager::from_config(config);
    reopened.connect().unwrap();
    assert_eq!(reopened.info().vector_count, 0);
}

#[test]
fn test_config_file_drives_collection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(mnemos::CONFIG_FILE_NAME);
    MnemosConfig::write_default_if_missing(&path).unwrap();

    let mut config = MnemosConfig::from_file(&path).unwrap();
    config.knowledge = config
        .knowledge
        .with_persistence(dir.path().join("vectors"))
        .with_max_vectors(5);
    config.knowledge.dimension = 2;
    config.write_to_file(&path).unwrap();

    let loaded = MnemosConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);

    let manager = CollectionManager::from_config(loaded.knowledge);
    manager.connect().unwrap();
    assert_eq!(manager.info().max_vectors, 5);
    assert!(manager.info().persistence_enabled);
}
