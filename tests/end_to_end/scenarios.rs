//! Reference scenarios

use crate::common::*;
use mnemos::{MigrationOptions, MigrationStatus};
use serde_json::json;

/// Dimension-4 collection, two orthogonal records, nearest is id 1
#[test]
fn scenario_a_nearest_neighbour() {
    let manager = memory_manager("scenario-a", 4);
    manager
        .insert(
            &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]],
            &[1.into(), 2.into()],
            &empty_payloads(2),
        )
        .unwrap();

    let results = manager.search(&[1.0, 0.0, 0.0, 0.0], 1, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, RecordId::from(1));
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

/// Three inserts with max_vectors = 2: the third fails, count stays 2
#[test]
fn scenario_b_capacity() {
    let manager =
        CollectionManager::from_config(StorageConfig::new("scenario-b", 2).with_max_vectors(2));
    manager.connect().unwrap();

    manager
        .insert(&[vec![1.0, 0.0]], &[1.into()], &empty_payloads(1))
        .unwrap();
    manager
        .insert(&[vec![0.0, 1.0]], &[2.into()], &empty_payloads(1))
        .unwrap();
    let err = manager
        .insert(&[vec![1.0, 1.0]], &[3.into()], &empty_payloads(1))
        .unwrap_err();

    assert!(matches!(
        err,
        VectorError::CapacityExceeded {
            limit: 2,
            current: 2,
            requested: 1,
            ..
        }
    ));
    assert_eq!(manager.info().vector_count, 2);
    assert!(manager.get(&3.into()).unwrap().is_none());
}

/// Update replaces vector and payload; no field merge
#[test]
fn scenario_c_update_replaces() {
    let manager = memory_manager("scenario-c", 3);
    manager
        .insert(
            &[vec![1.0, 2.0, 3.0]],
            &["memo".into()],
            &[payload(json!({"old": true, "shared": 1}))],
        )
        .unwrap();

    manager
        .update(
            &"memo".into(),
            &[3.0, 2.0, 1.0],
            payload(json!({"shared": 2, "new": "yes"})),
        )
        .unwrap();

    let record = manager.get(&"memo".into()).unwrap().unwrap();
    assert_eq!(record.vector, vec![3.0, 2.0, 1.0]);
    assert_eq!(record.payload, payload(json!({"shared": 2, "new": "yes"})));
    assert!(!record.payload.contains_key("old"));
}

/// normalize twice without force: second run re-embeds nothing
#[test]
fn scenario_d_idempotent_normalization() {
    let manager = memory_manager("scenario-d", 8);
    let texts = [
        "The agent fixed the BUILD!",
        "Cache invalidation, again.",
        "Remember: users prefer dark mode",
    ];
    let ids: Vec<RecordId> = (0..texts.len() as i64).map(RecordId::from).collect();
    let payloads: Vec<Payload> = texts.iter().map(|t| payload(json!({"text": t}))).collect();
    manager
        .insert(&vec![vec![1.0; 8]; texts.len()], &ids, &payloads)
        .unwrap();

    let embedder = HashingEmbedder::new(8);
    let config = NormalizationConfig {
        remove_stopwords: true,
        stem: true,
        ..NormalizationConfig::default()
    };

    let first = manager.normalize(Some(&embedder), Some(&config), &MigrationOptions::default());
    assert_eq!(first.status, MigrationStatus::Success);
    assert_eq!(first.processed, 3);
    let calls_after_first = embedder.calls();

    let second = manager.normalize(Some(&embedder), Some(&config), &MigrationOptions::default());
    assert_eq!(second.status, MigrationStatus::Success);
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(embedder.calls(), calls_after_first);
    assert!(second.message.contains("3 unchanged"));
}
