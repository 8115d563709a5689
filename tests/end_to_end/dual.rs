//! Knowledge/reflection separation

use crate::common::*;
use mnemos::{CollectionKind, DualCollectionManager};
use tempfile::TempDir;

fn dual_config(dir: &std::path::Path) -> MnemosConfig {
    MnemosConfig {
        reflection_enabled: true,
        knowledge: persistent_config(dir, "knowledge", 2),
        reflection: Some(persistent_config(dir, "reflection", 2).with_max_vectors(1)),
        normalization: NormalizationConfig::default(),
    }
}

#[test]
fn test_records_never_cross_halves() {
    let dir = TempDir::new().unwrap();
    let dual = DualCollectionManager::from_config(&dual_config(dir.path())).unwrap();
    dual.connect().unwrap();

    dual.collection(CollectionKind::Knowledge)
        .unwrap()
        .insert(&[vec![1.0, 0.0]], &["shared-id".into()], &empty_payloads(1))
        .unwrap();
    dual.collection(CollectionKind::Reflection)
        .unwrap()
        .insert(&[vec![0.0, 1.0]], &["shared-id".into()], &empty_payloads(1))
        .unwrap();

    let k = dual.knowledge().get(&"shared-id".into()).unwrap().unwrap();
    let r = dual
        .reflection()
        .unwrap()
        .get(&"shared-id".into())
        .unwrap()
        .unwrap();
    assert_eq!(k.vector, vec![1.0, 0.0]);
    assert_eq!(r.vector, vec![0.0, 1.0]);
}

#[test]
fn test_reflection_capacity_is_independent() {
    let dir = TempDir::new().unwrap();
    let dual = DualCollectionManager::from_config(&dual_config(dir.path())).unwrap();
    dual.connect().unwrap();

    let reflection = dual.collection(CollectionKind::Reflection).unwrap();
    reflection
        .insert(&[vec![0.0, 1.0]], &[1.into()], &empty_payloads(1))
        .unwrap();
    assert!(reflection
        .insert(&[vec![0.0, 1.0]], &[2.into()], &empty_payloads(1))
        .is_err());

    for n in 0..5i64 {
        dual.knowledge()
            .insert(&[vec![1.0, n as f32]], &[n.into()], &empty_payloads(1))
            .unwrap();
    }

    let info = dual.info();
    assert_eq!(info.knowledge.collection.unwrap().vector_count, 5);
    assert_eq!(info.reflection.collection.unwrap().vector_count, 1);
}

#[test]
fn test_disabled_flag_ignores_reflection_block() {
    let dir = TempDir::new().unwrap();
    let mut config = dual_config(dir.path());
    config.reflection_enabled = false;

    let dual = DualCollectionManager::from_config(&config).unwrap();
    dual.connect().unwrap();
    let info = dual.info();
    assert!(!info.reflection.enabled);
    assert!(info.knowledge.connected);
    assert!(dual.collection(CollectionKind::Reflection).is_err());
}
