//! Knowledge + reflection collection pair
//!
//! The knowledge collection is always active. The reflection collection
//! is active when a `[reflection]` block is configured and
//! `reflection_enabled` is set. A reflection that fails to connect does
//! not fail [`DualCollectionManager::connect`]; the manager runs
//! knowledge-only and reports the error through [`DualCollectionInfo`].
//! An invalid reflection block is handled the same way at construction.
//!
//! Callers address a half explicitly with [`CollectionKind`]; the
//! manager never routes records on its own.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use mnemos_core::{
    CollectionInfo, Embedder, MnemosConfig, NormalizationConfig, VectorError, VectorResult,
    DEFAULT_REFLECTION_COLLECTION,
};

use super::migration::{MigrationOptions, MigrationReport};
use super::single::CollectionManager;
use crate::events::{EventSink, TracingSink};

/// Which half of the pair an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Primary, always active
    Knowledge,
    /// Secondary, optional
    Reflection,
}

impl CollectionKind {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Knowledge => "knowledge",
            CollectionKind::Reflection => "reflection",
        }
    }
}

/// State of one half
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfInfo {
    /// Configured and not disabled
    pub enabled: bool,
    /// Currently connected
    pub connected: bool,
    /// Collection snapshot, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionInfo>,
    /// Last connection error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State of both halves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualCollectionInfo {
    /// Knowledge collection
    pub knowledge: HalfInfo,
    /// Reflection collection
    pub reflection: HalfInfo,
}

/// Two independently configured collections managed as one unit
pub struct DualCollectionManager {
    knowledge: CollectionManager,
    reflection: Option<CollectionManager>,
    reflection_configured: bool,
    reflection_error: Mutex<Option<String>>,
}

impl DualCollectionManager {
    /// Build both halves from `config`; events go to [`TracingSink`]
    pub fn from_config(config: &MnemosConfig) -> VectorResult<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Build both halves, sending events of both to `sink`
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the knowledge block is invalid. An
    /// invalid reflection block is recorded and leaves reflection
    /// unavailable.
    pub fn with_sink(config: &MnemosConfig, sink: Arc<dyn EventSink>) -> VectorResult<Self> {
        config.knowledge.validate()?;
        let knowledge =
            CollectionManager::from_config(config.knowledge.clone()).with_sink(sink.clone());

        let mut reflection_error = None;
        let reflection = match (&config.reflection, config.reflection_enabled) {
            (Some(block), true) => match config.validate_reflection() {
                Ok(()) => Some(CollectionManager::from_config(block.clone()).with_sink(sink)),
                Err(e) => {
                    warn!(
                        target: "mnemos::manager",
                        collection = %block.collection_name,
                        error = %e,
                        "Invalid reflection configuration, continuing with knowledge only"
                    );
                    reflection_error = Some(e.to_string());
                    None
                }
            },
            _ => None,
        };
        Ok(DualCollectionManager {
            knowledge,
            reflection,
            reflection_configured: config.reflection.is_some() && config.reflection_enabled,
            reflection_error: Mutex::new(reflection_error),
        })
    }

    /// Pair two existing managers
    pub fn new(knowledge: CollectionManager, reflection: Option<CollectionManager>) -> Self {
        DualCollectionManager {
            knowledge,
            reflection_configured: reflection.is_some(),
            reflection,
            reflection_error: Mutex::new(None),
        }
    }

    /// Connect knowledge (errors propagate) then reflection (errors are
    /// recorded and the manager continues knowledge-only)
    pub fn connect(&self) -> VectorResult<()> {
        self.knowledge.connect()?;

        if let Some(reflection) = &self.reflection {
            match reflection.connect() {
                Ok(()) => *self.reflection_error.lock() = None,
                Err(e) => {
                    warn!(
                        target: "mnemos::manager",
                        collection = reflection.name(),
                        error = %e,
                        "Reflection collection unavailable, continuing with knowledge only"
                    );
                    *self.reflection_error.lock() = Some(e.to_string());
                }
            }
        }

        info!(
            target: "mnemos::manager",
            knowledge = self.knowledge.name(),
            reflection = self.is_available(CollectionKind::Reflection),
            "Dual collection connected"
        );
        Ok(())
    }

    /// Disconnect both halves
    ///
    /// Both are attempted; the first error is returned.
    pub fn disconnect(&self) -> VectorResult<()> {
        let knowledge = self.knowledge.disconnect();
        let reflection = match &self.reflection {
            Some(r) if r.is_connected() => r.disconnect(),
            _ => Ok(()),
        };
        knowledge.and(reflection)
    }

    /// Whether `kind` is enabled and connected
    pub fn is_available(&self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Knowledge => self.knowledge.is_connected(),
            CollectionKind::Reflection => self
                .reflection
                .as_ref()
                .map_or(false, CollectionManager::is_connected),
        }
    }

    /// Manager for `kind`
    ///
    /// # Errors
    ///
    /// `CollectionUnavailable` when the reflection half is disabled or
    /// failed to connect.
    pub fn collection(&self, kind: CollectionKind) -> VectorResult<&CollectionManager> {
        match kind {
            CollectionKind::Knowledge => Ok(&self.knowledge),
            CollectionKind::Reflection => match &self.reflection {
                Some(r) if r.is_connected() => Ok(r),
                Some(r) => Err(VectorError::CollectionUnavailable {
                    name: r.name().to_string(),
                }),
                None => Err(VectorError::CollectionUnavailable {
                    name: DEFAULT_REFLECTION_COLLECTION.to_string(),
                }),
            },
        }
    }

    /// Knowledge manager
    pub fn knowledge(&self) -> &CollectionManager {
        &self.knowledge
    }

    /// Reflection manager, when available
    pub fn reflection(&self) -> Option<&CollectionManager> {
        self.collection(CollectionKind::Reflection).ok()
    }

    /// Enablement and connection state of both halves
    pub fn info(&self) -> DualCollectionInfo {
        let knowledge = HalfInfo {
            enabled: true,
            connected: self.knowledge.is_connected(),
            collection: Some(self.knowledge.info()),
            error: None,
        };
        let reflection = match &self.reflection {
            Some(r) => HalfInfo {
                enabled: true,
                connected: r.is_connected(),
                collection: Some(r.info()),
                error: self.reflection_error.lock().clone(),
            },
            None => HalfInfo {
                enabled: self.reflection_configured,
                connected: false,
                collection: None,
                error: self.reflection_error.lock().clone(),
            },
        };
        DualCollectionInfo {
            knowledge,
            reflection,
        }
    }

    /// Run the normalization migration on one half
    pub fn normalize(
        &self,
        kind: CollectionKind,
        embedder: Option<&dyn Embedder>,
        config: Option<&NormalizationConfig>,
        options: &MigrationOptions,
    ) -> VectorResult<MigrationReport> {
        Ok(self.collection(kind)?.normalize(embedder, config, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::{Payload, StorageConfig};
    use tempfile::TempDir;

    fn config_with_reflection(enabled: bool) -> MnemosConfig {
        MnemosConfig {
            reflection_enabled: enabled,
            knowledge: StorageConfig::new("knowledge", 2),
            reflection: Some(StorageConfig::new("reflection", 2).with_max_vectors(10)),
            normalization: NormalizationConfig::default(),
        }
    }

    #[test]
    fn test_both_halves_independent() {
        let dual = DualCollectionManager::from_config(&config_with_reflection(true)).unwrap();
        dual.connect().unwrap();

        let knowledge = dual.collection(CollectionKind::Knowledge).unwrap();
        let reflection = dual.collection(CollectionKind::Reflection).unwrap();
        knowledge
            .insert(&[vec![1.0, 0.0]], &[1.into()], &[Payload::new()])
            .unwrap();
        reflection
            .insert(&[vec![0.0, 1.0]], &[2.into()], &[Payload::new()])
            .unwrap();

        assert!(knowledge.get(&2.into()).unwrap().is_none());
        assert!(reflection.get(&1.into()).unwrap().is_none());

        let info = dual.info();
        assert!(info.reflection.enabled && info.reflection.connected);
        assert_eq!(info.knowledge.collection.unwrap().vector_count, 1);
        assert_eq!(info.reflection.collection.unwrap().max_vectors, 10);
    }

    #[test]
    fn test_disabled_reflection() {
        let dual = DualCollectionManager::from_config(&config_with_reflection(false)).unwrap();
        dual.connect().unwrap();

        let err = dual.collection(CollectionKind::Reflection).unwrap_err();
        assert!(matches!(err, VectorError::CollectionUnavailable { .. }));
        assert!(dual.reflection().is_none());
        assert!(!dual.info().reflection.enabled);
    }

    #[test]
    fn test_reflection_failure_degrades() {
        let bad_reflection = CollectionManager::from_config(StorageConfig::new("_reserved", 2));
        let knowledge = CollectionManager::from_config(StorageConfig::new("knowledge", 2));
        let dual = DualCollectionManager::new(knowledge, Some(bad_reflection));

        dual.connect().unwrap();
        assert!(dual.is_available(CollectionKind::Knowledge));
        assert!(!dual.is_available(CollectionKind::Reflection));

        let info = dual.info();
        assert!(info.reflection.enabled);
        assert!(!info.reflection.connected);
        assert!(info.reflection.error.unwrap().contains("reserved"));

        let err = dual.collection(CollectionKind::Reflection).unwrap_err();
        assert!(matches!(err, VectorError::CollectionUnavailable { name } if name == "_reserved"));
    }

    #[test]
    fn test_knowledge_failure_propagates() {
        let knowledge = CollectionManager::from_config(StorageConfig::new("knowledge", 0));
        let dual = DualCollectionManager::new(knowledge, None);
        assert!(dual.connect().is_err());
    }

    #[test]
    fn test_invalid_reflection_block_degrades() {
        for block in [
            StorageConfig::new("reflection", 0),
            StorageConfig::new("reflection", 3),
            StorageConfig::new("knowledge", 2),
        ] {
            let mut config = config_with_reflection(true);
            config.reflection = Some(block);

            let dual = DualCollectionManager::from_config(&config).unwrap();
            dual.connect().unwrap();
            assert!(dual.is_available(CollectionKind::Knowledge));
            assert!(!dual.is_available(CollectionKind::Reflection));

            let info = dual.info();
            assert!(info.reflection.enabled);
            assert!(!info.reflection.connected);
            assert!(info.reflection.error.is_some());
            assert!(matches!(
                dual.collection(CollectionKind::Reflection),
                Err(VectorError::CollectionUnavailable { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_knowledge_block_rejected() {
        let mut config = config_with_reflection(true);
        config.knowledge = StorageConfig::new("knowledge", 2).with_max_vectors(0);
        assert!(matches!(
            DualCollectionManager::from_config(&config),
            Err(VectorError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_disconnect_persists_both() {
        let dir = TempDir::new().unwrap();
        let config = MnemosConfig {
            reflection_enabled: true,
            knowledge: StorageConfig::new("knowledge", 2).with_persistence(dir.path()),
            reflection: Some(StorageConfig::new("reflection", 2).with_persistence(dir.path())),
            normalization: NormalizationConfig::default(),
        };

        let dual = DualCollectionManager::from_config(&config).unwrap();
        dual.connect().unwrap();
        dual.knowledge()
            .insert(&[vec![1.0, 0.0]], &["k".into()], &[Payload::new()])
            .unwrap();
        dual.collection(CollectionKind::Reflection)
            .unwrap()
            .insert(&[vec![0.0, 1.0]], &["r".into()], &[Payload::new()])
            .unwrap();
        dual.disconnect().unwrap();

        let reopened = DualCollectionManager::from_config(&config).unwrap();
        reopened.connect().unwrap();
        assert!(reopened.knowledge().get(&"k".into()).unwrap().is_some());
        let reflection = reopened.reflection().unwrap();
        assert!(reflection.get(&"r".into()).unwrap().is_some());
        assert!(reflection.get(&"k".into()).unwrap().is_none());
    }
}
