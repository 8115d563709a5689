//! Single-collection manager

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use mnemos_core::{
    AnnStats, CollectionInfo, Embedder, MetadataFilter, NormalizationConfig, Payload, RecordId,
    SearchResult, StorageConfig, VectorError, VectorRecord, VectorResult,
};
use mnemos_normalize::Normalizer;

use super::migration::{
    normalize_data, MigrationOptions, MigrationReport, FINGERPRINT_FIELD, NORMALIZED_TEXT_FIELD,
    TEXT_FIELD,
};
use crate::events::{emit_safely, Event, EventSink, TracingSink};
use crate::storage::{create_backend, StorageBackend};

/// Lifecycle and event layer over one storage backend
///
/// Every operation is forwarded to the backend; successful ones emit an
/// [`Event`]. Construct one per collection and pass it around; there is
/// no process-wide instance.
///
/// # Example
///
/// ```
/// use mnemos_core::{Payload, StorageConfig};
/// use mnemos_engine::manager::CollectionManager;
///
/// let manager = CollectionManager::from_config(StorageConfig::new("notes", 2));
/// manager.connect().unwrap();
/// manager
///     .insert(&[vec![1.0, 0.0]], &[1.into()], &[Payload::new()])
///     .unwrap();
/// let hits = manager.search(&[1.0, 0.0], 1, None).unwrap();
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Clone)]
pub struct CollectionManager {
    backend: Arc<dyn StorageBackend>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for CollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager").finish_non_exhaustive()
    }
}

impl CollectionManager {
    /// Wrap an existing backend; events go to [`TracingSink`]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        CollectionManager {
            backend,
            sink: Arc::new(TracingSink),
        }
    }

    /// Create the backend described by `config`
    pub fn from_config(config: StorageConfig) -> Self {
        Self::new(create_backend(config))
    }

    /// Send events to `sink` instead
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Underlying backend
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Collection name
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    fn emit(&self, event: Event) {
        emit_safely(self.sink.as_ref(), &event);
    }

    fn collection(&self) -> String {
        self.backend.name().to_string()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Connect the backend
    pub fn connect(&self) -> VectorResult<()> {
        let was_connected = self.backend.is_connected();
        self.backend.connect()?;
        if !was_connected {
            self.emit(Event::Connected {
                collection: self.collection(),
            });
        }
        Ok(())
    }

    /// Flush and disconnect the backend
    pub fn disconnect(&self) -> VectorResult<()> {
        let was_connected = self.backend.is_connected();
        self.backend.disconnect()?;
        if was_connected {
            self.emit(Event::Disconnected {
                collection: self.collection(),
            });
        }
        Ok(())
    }

    /// Whether the backend is connected
    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    /// Write state to disk
    pub fn flush(&self) -> VectorResult<()> {
        self.backend.flush()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert a batch
    pub fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[RecordId],
        payloads: &[Payload],
    ) -> VectorResult<()> {
        self.backend.insert(vectors, ids, payloads)?;
        self.emit(Event::Inserted {
            collection: self.collection(),
            count: ids.len(),
        });
        Ok(())
    }

    /// Normalize, embed and insert texts
    ///
    /// Each payload gets the raw text under `text`, the normalized text
    /// and the config fingerprint, so a later [`normalize`](Self::normalize)
    /// run starts from the raw text and skips records already current.
    pub fn insert_text(
        &self,
        ids: &[RecordId],
        texts: &[&str],
        payloads: &[Payload],
        embedder: &dyn Embedder,
        config: &NormalizationConfig,
    ) -> VectorResult<()> {
        if texts.len() != ids.len() {
            return Err(VectorError::LengthMismatch {
                field: "texts",
                expected: ids.len(),
                got: texts.len(),
            });
        }
        if payloads.len() != ids.len() {
            return Err(VectorError::LengthMismatch {
                field: "payloads",
                expected: ids.len(),
                got: payloads.len(),
            });
        }

        let normalizer = Normalizer::new(config.clone());
        let mut vectors = Vec::with_capacity(texts.len());
        let mut enriched = Vec::with_capacity(texts.len());
        for (text, payload) in texts.iter().zip(payloads) {
            let normalized = normalizer.normalize(text);
            vectors.push(embedder.embed(&normalized)?);

            let mut payload = payload.clone();
            payload.insert(TEXT_FIELD.to_string(), JsonValue::String(text.to_string()));
            payload.insert(NORMALIZED_TEXT_FIELD.to_string(), JsonValue::String(normalized));
            payload.insert(
                FINGERPRINT_FIELD.to_string(),
                JsonValue::String(normalizer.fingerprint().to_string()),
            );
            enriched.push(payload);
        }
        debug!(
            target: "mnemos::manager",
            collection = self.name(),
            count = ids.len(),
            "Texts embedded"
        );
        self.insert(&vectors, ids, &enriched)
    }

    /// Replace vector and payload of an existing record
    pub fn update(&self, id: &RecordId, vector: &[f32], payload: Payload) -> VectorResult<()> {
        self.backend.update(id, vector, payload)?;
        self.emit(Event::Updated {
            collection: self.collection(),
            id: id.clone(),
        });
        Ok(())
    }

    /// Delete a record; returns whether it existed
    pub fn delete(&self, id: &RecordId) -> VectorResult<bool> {
        let existed = self.backend.delete(id)?;
        self.emit(Event::Deleted {
            collection: self.collection(),
            id: id.clone(),
            existed,
        });
        Ok(existed)
    }

    /// Record by id
    pub fn get(&self, id: &RecordId) -> VectorResult<Option<VectorRecord>> {
        self.backend.get(id)
    }

    /// Filtered similarity search
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<SearchResult>> {
        let results = self.backend.search(query, k, filter)?;
        self.emit(Event::Searched {
            collection: self.collection(),
            k,
            results: results.len(),
        });
        Ok(results)
    }

    /// Matching records and the total match count
    pub fn list(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> VectorResult<(Vec<VectorRecord>, usize)> {
        self.backend.list(filter, limit)
    }

    /// Remove all records and persisted files
    pub fn delete_collection(&self) -> VectorResult<()> {
        self.backend.delete_collection()?;
        info!(target: "mnemos::manager", collection = self.name(), "Collection emptied");
        Ok(())
    }

    /// Configuration and state snapshot
    pub fn info(&self) -> CollectionInfo {
        self.backend.info()
    }

    /// ANN statistics (enhanced backends only)
    pub fn ann_stats(&self) -> VectorResult<Option<AnnStats>> {
        self.backend.ann_stats()
    }

    /// Re-normalize and re-embed every stored record
    ///
    /// See [`normalize_data`]. Emits `normalized` unless the run failed
    /// fast on missing inputs.
    pub fn normalize(
        &self,
        embedder: Option<&dyn Embedder>,
        config: Option<&NormalizationConfig>,
        options: &MigrationOptions,
    ) -> MigrationReport {
        let inputs_present = embedder.is_some() && config.is_some();
        let report = normalize_data(self.backend.as_ref(), embedder, config, options);
        if inputs_present {
            self.emit(Event::Normalized {
                collection: self.collection(),
                processed: report.processed,
                skipped: report.skipped,
                status: report.status,
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use crate::manager::MigrationStatus;
    use serde_json::json;

    struct LengthEmbedder;

    impl Embedder for LengthEmbedder {
        fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn manager() -> (CollectionManager, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let manager = CollectionManager::from_config(StorageConfig::new("knowledge", 2))
            .with_sink(sink.clone());
        manager.connect().unwrap();
        (manager, sink)
    }

    #[test]
    fn test_events_follow_operations() {
        let (manager, sink) = manager();
        manager
            .insert(&[vec![1.0, 0.0]], &[1.into()], &[Payload::new()])
            .unwrap();
        manager.update(&1.into(), &[0.0, 1.0], Payload::new()).unwrap();
        manager.search(&[0.0, 1.0], 3, None).unwrap();
        manager.delete(&1.into()).unwrap();
        manager.disconnect().unwrap();

        assert_eq!(
            sink.names(),
            vec!["connected", "inserted", "updated", "searched", "deleted", "disconnected"]
        );
    }

    #[test]
    fn test_failed_operation_emits_nothing() {
        let (manager, sink) = manager();
        sink.clear();
        assert!(manager
            .insert(&[vec![1.0, 0.0, 0.0]], &[1.into()], &[Payload::new()])
            .is_err());
        assert!(manager.update(&9.into(), &[1.0, 0.0], Payload::new()).is_err());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_connect_twice_emits_once() {
        let (manager, sink) = manager();
        manager.connect().unwrap();
        assert_eq!(sink.names(), vec!["connected"]);
    }

    #[test]
    fn test_insert_text_stores_normalization_fields() {
        let (manager, _sink) = manager();
        let config = NormalizationConfig::default();
        let mut payload = Payload::new();
        payload.insert("kind".into(), json!("fact"));

        manager
            .insert_text(&["n1".into()], &["Hello,   World!"], &[payload], &LengthEmbedder, &config)
            .unwrap();

        let record = manager.get(&"n1".into()).unwrap().unwrap();
        assert_eq!(record.payload["kind"], json!("fact"));
        assert_eq!(record.payload["text"], json!("Hello,   World!"));
        assert_eq!(record.payload[NORMALIZED_TEXT_FIELD], json!("hello world"));
        assert_eq!(record.vector, vec![11.0, 1.0]);

        // already current: a migration has nothing to do
        let report = manager.normalize(
            Some(&LengthEmbedder),
            Some(&config),
            &MigrationOptions::default(),
        );
        assert_eq!(report.status, MigrationStatus::Success);
        assert_eq!((report.processed, report.skipped), (0, 1));
    }

    #[test]
    fn test_insert_text_length_mismatch() {
        let (manager, _sink) = manager();
        let err = manager
            .insert_text(
                &[1.into(), 2.into()],
                &["only one"],
                &[Payload::new(), Payload::new()],
                &LengthEmbedder,
                &NormalizationConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, VectorError::LengthMismatch { field: "texts", .. }));
    }

    #[test]
    fn test_normalize_emits_event() {
        let (manager, sink) = manager();
        sink.clear();
        let config = NormalizationConfig::default();

        manager.normalize(None, Some(&config), &MigrationOptions::default());
        assert!(sink.events().is_empty());

        manager.normalize(Some(&LengthEmbedder), Some(&config), &MigrationOptions::default());
        assert_eq!(sink.names(), vec!["normalized"]);
    }
}
