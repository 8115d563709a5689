//! Storage backend trait and the generic backend over [`CollectionStore`]
//!
//! The two variants differ only in which filters they accept and whether
//! they expose ANN statistics; both are [`CollectionBackend`]
//! parameterized by a [`FilterSupport`] policy.

use std::marker::PhantomData;

use mnemos_core::{
    AnnStats, BackendKind, CollectionInfo, MetadataFilter, Payload, RecordId, SearchResult,
    StorageConfig, VectorResult, VectorRecord,
};

use super::collection::CollectionStore;

/// Operations every storage backend provides
///
/// Implementations are thread-safe; every method takes `&self`.
pub trait StorageBackend: Send + Sync {
    /// Backend variant
    fn kind(&self) -> BackendKind;

    /// Collection name
    fn name(&self) -> &str;

    /// Collection configuration
    fn config(&self) -> &StorageConfig;

    /// Validate config and load persisted state; no-op when connected
    fn connect(&self) -> VectorResult<()>;

    /// Whether the backend is connected
    fn is_connected(&self) -> bool;

    /// Insert a batch; ids already present are overwritten
    fn insert(&self, vectors: &[Vec<f32>], ids: &[RecordId], payloads: &[Payload])
        -> VectorResult<()>;

    /// Replace vector and payload of an existing record
    fn update(&self, id: &RecordId, vector: &[f32], payload: Payload) -> VectorResult<()>;

    /// Delete a record; returns whether it existed
    fn delete(&self, id: &RecordId) -> VectorResult<bool>;

    /// Record by id
    fn get(&self, id: &RecordId) -> VectorResult<Option<VectorRecord>>;

    /// Top `k` records by cosine similarity among those matching `filter`
    fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<SearchResult>>;

    /// Matching records in insertion order and the total match count
    fn list(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> VectorResult<(Vec<VectorRecord>, usize)>;

    /// All record ids in insertion order
    fn ids(&self) -> VectorResult<Vec<RecordId>>;

    /// Remove all records and persisted files
    fn delete_collection(&self) -> VectorResult<()>;

    /// Write state to disk (no-op without persistence)
    fn flush(&self) -> VectorResult<()>;

    /// Flush and disconnect
    fn disconnect(&self) -> VectorResult<()>;

    /// Configuration and state snapshot
    fn info(&self) -> CollectionInfo;

    /// ANN statistics, when the backend exposes them
    fn ann_stats(&self) -> VectorResult<Option<AnnStats>> {
        Ok(None)
    }
}

/// Filter policy of a backend variant
pub trait FilterSupport: Send + Sync + 'static {
    /// Variant served by this policy
    const KIND: BackendKind;

    /// Whether `ann_stats` reports index statistics
    const ANN_STATS: bool;

    /// Reject filters this variant cannot evaluate
    fn check(filter: &MetadataFilter) -> VectorResult<()>;
}

/// Storage backend over one [`CollectionStore`]
pub struct CollectionBackend<F: FilterSupport> {
    store: CollectionStore,
    _policy: PhantomData<fn() -> F>,
}

impl<F: FilterSupport> CollectionBackend<F> {
    /// Create a disconnected backend
    pub fn new(config: StorageConfig) -> Self {
        CollectionBackend {
            store: CollectionStore::new(config, F::KIND),
            _policy: PhantomData,
        }
    }

    fn check_filter(filter: Option<&MetadataFilter>) -> VectorResult<()> {
        match filter {
            Some(f) => F::check(f),
            None => Ok(()),
        }
    }
}

impl<F: FilterSupport> StorageBackend for CollectionBackend<F> {
    fn kind(&self) -> BackendKind {
        F::KIND
    }

    fn name(&self) -> &str {
        self.store.name()
    }

    fn config(&self) -> &StorageConfig {
        self.store.config()
    }

    fn connect(&self) -> VectorResult<()> {
        self.store.connect()
    }

    fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[RecordId],
        payloads: &[Payload],
    ) -> VectorResult<()> {
        self.store.insert(vectors, ids, payloads)
    }

    fn update(&self, id: &RecordId, vector: &[f32], payload: Payload) -> VectorResult<()> {
        self.store.update(id, vector, payload)
    }

    fn delete(&self, id: &RecordId) -> VectorResult<bool> {
        self.store.delete(id)
    }

    fn get(&self, id: &RecordId) -> VectorResult<Option<VectorRecord>> {
        self.store.get(id)
    }

    fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<SearchResult>> {
        Self::check_filter(filter)?;
        self.store.search(query, k, filter)
    }

    fn list(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> VectorResult<(Vec<VectorRecord>, usize)> {
        Self::check_filter(filter)?;
        self.store.list(filter, limit)
    }

    fn ids(&self) -> VectorResult<Vec<RecordId>> {
        self.store.ids()
    }

    fn delete_collection(&self) -> VectorResult<()> {
        self.store.delete_collection()
    }

    fn flush(&self) -> VectorResult<()> {
        self.store.flush()
    }

    fn disconnect(&self) -> VectorResult<()> {
        self.store.disconnect()
    }

    fn info(&self) -> CollectionInfo {
        self.store.info()
    }

    fn ann_stats(&self) -> VectorResult<Option<AnnStats>> {
        if F::ANN_STATS {
            self.store.ann_stats().map(Some)
        } else {
            Ok(None)
        }
    }
}
