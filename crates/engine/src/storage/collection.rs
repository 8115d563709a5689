//! Collection store: the state shared by every storage backend variant
//!
//! One [`CollectionStore`] couples an [`AnnIndex`] with the payload map,
//! and enforces connection state, dimension and capacity.
//!
//! ## Locking
//!
//! `state` guards all in-memory data; capacity check + mutation and
//! filter + search each run under one lock acquisition. Persistence
//! happens after the mutation commits: the snapshot is captured under
//! `state`, then written under `writer`, which remembers the last written
//! generation so an older snapshot never overwrites a newer one. Lock
//! order is always `state` before `writer`.

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use mnemos_core::{
    AnnStats, BackendKind, CollectionInfo, MetadataFilter, Payload, RecordId, SearchResult,
    StorageConfig, VectorError, VectorRecord, VectorResult,
};

use super::persistence::{CollectionLayout, LoadOutcome, PersistedState};
use crate::ann::distance::validate_vector;
use crate::ann::{AnnConfig, AnnIndex};

/// Validate a collection name
///
/// The name doubles as a directory name under `persistence_path`.
///
/// # Validation Rules
/// - Cannot be empty
/// - Cannot exceed 256 characters
/// - Cannot contain '/', '\\' or null bytes
/// - Cannot be "." or ".."
/// - Cannot start with '_' (reserved)
pub fn validate_collection_name(name: &str) -> VectorResult<()> {
    let invalid = |reason: &str| {
        Err(VectorError::InvalidCollectionName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("Collection name cannot be empty");
    }
    if name.len() > 256 {
        return invalid("Collection name cannot exceed 256 characters");
    }
    if name.contains('/') || name.contains('\\') {
        return invalid("Collection name cannot contain path separators");
    }
    if name.contains('\0') {
        return invalid("Collection name cannot contain null bytes");
    }
    if name == "." || name == ".." {
        return invalid("Collection name cannot be a relative path component");
    }
    if name.starts_with('_') {
        return invalid("Collection names starting with '_' are reserved");
    }
    Ok(())
}

struct State {
    connected: bool,
    index: AnnIndex,
    payloads: rustc_hash::FxHashMap<RecordId, Payload>,
    /// Bumped on every mutation
    generation: u64,
}

struct PendingWrite {
    generation: u64,
    state: PersistedState,
}

/// In-memory collection with optional persistence
pub struct CollectionStore {
    config: StorageConfig,
    kind: BackendKind,
    layout: Option<CollectionLayout>,
    state: Mutex<State>,
    /// Last generation written to disk
    writer: Mutex<u64>,
}

impl CollectionStore {
    /// Create a disconnected store for `config`
    pub fn new(config: StorageConfig, kind: BackendKind) -> Self {
        let layout = config
            .persist_index
            .then(|| CollectionLayout::for_config(&config));
        CollectionStore {
            config,
            kind,
            layout,
            state: Mutex::new(State {
                connected: false,
                index: AnnIndex::new(),
                payloads: Default::default(),
                generation: 0,
            }),
            writer: Mutex::new(0),
        }
    }

    /// Collection configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.config.collection_name
    }

    fn ensure_connected(&self, state: &State) -> VectorResult<()> {
        if state.connected {
            Ok(())
        } else {
            Err(VectorError::NotConnected {
                collection: self.config.collection_name.clone(),
            })
        }
    }

    fn check_vector(&self, vector: &[f32]) -> VectorResult<()> {
        validate_vector(self.config.dimension, vector)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Validate config, initialize the index and load persisted state
    pub fn connect(&self) -> VectorResult<()> {
        self.config.validate()?;
        validate_collection_name(&self.config.collection_name)?;

        let mut state = self.state.lock();
        if state.connected {
            return Ok(());
        }
        state.index.initialize(AnnConfig::from(&self.config))?;
        state.payloads.clear();

        if let Some(layout) = &self.layout {
            match layout.load() {
                LoadOutcome::Missing => {
                    debug!(target: "mnemos::storage", collection = self.name(), "No persisted state")
                }
                LoadOutcome::Corrupt(e) => warn!(
                    target: "mnemos::storage",
                    collection = self.name(),
                    error = %e,
                    "Persisted state unreadable, starting empty"
                ),
                LoadOutcome::Loaded(persisted) => self.restore(&mut state, persisted),
            }
        }
        state.connected = true;

        info!(
            target: "mnemos::storage",
            collection = self.name(),
            backend = self.kind.name(),
            dimension = self.config.dimension,
            vectors = state.index.len(),
            persistence = self.layout.is_some(),
            "Collection connected"
        );
        Ok(())
    }

    fn restore(&self, state: &mut State, persisted: PersistedState) {
        match state.index.restore(persisted.snapshot, &persisted.index_bytes) {
            Ok(count) => {
                let mut payloads: rustc_hash::FxHashMap<RecordId, Payload> =
                    persisted.payloads.into_iter().collect();
                let ids: Vec<RecordId> = state.index.ids().cloned().collect();
                for id in ids {
                    let payload = payloads.remove(&id).unwrap_or_default();
                    state.payloads.insert(id, payload);
                }
                if count > self.config.max_vectors {
                    warn!(
                        target: "mnemos::storage",
                        collection = self.name(),
                        vectors = count,
                        max_vectors = self.config.max_vectors,
                        "Persisted collection exceeds max_vectors, inserts will fail"
                    );
                }
            }
            Err(e) => {
                warn!(
                    target: "mnemos::storage",
                    collection = self.name(),
                    error = %e,
                    "Persisted vectors rejected, starting empty"
                );
                // Still initialized; clear cannot fail here
                let _ = state.index.clear();
            }
        }
    }

    /// Flush (when persistent) and disconnect
    ///
    /// A flush failure is returned and leaves the store connected.
    pub fn disconnect(&self) -> VectorResult<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Ok(());
        }
        self.flush_locked(&state)?;
        state.index.disconnect();
        state.payloads.clear();
        state.connected = false;
        info!(target: "mnemos::storage", collection = self.name(), "Collection disconnected");
        Ok(())
    }

    /// Whether the store is connected
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn capture(&self, state: &State) -> Option<PendingWrite> {
        self.layout.as_ref()?;
        let snapshot = state.index.snapshot().ok()?;
        let index_bytes = state.index.index_bytes().ok()?;
        let payloads = state
            .index
            .ids()
            .map(|id| {
                let payload = state.payloads.get(id).cloned().unwrap_or_default();
                (id.clone(), payload)
            })
            .collect();
        Some(PendingWrite {
            generation: state.generation,
            state: PersistedState {
                snapshot,
                index_bytes,
                payloads,
            },
        })
    }

    /// Record a committed mutation and capture it for writing
    fn commit(&self, state: &mut State) -> Option<PendingWrite> {
        state.generation += 1;
        self.capture(state)
    }

    /// Best-effort write after a mutation; failures are logged
    fn write_behind(&self, pending: Option<PendingWrite>) {
        let (Some(pending), Some(layout)) = (pending, &self.layout) else {
            return;
        };
        let mut last_written = self.writer.lock();
        if pending.generation <= *last_written {
            return;
        }
        match layout.save(&pending.state) {
            Ok(()) => *last_written = pending.generation,
            Err(e) => warn!(
                target: "mnemos::storage",
                collection = self.name(),
                error = %e,
                "Background persistence failed, state kept in memory"
            ),
        }
    }

    fn flush_locked(&self, state: &State) -> VectorResult<()> {
        let (Some(pending), Some(layout)) = (self.capture(state), &self.layout) else {
            return Ok(());
        };
        let mut last_written = self.writer.lock();
        if pending.generation < *last_written {
            return Ok(());
        }
        layout.save(&pending.state)?;
        *last_written = pending.generation;
        debug!(
            target: "mnemos::storage",
            collection = self.name(),
            vectors = pending.state.snapshot.vector_count,
            "Collection flushed"
        );
        Ok(())
    }

    /// Write current state to disk; errors propagate
    pub fn flush(&self) -> VectorResult<()> {
        let state = self.state.lock();
        self.ensure_connected(&state)?;
        self.flush_locked(&state)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a batch; all-or-nothing
    pub fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[RecordId],
        payloads: &[Payload],
    ) -> VectorResult<()> {
        let pending = {
            let mut state = self.state.lock();
            self.ensure_connected(&state)?;

            if ids.len() != vectors.len() {
                return Err(VectorError::LengthMismatch {
                    field: "ids",
                    expected: vectors.len(),
                    got: ids.len(),
                });
            }
            if payloads.len() != vectors.len() {
                return Err(VectorError::LengthMismatch {
                    field: "payloads",
                    expected: vectors.len(),
                    got: payloads.len(),
                });
            }
            for vector in vectors {
                self.check_vector(vector)?;
            }

            let mut seen = FxHashSet::default();
            let new_records = ids
                .iter()
                .filter(|id| !state.index.contains(id) && seen.insert(*id))
                .count();
            let current = state.index.len();
            if current + new_records > self.config.max_vectors {
                return Err(VectorError::CapacityExceeded {
                    collection: self.config.collection_name.clone(),
                    limit: self.config.max_vectors,
                    current,
                    requested: new_records,
                });
            }

            state.index.add_vectors(vectors, ids)?;
            for (id, payload) in ids.iter().zip(payloads) {
                state.payloads.insert(id.clone(), payload.clone());
            }
            debug!(
                target: "mnemos::storage",
                collection = self.name(),
                count = ids.len(),
                new_records,
                total = state.index.len(),
                "Records inserted"
            );
            self.commit(&mut state)
        };
        self.write_behind(pending);
        Ok(())
    }

    /// Replace vector and payload of an existing record
    pub fn update(&self, id: &RecordId, vector: &[f32], payload: Payload) -> VectorResult<()> {
        let pending = {
            let mut state = self.state.lock();
            self.ensure_connected(&state)?;
            self.check_vector(vector)?;
            if !state.index.contains(id) {
                return Err(VectorError::NotFound { id: id.clone() });
            }

            state
                .index
                .add_vectors(&[vector.to_vec()], std::slice::from_ref(id))?;
            state.payloads.insert(id.clone(), payload);
            debug!(target: "mnemos::storage", collection = self.name(), id = %id, "Record updated");
            self.commit(&mut state)
        };
        self.write_behind(pending);
        Ok(())
    }

    /// Delete a record; returns whether it existed
    pub fn delete(&self, id: &RecordId) -> VectorResult<bool> {
        let pending = {
            let mut state = self.state.lock();
            self.ensure_connected(&state)?;
            if !state.index.contains(id) {
                return Ok(false);
            }
            state.index.remove_vectors(std::slice::from_ref(id))?;
            state.payloads.remove(id);
            debug!(target: "mnemos::storage", collection = self.name(), id = %id, "Record deleted");
            self.commit(&mut state)
        };
        self.write_behind(pending);
        Ok(true)
    }

    /// Remove every record and the persisted files
    ///
    /// The store stays connected and empty. Failure to remove files is
    /// logged.
    pub fn delete_collection(&self) -> VectorResult<()> {
        let mut state = self.state.lock();
        self.ensure_connected(&state)?;
        state.index.clear()?;
        state.payloads.clear();
        state.generation += 1;

        if let Some(layout) = &self.layout {
            let mut last_written = self.writer.lock();
            if let Err(e) = layout.remove() {
                warn!(
                    target: "mnemos::storage",
                    collection = self.name(),
                    error = %e,
                    "Failed to remove persisted files"
                );
            }
            *last_written = state.generation;
        }
        info!(target: "mnemos::storage", collection = self.name(), "Collection deleted");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Record by id; `None` when absent
    pub fn get(&self, id: &RecordId) -> VectorResult<Option<VectorRecord>> {
        let state = self.state.lock();
        self.ensure_connected(&state)?;
        Ok(state.index.vector(id).map(|vector| VectorRecord {
            id: id.clone(),
            vector: vector.to_vec(),
            payload: state.payloads.get(id).cloned().unwrap_or_default(),
        }))
    }

    /// Filter, then search the filtered set
    ///
    /// The caller has already checked the filter is supported.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<SearchResult>> {
        let mut state = self.state.lock();
        self.ensure_connected(&state)?;
        self.check_vector(query)?;

        let restrict_to: Option<FxHashSet<RecordId>> =
            filter.filter(|f| !f.is_empty()).map(|f| {
                state
                    .payloads
                    .iter()
                    .filter(|(_, payload)| f.matches(payload))
                    .map(|(id, _)| id.clone())
                    .collect()
            });

        let hits = state.index.search(query, k, restrict_to.as_ref())?;
        let results = hits
            .into_iter()
            .map(|(id, score)| {
                let payload = state.payloads.get(&id).cloned().unwrap_or_default();
                SearchResult { id, score, payload }
            })
            .collect();
        Ok(results)
    }

    /// Matching records in insertion order, with the total match count
    pub fn list(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> VectorResult<(Vec<VectorRecord>, usize)> {
        let state = self.state.lock();
        self.ensure_connected(&state)?;

        let limit = limit.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        let mut total = 0usize;
        for id in state.index.ids() {
            let payload = state.payloads.get(id);
            let matches = match (filter, payload) {
                (Some(f), Some(p)) => f.matches(p),
                (Some(f), None) => f.is_empty(),
                (None, _) => true,
            };
            if !matches {
                continue;
            }
            total += 1;
            if records.len() < limit {
                if let Some(vector) = state.index.vector(id) {
                    records.push(VectorRecord {
                        id: id.clone(),
                        vector: vector.to_vec(),
                        payload: payload.cloned().unwrap_or_default(),
                    });
                }
            }
        }
        Ok((records, total))
    }

    /// All ids in insertion order
    pub fn ids(&self) -> VectorResult<Vec<RecordId>> {
        let state = self.state.lock();
        self.ensure_connected(&state)?;
        Ok(state.index.ids().cloned().collect())
    }

    /// Configuration and state snapshot
    pub fn info(&self) -> CollectionInfo {
        let state = self.state.lock();
        CollectionInfo {
            name: self.config.collection_name.clone(),
            backend: self.kind,
            dimension: self.config.dimension,
            max_vectors: self.config.max_vectors,
            vector_count: state.index.len(),
            connected: state.connected,
            persistence_enabled: self.layout.is_some(),
            algorithm: self.config.algorithm,
        }
    }

    /// ANN statistics
    pub fn ann_stats(&self) -> VectorResult<AnnStats> {
        let state = self.state.lock();
        self.ensure_connected(&state)?;
        state.index.stats()
    }
}
