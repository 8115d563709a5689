//! AnnIndex: nearest-neighbour search over one collection's vectors
//!
//! Maps caller [`RecordId`]s onto internal [`VectorId`]s, owns the vector
//! heap, and picks the search path per query:
//!
//! - below `min_dataset_size` vectors, brute force always answers;
//! - at or above it, the accelerated backend answers if one was loaded
//!   at initialize time. Its structure is built lazily the first time
//!   the threshold is crossed.
//!
//! A failure to load or build the accelerated backend never fails the
//! caller: the index falls back to brute force and records why in
//! [`AnnStats::fallback_reason`].

use std::collections::BTreeMap;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mnemos_core::{
    Algorithm, AnnStats, RecordId, SearchMetrics, StorageConfig, VectorError, VectorResult,
};

use super::backend::{IndexBackendFactory, Probe, VectorIndexBackend};
use super::brute_force::BruteForceBackend;
use super::distance::validate_vector;
use super::heap::{VectorHeap, VectorId};

/// Index configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnConfig {
    /// Vector dimension, must be positive
    pub dimension: usize,
    /// Requested algorithm
    pub algorithm: Algorithm,
    /// Vector count at which the accelerated path takes over
    pub min_dataset_size: usize,
}

impl AnnConfig {
    /// Brute-force config for `dimension`
    pub fn new(dimension: usize) -> Self {
        AnnConfig {
            dimension,
            algorithm: Algorithm::BruteForce,
            min_dataset_size: 0,
        }
    }

    /// Request `algorithm` from `min_dataset_size` vectors on
    pub fn with_algorithm(mut self, algorithm: Algorithm, min_dataset_size: usize) -> Self {
        self.algorithm = algorithm;
        self.min_dataset_size = min_dataset_size;
        self
    }
}

impl From<&StorageConfig> for AnnConfig {
    fn from(config: &StorageConfig) -> Self {
        AnnConfig {
            dimension: config.dimension,
            algorithm: config.algorithm,
            min_dataset_size: config.min_dataset_size_for_acceleration,
        }
    }
}

/// Persisted index state (`ann_metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnSnapshot {
    /// Vector dimension
    pub dimension: usize,
    /// Configured algorithm
    pub algorithm: Algorithm,
    /// Number of entries in `vectors`
    pub vector_count: usize,
    /// Whether an accelerated backend was loaded when saved
    pub accelerated_available: bool,
    /// `[id, vector]` pairs in insertion order
    pub vectors: Vec<(RecordId, Vec<f32>)>,
}

/// Live state between `initialize` and `disconnect`
struct Ready {
    config: AnnConfig,
    heap: VectorHeap,
    by_record: FxHashMap<RecordId, VectorId>,
    by_vector: BTreeMap<VectorId, RecordId>,
    exact: BruteForceBackend,
    accelerated: Option<Box<dyn VectorIndexBackend>>,
    accelerated_built: bool,
    fallback_reason: Option<String>,
    build_time_ms: Option<f64>,
    last_search: Option<SearchMetrics>,
}

impl Ready {
    fn uses_accelerated_path(&self) -> bool {
        self.accelerated.is_some()
            && self.accelerated_built
            && self.heap.len() >= self.config.min_dataset_size
    }

    /// Build the accelerated structure once the threshold is reached
    fn maybe_build(&mut self) {
        if self.accelerated_built || self.heap.len() < self.config.min_dataset_size {
            return;
        }
        let Some(backend) = self.accelerated.as_mut() else {
            return;
        };

        let start = Instant::now();
        match backend.build(&self.heap) {
            Ok(()) => {
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                self.accelerated_built = true;
                self.build_time_ms = Some(elapsed);
                info!(
                    target: "mnemos::ann",
                    backend = backend.name(),
                    vectors = self.heap.len(),
                    build_time_ms = elapsed,
                    "Accelerated index built"
                );
            }
            Err(e) => {
                warn!(
                    target: "mnemos::ann",
                    backend = backend.name(),
                    error = %e,
                    "Accelerated index build failed, falling back to brute force"
                );
                self.fallback_reason = Some(format!("build failed: {}", e));
                self.accelerated = None;
            }
        }
    }

    fn check_vector(&self, vector: &[f32]) -> VectorResult<()> {
        validate_vector(self.config.dimension, vector)
    }
}

/// Nearest-neighbour index for one collection
///
/// # Example
///
/// ```
/// use mnemos_core::RecordId;
/// use mnemos_engine::ann::{AnnConfig, AnnIndex};
///
/// let mut index = AnnIndex::new();
/// index.initialize(AnnConfig::new(2)).unwrap();
/// index
///     .add_vectors(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[1.into(), 2.into()])
///     .unwrap();
///
/// let hits = index.search(&[1.0, 0.1], 1, None).unwrap();
/// assert_eq!(hits[0].0, RecordId::Int(1));
/// ```
#[derive(Default)]
pub struct AnnIndex {
    state: Option<Ready>,
    factory: IndexBackendFactory,
}

impl AnnIndex {
    /// Create an uninitialized index
    pub fn new() -> Self {
        AnnIndex::default()
    }

    /// Whether `initialize` has run (and `disconnect` has not)
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn ready(&self) -> VectorResult<&Ready> {
        self.state.as_ref().ok_or(VectorError::NotInitialized)
    }

    fn ready_mut(&mut self) -> VectorResult<&mut Ready> {
        self.state.as_mut().ok_or(VectorError::NotInitialized)
    }

    /// Validate `config`, probe acceleration and enter the ready state
    ///
    /// Re-initializing drops any indexed vectors.
    pub fn initialize(&mut self, config: AnnConfig) -> VectorResult<()> {
        if config.dimension == 0 {
            return Err(VectorError::InvalidConfiguration(
                "dimension must be positive".to_string(),
            ));
        }

        let (accelerated, fallback_reason) =
            match self.factory.probe(config.algorithm, config.dimension) {
                Probe::Accelerated(backend) => (Some(backend), None),
                Probe::BruteForceOnly(reason) => (None, reason),
            };
        if let Some(reason) = &fallback_reason {
            warn!(
                target: "mnemos::ann",
                algorithm = config.algorithm.name(),
                reason = %reason,
                "Accelerated backend unavailable, using brute force"
            );
        }

        info!(
            target: "mnemos::ann",
            dimension = config.dimension,
            algorithm = config.algorithm.name(),
            accelerated = accelerated.is_some(),
            min_dataset_size = config.min_dataset_size,
            "Index initialized"
        );

        self.state = Some(Ready {
            heap: VectorHeap::new(config.dimension),
            config,
            by_record: FxHashMap::default(),
            by_vector: BTreeMap::new(),
            exact: BruteForceBackend::new(),
            accelerated,
            accelerated_built: false,
            fallback_reason,
            build_time_ms: None,
            last_search: None,
        });
        Ok(())
    }

    /// Add vectors under `ids`
    ///
    /// The whole batch is validated before anything is added. An id that
    /// is already indexed is overwritten and keeps its position; within
    /// one batch the last occurrence wins.
    pub fn add_vectors(&mut self, vectors: &[Vec<f32>], ids: &[RecordId]) -> VectorResult<()> {
        let ready = self.ready_mut()?;
        if vectors.len() != ids.len() {
            return Err(VectorError::LengthMismatch {
                field: "ids",
                expected: vectors.len(),
                got: ids.len(),
            });
        }
        for vector in vectors {
            ready.check_vector(vector)?;
        }

        for (vector, id) in vectors.iter().zip(ids) {
            let vid = match ready.by_record.get(id) {
                Some(&vid) => {
                    ready.heap.upsert(vid, vector)?;
                    vid
                }
                None => {
                    let vid = ready.heap.insert(vector)?;
                    ready.by_record.insert(id.clone(), vid);
                    ready.by_vector.insert(vid, id.clone());
                    vid
                }
            };
            if ready.accelerated_built {
                if let Some(backend) = ready.accelerated.as_mut() {
                    backend.insert(vid, vector);
                }
            }
        }
        ready.maybe_build();

        debug!(target: "mnemos::ann", count = vectors.len(), total = ready.heap.len(), "Vectors added");
        Ok(())
    }

    /// Remove vectors; unknown ids are ignored
    pub fn remove_vectors(&mut self, ids: &[RecordId]) -> VectorResult<()> {
        let ready = self.ready_mut()?;
        let mut removed = 0usize;
        for id in ids {
            if let Some(vid) = ready.by_record.remove(id) {
                ready.by_vector.remove(&vid);
                ready.heap.delete(vid);
                if let Some(backend) = ready.accelerated.as_mut() {
                    backend.delete(vid);
                }
                removed += 1;
            }
        }
        debug!(target: "mnemos::ann", requested = ids.len(), removed, "Vectors removed");
        Ok(())
    }

    /// Top `k` records by cosine similarity
    ///
    /// `restrict_to` limits the search to the given ids. Ties keep
    /// insertion order. `k == 0` or nothing eligible returns an empty
    /// result.
    pub fn search(
        &mut self,
        query: &[f32],
        k: usize,
        restrict_to: Option<&FxHashSet<RecordId>>,
    ) -> VectorResult<Vec<(RecordId, f32)>> {
        let ready = self.ready_mut()?;
        ready.check_vector(query)?;

        let start = Instant::now();
        let eligible_ids: Option<FxHashSet<VectorId>> = restrict_to.map(|ids| {
            ids.iter()
                .filter_map(|id| ready.by_record.get(id).copied())
                .collect()
        });
        let eligible = eligible_ids.as_ref().map(|set| move |vid: VectorId| set.contains(&vid));
        let eligible_ref = eligible
            .as_ref()
            .map(|f| f as &(dyn Fn(VectorId) -> bool + Sync));

        let accelerated_path = ready.uses_accelerated_path();
        let hits = match (&ready.accelerated, accelerated_path) {
            (Some(backend), true) => backend.search(&ready.heap, query, k, eligible_ref),
            _ => ready.exact.search(&ready.heap, query, k, eligible_ref),
        };

        let results: Vec<(RecordId, f32)> = hits
            .into_iter()
            .filter_map(|(vid, score)| ready.by_vector.get(&vid).map(|id| (id.clone(), score)))
            .collect();

        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        ready.last_search = Some(SearchMetrics {
            query_time_ms: elapsed,
            result_count: results.len(),
            from_accelerated_path: accelerated_path,
        });
        debug!(
            target: "mnemos::ann",
            k,
            results = results.len(),
            accelerated = accelerated_path,
            query_time_ms = elapsed,
            "Search completed"
        );
        Ok(results)
    }

    /// Remove every vector and reset stats; stays initialized
    pub fn clear(&mut self) -> VectorResult<()> {
        let ready = self.ready_mut()?;
        ready.heap.clear();
        ready.by_record.clear();
        ready.by_vector.clear();
        if let Some(backend) = ready.accelerated.as_mut() {
            backend.clear();
        }
        ready.accelerated_built = false;
        ready.build_time_ms = None;
        ready.last_search = None;
        debug!(target: "mnemos::ann", "Index cleared");
        Ok(())
    }

    /// Release everything; later calls fail with `NotInitialized`
    pub fn disconnect(&mut self) {
        if self.state.take().is_some() {
            debug!(target: "mnemos::ann", "Index disconnected");
        }
    }

    /// Current statistics
    pub fn stats(&self) -> VectorResult<AnnStats> {
        let ready = self.ready()?;
        Ok(AnnStats {
            algorithm: ready.config.algorithm,
            vector_count: ready.heap.len(),
            using_accelerated_path: ready.uses_accelerated_path(),
            accelerated_available: ready.accelerated.is_some(),
            fallback_reason: ready.fallback_reason.clone(),
            last_search: ready.last_search.clone(),
            build_time_ms: ready.build_time_ms,
        })
    }

    /// Number of indexed vectors (0 when uninitialized)
    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, |ready| ready.heap.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is indexed
    pub fn contains(&self, id: &RecordId) -> bool {
        self.state
            .as_ref()
            .map_or(false, |ready| ready.by_record.contains_key(id))
    }

    /// Stored vector for `id`
    pub fn vector(&self, id: &RecordId) -> Option<&[f32]> {
        let ready = self.state.as_ref()?;
        let vid = ready.by_record.get(id)?;
        ready.heap.get(*vid)
    }

    /// Indexed ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> + '_ {
        self.state
            .iter()
            .flat_map(|ready| ready.by_vector.values())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Snapshot of every vector in insertion order
    pub fn snapshot(&self) -> VectorResult<AnnSnapshot> {
        let ready = self.ready()?;
        let vectors: Vec<(RecordId, Vec<f32>)> = ready
            .heap
            .iter()
            .filter_map(|(vid, embedding)| {
                ready
                    .by_vector
                    .get(&vid)
                    .map(|id| (id.clone(), embedding.to_vec()))
            })
            .collect();
        Ok(AnnSnapshot {
            dimension: ready.config.dimension,
            algorithm: ready.config.algorithm,
            vector_count: vectors.len(),
            accelerated_available: ready.accelerated.is_some(),
            vectors,
        })
    }

    /// Serialized accelerated structure, empty when there is none
    ///
    /// Positions refer to the order of [`snapshot`](Self::snapshot).
    pub fn index_bytes(&self) -> VectorResult<Vec<u8>> {
        let ready = self.ready()?;
        let Some(backend) = ready.accelerated.as_ref().filter(|_| ready.accelerated_built) else {
            return Ok(Vec::new());
        };
        let positions: FxHashMap<VectorId, u64> = ready
            .heap
            .ids()
            .enumerate()
            .map(|(position, vid)| (vid, position as u64))
            .collect();
        Ok(backend
            .serialize(&|vid| positions.get(&vid).copied())
            .unwrap_or_default())
    }

    /// Load `snapshot` (and, if usable, `index_bytes`) into a ready index
    ///
    /// Replaces current contents. Vectors whose length does not match the
    /// configured dimension are skipped. Unusable index bytes cause a
    /// rebuild from the vectors. Returns the number of vectors loaded.
    pub fn restore(&mut self, snapshot: AnnSnapshot, index_bytes: &[u8]) -> VectorResult<usize> {
        self.clear()?;
        let ready = self.ready_mut()?;
        if snapshot.dimension != ready.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: ready.config.dimension,
                got: snapshot.dimension,
            });
        }

        let mut ids_by_position = Vec::with_capacity(snapshot.vectors.len());
        let mut skipped = 0usize;
        for (id, vector) in snapshot.vectors {
            if validate_vector(ready.config.dimension, &vector).is_err()
                || ready.by_record.contains_key(&id)
            {
                skipped += 1;
                continue;
            }
            let vid = ready.heap.insert(&vector)?;
            ready.by_record.insert(id.clone(), vid);
            ready.by_vector.insert(vid, id);
            ids_by_position.push(vid);
        }
        if skipped > 0 {
            warn!(target: "mnemos::ann", skipped, "Skipped malformed persisted vectors");
        }

        let restored_structure = match ready.accelerated.as_mut() {
            Some(backend) if !index_bytes.is_empty() && skipped == 0 => {
                match backend.restore(index_bytes, &ids_by_position, &ready.heap) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            target: "mnemos::ann",
                            error = %e,
                            "Persisted index does not match metadata, rebuilding"
                        );
                        false
                    }
                }
            }
            _ => false,
        };
        if restored_structure {
            ready.accelerated_built = true;
        } else {
            ready.maybe_build();
        }

        info!(
            target: "mnemos::ann",
            vectors = ready.heap.len(),
            restored_structure,
            "Index restored"
        );
        Ok(ready.heap.len())
    }
}
