//! Vector index backend trait and factory
//!
//! The [`AnnIndex`](super::AnnIndex) owns the [`VectorHeap`] and always
//! answers through [`BruteForceBackend`](super::BruteForceBackend) below
//! the acceleration threshold. An accelerated backend keeps its own
//! structure in sync with the heap and is probed once, at initialize time,
//! through [`IndexBackendFactory`].

use mnemos_core::{Algorithm, VectorResult};

use super::heap::{VectorHeap, VectorId};

/// Predicate restricting a search to eligible vectors
pub type Eligible<'a> = &'a (dyn Fn(VectorId) -> bool + Sync);

/// Trait for swappable vector index implementations
///
/// Results are `(VectorId, score)` pairs sorted by score descending, then
/// VectorId ascending (insertion order) for equal scores.
pub trait VectorIndexBackend: Send + Sync {
    /// Backend name for logs and stats
    fn name(&self) -> &'static str;

    /// Whether this backend is the accelerated path
    fn is_accelerated(&self) -> bool;

    /// Rebuild the backend's structure from the full heap
    fn build(&mut self, heap: &VectorHeap) -> VectorResult<()>;

    /// Insert or overwrite one vector
    fn insert(&mut self, id: VectorId, embedding: &[f32]);

    /// Remove one vector; missing ids are ignored
    fn delete(&mut self, id: VectorId);

    /// Top `k` most similar vectors among those passing `eligible`
    fn search(
        &self,
        heap: &VectorHeap,
        query: &[f32],
        k: usize,
        eligible: Option<Eligible<'_>>,
    ) -> Vec<(VectorId, f32)>;

    /// Drop all structure
    fn clear(&mut self);

    /// Vectors held by the backend's own structure
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized structure for `ann_index.faiss`; `None` writes an empty
    /// placeholder
    ///
    /// `position_of` maps a VectorId to its index in the persisted
    /// vector list.
    fn serialize(&self, _position_of: &dyn Fn(VectorId) -> Option<u64>) -> Option<Vec<u8>> {
        None
    }

    /// Restore from bytes written by [`serialize`](Self::serialize)
    ///
    /// `ids_by_position` are the VectorIds reallocated for the persisted
    /// vector list. An error means the caller should rebuild instead.
    fn restore(
        &mut self,
        _bytes: &[u8],
        _ids_by_position: &[VectorId],
        _heap: &VectorHeap,
    ) -> VectorResult<()> {
        Err(mnemos_core::VectorError::InvalidConfiguration(format!(
            "{} backend has no serialized form",
            self.name()
        )))
    }
}

/// Sort by (score desc, VectorId asc) and keep the first `k`
pub(crate) fn rank(mut results: Vec<(VectorId, f32)>, k: usize) -> Vec<(VectorId, f32)> {
    results.sort_by(|(id_a, score_a), (id_b, score_b)| {
        score_b.total_cmp(score_a).then_with(|| id_a.cmp(id_b))
    });
    results.truncate(k);
    results
}

/// Result of probing for an accelerated backend
pub enum Probe {
    /// Accelerated backend loaded
    Accelerated(Box<dyn VectorIndexBackend>),
    /// Brute force only, with the reason when acceleration was requested
    BruteForceOnly(Option<String>),
}

/// Factory for index backends
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexBackendFactory;

impl IndexBackendFactory {
    /// Probe the accelerated backend for `algorithm`
    pub fn probe(&self, algorithm: Algorithm, dimension: usize) -> Probe {
        match algorithm {
            Algorithm::BruteForce => Probe::BruteForceOnly(None),
            Algorithm::Flat => Self::probe_flat(dimension),
        }
    }

    #[cfg(feature = "flat-index")]
    fn probe_flat(dimension: usize) -> Probe {
        match super::flat::FlatBackend::probe(dimension) {
            Ok(backend) => Probe::Accelerated(Box::new(backend)),
            Err(e) => Probe::BruteForceOnly(Some(e.to_string())),
        }
    }

    #[cfg(not(feature = "flat-index"))]
    fn probe_flat(_dimension: usize) -> Probe {
        Probe::BruteForceOnly(Some(
            "flat index support not compiled in (enable the `flat-index` feature)".to_string(),
        ))
    }
}
