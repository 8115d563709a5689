//! Brute-force search backend
//!
//! O(n) exact search straight over the heap. Holds no structure of its
//! own, so it is always available and always consistent.

use super::backend::{rank, Eligible, VectorIndexBackend};
use super::distance::cosine_similarity;
use super::heap::{VectorHeap, VectorId};
use mnemos_core::VectorResult;

/// Exact cosine search over every eligible vector
#[derive(Debug, Default)]
pub struct BruteForceBackend;

impl BruteForceBackend {
    /// Create a brute-force backend
    pub fn new() -> Self {
        BruteForceBackend
    }
}

impl VectorIndexBackend for BruteForceBackend {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn is_accelerated(&self) -> bool {
        false
    }

    fn build(&mut self, _heap: &VectorHeap) -> VectorResult<()> {
        Ok(())
    }

    fn insert(&mut self, _id: VectorId, _embedding: &[f32]) {}

    fn delete(&mut self, _id: VectorId) {}

    fn search(
        &self,
        heap: &VectorHeap,
        query: &[f32],
        k: usize,
        eligible: Option<Eligible<'_>>,
    ) -> Vec<(VectorId, f32)> {
        if k == 0 || heap.is_empty() || query.len() != heap.dimension() {
            return Vec::new();
        }

        // heap.iter() yields insertion order
        let results: Vec<(VectorId, f32)> = heap
            .iter()
            .filter(|(id, _)| eligible.map_or(true, |f| f(*id)))
            .map(|(id, embedding)| (id, cosine_similarity(query, embedding)))
            .collect();

        rank(results, k)
    }

    fn clear(&mut self) {}

    fn len(&self) -> usize {
        0
    }
}
