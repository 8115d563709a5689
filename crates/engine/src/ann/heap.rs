//! Vector Heap - contiguous embedding storage
//!
//! VectorHeap stores embeddings in one `Vec<f32>` for cache-friendly
//! scoring. Every vector gets an internal [`VectorId`] allocated from a
//! monotonic counter, so ascending `VectorId` order is insertion order.
//! Search ties are broken on it.
//!
//! # Invariants
//!
//! - `id_to_offset` is the sole source of truth for live vectors
//! - VectorIds are never reused, only storage slots are
//! - overwriting a live id keeps its VectorId (and its position)

use std::collections::BTreeMap;

use mnemos_core::{VectorError, VectorResult};

/// Internal, per-index vector handle
///
/// Monotonic in insertion order. Never persisted; a reload reallocates
/// ids in the persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorId(u64);

impl VectorId {
    /// Wrap a raw id
    pub fn new(id: u64) -> Self {
        VectorId(id)
    }

    /// Raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Per-index vector heap
pub struct VectorHeap {
    dimension: usize,

    /// Layout: [v0_dim0, ..., v0_dimN, v1_dim0, ...]
    data: Vec<f32>,

    /// VectorId -> offset in `data` (in floats). BTreeMap keeps
    /// iteration in VectorId, i.e. insertion, order.
    id_to_offset: BTreeMap<VectorId, usize>,

    /// Offsets of deleted vectors, reused by later inserts
    free_slots: Vec<usize>,

    /// Next VectorId to allocate; never decremented
    next_id: u64,
}

impl VectorHeap {
    /// Create an empty heap
    pub fn new(dimension: usize) -> Self {
        VectorHeap {
            dimension,
            data: Vec::new(),
            id_to_offset: BTreeMap::new(),
            free_slots: Vec::new(),
            next_id: 1,
        }
    }

    /// Dimension of every vector in this heap
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of live vectors
    pub fn len(&self) -> usize {
        self.id_to_offset.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.id_to_offset.is_empty()
    }

    fn allocate_id(&mut self) -> VectorId {
        let id = VectorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert or overwrite a vector
    ///
    /// An existing id is updated in place. A new id takes a free slot if
    /// one exists, otherwise appends.
    pub fn upsert(&mut self, id: VectorId, embedding: &[f32]) -> VectorResult<()> {
        if embedding.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }

        if let Some(&offset) = self.id_to_offset.get(&id) {
            self.data[offset..offset + self.dimension].copy_from_slice(embedding);
        } else {
            let offset = if let Some(slot) = self.free_slots.pop() {
                self.data[slot..slot + self.dimension].copy_from_slice(embedding);
                slot
            } else {
                let offset = self.data.len();
                self.data.extend_from_slice(embedding);
                offset
            };
            self.id_to_offset.insert(id, offset);
        }
        Ok(())
    }

    /// Insert a new vector under a freshly allocated VectorId
    pub fn insert(&mut self, embedding: &[f32]) -> VectorResult<VectorId> {
        if embedding.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }
        let id = self.allocate_id();
        self.upsert(id, embedding)?;
        Ok(id)
    }

    /// Delete a vector. Returns true if it existed.
    pub fn delete(&mut self, id: VectorId) -> bool {
        if let Some(offset) = self.id_to_offset.remove(&id) {
            self.free_slots.push(offset);
            self.data[offset..offset + self.dimension].fill(0.0);
            true
        } else {
            false
        }
    }

    /// Drop every vector. `next_id` is not reset.
    pub fn clear(&mut self) {
        self.data.clear();
        self.id_to_offset.clear();
        self.free_slots.clear();
    }

    /// Embedding by VectorId
    pub fn get(&self, id: VectorId) -> Option<&[f32]> {
        let offset = *self.id_to_offset.get(&id)?;
        Some(&self.data[offset..offset + self.dimension])
    }

    /// Check if a vector exists
    pub fn contains(&self, id: VectorId) -> bool {
        self.id_to_offset.contains_key(&id)
    }

    /// Iterate live vectors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (VectorId, &[f32])> {
        self.id_to_offset
            .iter()
            .map(move |(&id, &offset)| (id, &self.data[offset..offset + self.dimension]))
    }

    /// Live VectorIds in insertion order
    pub fn ids(&self) -> impl Iterator<Item = VectorId> + '_ {
        self.id_to_offset.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut heap = VectorHeap::new(3);
        let id = heap.insert(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(heap.get(id), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut heap = VectorHeap::new(3);
        let err = heap.insert(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut heap = VectorHeap::new(2);
        let a = heap.insert(&[1.0, 0.0]).unwrap();
        let b = heap.insert(&[0.0, 1.0]).unwrap();
        assert!(a < b);

        assert!(heap.delete(a));
        let c = heap.insert(&[1.0, 1.0]).unwrap();
        assert!(c > b);
        assert_eq!(heap.ids().collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn test_slot_reuse_copies_embedding() {
        let mut heap = VectorHeap::new(2);
        let a = heap.insert(&[1.0, 2.0]).unwrap();
        heap.delete(a);
        let b = heap.insert(&[5.0, 6.0]).unwrap();
        assert_eq!(heap.get(b), Some(&[5.0, 6.0][..]));
        assert_eq!(heap.get(a), None);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut heap = VectorHeap::new(2);
        let a = heap.insert(&[1.0, 0.0]).unwrap();
        let b = heap.insert(&[0.0, 1.0]).unwrap();
        heap.upsert(a, &[9.0, 9.0]).unwrap();

        let order: Vec<_> = heap.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(heap.get(a), Some(&[9.0, 9.0][..]));
    }

    #[test]
    fn test_delete_missing_is_false() {
        let mut heap = VectorHeap::new(2);
        assert!(!heap.delete(VectorId::new(42)));
    }

    #[test]
    fn test_clear_keeps_counter() {
        let mut heap = VectorHeap::new(1);
        let a = heap.insert(&[1.0]).unwrap();
        heap.clear();
        assert!(heap.is_empty());
        let b = heap.insert(&[2.0]).unwrap();
        assert!(b > a);
    }
}
