//! Flat accelerated backend
//!
//! Keeps a second, pre-normalized copy of every vector in one contiguous
//! matrix so cosine similarity is a single dot product per row, and
//! scores rows in parallel with rayon.
//!
//! ## Serialized form (`ann_index.faiss`)
//!
//! Little-endian:
//!
//! | field     | type            |
//! |-----------|-----------------|
//! | magic     | `b"MNFL"`       |
//! | version   | u32             |
//! | dimension | u32             |
//! | count     | u64             |
//! | positions | count x u64     |
//! | rows      | count x dim f32 |
//!
//! `positions[i]` is the index, in the persisted vector list, of the
//! vector stored in row `i`.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use mnemos_core::{VectorError, VectorResult};

use super::backend::{rank, Eligible, VectorIndexBackend};
use super::distance::{dot_product, normalize_in_place};
use super::heap::{VectorHeap, VectorId};

const MAGIC: &[u8; 4] = b"MNFL";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Pre-normalized contiguous matrix, scored in parallel
#[derive(Debug)]
pub struct FlatBackend {
    dimension: usize,
    rows: Vec<f32>,
    ids: Vec<VectorId>,
    positions: FxHashMap<VectorId, usize>,
}

impl FlatBackend {
    /// Check the backend can serve `dimension` and create it
    pub fn probe(dimension: usize) -> VectorResult<Self> {
        if dimension == 0 {
            return Err(VectorError::InvalidConfiguration(
                "flat index requires a positive dimension".to_string(),
            ));
        }
        if rayon::current_num_threads() == 0 {
            return Err(VectorError::InvalidConfiguration(
                "no rayon worker threads available".to_string(),
            ));
        }
        Ok(FlatBackend {
            dimension,
            rows: Vec::new(),
            ids: Vec::new(),
            positions: FxHashMap::default(),
        })
    }

    fn push_row(&mut self, id: VectorId, embedding: &[f32]) {
        let start = self.rows.len();
        self.rows.extend_from_slice(embedding);
        normalize_in_place(&mut self.rows[start..]);
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
    }
}

impl VectorIndexBackend for FlatBackend {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn build(&mut self, heap: &VectorHeap) -> VectorResult<()> {
        if heap.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                got: heap.dimension(),
            });
        }
        self.clear();
        self.rows.reserve(heap.len() * self.dimension);
        for (id, embedding) in heap.iter() {
            self.push_row(id, embedding);
        }
        Ok(())
    }

    fn insert(&mut self, id: VectorId, embedding: &[f32]) {
        if let Some(&row) = self.positions.get(&id) {
            let start = row * self.dimension;
            let slot = &mut self.rows[start..start + self.dimension];
            slot.copy_from_slice(embedding);
            normalize_in_place(slot);
        } else {
            self.push_row(id, embedding);
        }
    }

    fn delete(&mut self, id: VectorId) {
        let Some(row) = self.positions.remove(&id) else {
            return;
        };
        let last = self.ids.len() - 1;
        if row != last {
            let (head, tail) = self.rows.split_at_mut(last * self.dimension);
            head[row * self.dimension..(row + 1) * self.dimension].copy_from_slice(tail);
            let moved = self.ids[last];
            self.ids[row] = moved;
            self.positions.insert(moved, row);
        }
        self.ids.pop();
        self.rows.truncate(last * self.dimension);
    }

    fn search(
        &self,
        _heap: &VectorHeap,
        query: &[f32],
        k: usize,
        eligible: Option<Eligible<'_>>,
    ) -> Vec<(VectorId, f32)> {
        if k == 0 || self.ids.is_empty() || query.len() != self.dimension {
            return Vec::new();
        }

        let mut q = query.to_vec();
        normalize_in_place(&mut q);

        let results: Vec<(VectorId, f32)> = self
            .rows
            .par_chunks(self.dimension)
            .zip(self.ids.par_iter())
            .filter(|(_, id)| eligible.map_or(true, |f| f(**id)))
            .map(|(row, &id)| (id, dot_product(&q, row)))
            .collect();

        rank(results, k)
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.ids.clear();
        self.positions.clear();
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn serialize(&self, position_of: &dyn Fn(VectorId) -> Option<u64>) -> Option<Vec<u8>> {
        let mut buf = Vec::with_capacity(
            HEADER_LEN + self.ids.len() * 8 + self.rows.len() * std::mem::size_of::<f32>(),
        );
        buf.extend_from_slice(MAGIC);
        buf.write_u32::<LittleEndian>(FORMAT_VERSION).ok()?;
        buf.write_u32::<LittleEndian>(u32::try_from(self.dimension).ok()?)
            .ok()?;
        buf.write_u64::<LittleEndian>(self.ids.len() as u64).ok()?;
        for id in &self.ids {
            buf.write_u64::<LittleEndian>(position_of(*id)?).ok()?;
        }
        for value in &self.rows {
            buf.write_f32::<LittleEndian>(*value).ok()?;
        }
        Some(buf)
    }

    fn restore(
        &mut self,
        bytes: &[u8],
        ids_by_position: &[VectorId],
        heap: &VectorHeap,
    ) -> VectorResult<()> {
        let corrupt = |msg: String| VectorError::Serialization(format!("flat index: {}", msg));
        let io = |e: std::io::Error| corrupt(e.to_string());

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(io)?;
        if &magic != MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }
        let version = cursor.read_u32::<LittleEndian>().map_err(io)?;
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }
        let dimension = cursor.read_u32::<LittleEndian>().map_err(io)? as usize;
        if dimension != self.dimension {
            return Err(corrupt(format!(
                "dimension {} does not match {}",
                dimension, self.dimension
            )));
        }
        let count = cursor.read_u64::<LittleEndian>().map_err(io)? as usize;
        if count != ids_by_position.len() || count != heap.len() {
            return Err(corrupt(format!(
                "holds {} vectors, metadata has {}",
                count,
                ids_by_position.len()
            )));
        }
        let expected_len = HEADER_LEN + count * 8 + count * dimension * 4;
        if bytes.len() != expected_len {
            return Err(corrupt(format!(
                "length {} does not match header ({})",
                bytes.len(),
                expected_len
            )));
        }

        let mut ids = Vec::with_capacity(count);
        let mut positions = FxHashMap::default();
        for row in 0..count {
            let position = cursor.read_u64::<LittleEndian>().map_err(io)? as usize;
            let id = *ids_by_position
                .get(position)
                .ok_or_else(|| corrupt(format!("position {} out of range", position)))?;
            if !heap.contains(id) || positions.insert(id, row).is_some() {
                return Err(corrupt(format!("position {} is not a live vector", position)));
            }
            ids.push(id);
        }
        let mut rows = vec![0f32; count * dimension];
        cursor
            .read_f32_into::<LittleEndian>(&mut rows)
            .map_err(io)?;

        self.rows = rows;
        self.ids = ids;
        self.positions = positions;
        Ok(())
    }
}
