//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any suite's main.rs.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use mnemos::{
    CollectionManager, Embedder, MetadataFilter, MnemosConfig, NormalizationConfig, Payload,
    RecordId, StorageConfig, VectorError, VectorResult,
};
use serde_json::Value as JsonValue;

// ============================================================================
// Payloads
// ============================================================================

/// Object literal to payload; panics on non-objects
pub fn payload(value: JsonValue) -> Payload {
    value.as_object().cloned().expect("payload must be a JSON object")
}

/// `count` empty payloads
pub fn empty_payloads(count: usize) -> Vec<Payload> {
    vec![Payload::new(); count]
}

// ============================================================================
// Collections
// ============================================================================

/// Connected in-memory manager
pub fn memory_manager(name: &str, dimension: usize) -> CollectionManager {
    let manager = CollectionManager::from_config(StorageConfig::new(name, dimension));
    manager.connect().expect("connect in-memory collection");
    manager
}

/// Persistent collection config rooted at `dir`
pub fn persistent_config(dir: &Path, name: &str, dimension: usize) -> StorageConfig {
    StorageConfig::new(name, dimension).with_persistence(dir)
}

// ============================================================================
// Embedders
// ============================================================================

/// Hashes words into a fixed number of buckets; counts calls
pub struct HashingEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        HashingEmbedder {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0f32; self.dimension];
        // constant component keeps empty text off the zero vector
        v[0] = 0.1;
        for word in text.split_whitespace() {
            let bucket = word
                .bytes()
                .fold(17usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[bucket % self.dimension] += 1.0;
        }
        Ok(v)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
