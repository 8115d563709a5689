//! Approximate/exact nearest-neighbour index
//!
//! [`AnnIndex`] is the entry point. Search strategies sit behind
//! [`VectorIndexBackend`]: [`BruteForceBackend`] is always available,
//! [`FlatBackend`] is the accelerated path when the `flat-index` feature
//! is enabled.

pub mod backend;
pub mod brute_force;
pub mod distance;
#[cfg(feature = "flat-index")]
pub mod flat;
pub mod heap;
pub mod index;

pub use backend::{Eligible, IndexBackendFactory, Probe, VectorIndexBackend};
pub use brute_force::BruteForceBackend;
#[cfg(feature = "flat-index")]
pub use flat::FlatBackend;
pub use heap::{VectorHeap, VectorId};
pub use index::{AnnConfig, AnnIndex, AnnSnapshot};
