//! Vector storage engine for Mnemos
//!
//! This crate layers, bottom-up:
//! - ANN index: exact brute-force search plus an optional accelerated
//!   flat index behind a capability probe
//! - Storage backends: one collection each, with payloads, filters,
//!   capacity/dimension checks and JSON persistence
//! - Events: what managers report to the surrounding runtime
//! - Managers: single and dual (knowledge + reflection) collections and
//!   the normalization migration job
//!
//! Nothing here is global; callers construct managers and pass them
//! where needed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ann;
pub mod events;
pub mod manager;
pub mod storage;

pub use ann::{AnnConfig, AnnIndex};
pub use events::{Event, EventSink, MemorySink, NoopSink, TracingSink};
pub use manager::{
    normalize_data, CollectionKind, CollectionManager, DualCollectionInfo, DualCollectionManager,
    MigrationOptions, MigrationReport, MigrationStatus,
};
pub use storage::{create_backend, BasicBackend, EnhancedBackend, StorageBackend};
