//! Mnemos - embedded vector memory for AI agents
//!
//! Mnemos stores embedding vectors with open JSON payloads, answers
//! filtered nearest-neighbour queries, and keeps two independent
//! collections per agent: **knowledge** and **reflection**. Stored text
//! can be re-normalized and re-embedded in bulk when the normalization
//! policy changes.
//!
//! # Quick Start
//!
//! ```
//! use mnemos::{CollectionManager, MetadataFilter, Payload, RecordId, StorageConfig};
//! use serde_json::json;
//!
//! let manager = CollectionManager::from_config(StorageConfig::new("knowledge", 4));
//! manager.connect()?;
//!
//! let payload: Payload = json!({"kind": "fact"}).as_object().cloned().unwrap_or_default();
//! manager.insert(&[vec![1.0, 0.0, 0.0, 0.0]], &[1.into()], &[payload])?;
//!
//! let filter = MetadataFilter::new().eq("kind", "fact");
//! let hits = manager.search(&[1.0, 0.0, 0.0, 0.0], 1, Some(&filter))?;
//! assert_eq!(hits[0].id, RecordId::from(1));
//! # Ok::<(), mnemos::VectorError>(())
//! ```
//!
//! # Architecture
//!
//! - [`mnemos_core`]: records, errors, filters, configuration
//! - [`mnemos_normalize`]: the text normalization pipeline
//! - [`mnemos_engine`]: ANN index, storage backends, managers
//!
//! Embedding generation is external; plug a model in through
//! [`Embedder`].

pub use mnemos_core::*;
pub use mnemos_engine::{
    ann, create_backend, events, manager, normalize_data, storage, AnnConfig, AnnIndex, BasicBackend,
    CollectionKind, CollectionManager, DualCollectionInfo, DualCollectionManager, EnhancedBackend,
    Event, EventSink, MemorySink, MigrationOptions, MigrationReport, MigrationStatus, NoopSink,
    StorageBackend, TracingSink,
};
pub use mnemos_normalize::{fingerprint, normalize_text, Normalizer};
