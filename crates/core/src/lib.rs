//! Core types for the Mnemos vector engine
//!
//! This crate defines the vocabulary shared by every other crate:
//! - Records and ids: [`VectorRecord`], [`RecordId`], [`Payload`]
//! - Search output: [`SearchResult`], [`AnnStats`], [`SearchMetrics`]
//! - Errors: [`VectorError`] / [`VectorResult`]
//! - Metadata filters: [`MetadataFilter`], [`FilterOp`], [`JsonScalar`]
//! - Configuration: [`MnemosConfig`], [`StorageConfig`], [`NormalizationConfig`]
//! - The external embedder seam: [`Embedder`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod embed;
pub mod error;
pub mod filter;
pub mod types;

pub use config::{
    Algorithm, BackendKind, Language, MnemosConfig, NormalizationConfig, StorageConfig,
    CONFIG_FILE_NAME, DEFAULT_KNOWLEDGE_COLLECTION, DEFAULT_REFLECTION_COLLECTION,
};
pub use embed::Embedder;
pub use error::{VectorError, VectorResult};
pub use filter::{FilterCondition, FilterOp, JsonScalar, MetadataFilter};
pub use types::{
    AnnStats, CollectionInfo, Payload, RecordId, SearchMetrics, SearchResult, VectorRecord,
};
