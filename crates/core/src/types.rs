//! Record, result and statistics types shared across the workspace

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::config::{Algorithm, BackendKind};

/// Open, schema-less metadata attached to a vector
///
/// Values can be any JSON kind; filters check kinds at evaluation time.
pub type Payload = Map<String, JsonValue>;

/// Caller-supplied record identifier (integer or string)
///
/// Serialized untagged, so JSON sees `1` or `"doc-1"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer id
    Int(i64),
    /// String id
    Str(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Int(n as i64)
    }
}

impl From<u32> for RecordId {
    fn from(n: u32) -> Self {
        RecordId::Int(n as i64)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

/// A stored vector with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Record id
    pub id: RecordId,
    /// Embedding, `len() == collection dimension`
    pub vector: Vec<f32>,
    /// Metadata
    pub payload: Payload,
}

impl VectorRecord {
    /// Create a new record
    pub fn new(id: impl Into<RecordId>, vector: Vec<f32>, payload: Payload) -> Self {
        VectorRecord {
            id: id.into(),
            vector,
            payload,
        }
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// One search hit. Higher score = more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Record id
    pub id: RecordId,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
    /// Payload of the matched record
    pub payload: Payload,
}

/// Metrics captured for the most recent search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetrics {
    /// Wall time spent scoring and ranking
    pub query_time_ms: f64,
    /// Number of results returned
    pub result_count: usize,
    /// Whether the accelerated structure answered the query
    pub from_accelerated_path: bool,
}

/// Derived ANN statistics (not authoritative state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnStats {
    /// Configured algorithm
    pub algorithm: Algorithm,
    /// Vectors currently indexed
    pub vector_count: usize,
    /// True when the next search would run on the accelerated path
    pub using_accelerated_path: bool,
    /// True when an accelerated backend was loaded at initialize time
    pub accelerated_available: bool,
    /// Why the index fell back to brute force, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Metrics of the last search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_search: Option<SearchMetrics>,
    /// Time spent building the accelerated structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_time_ms: Option<f64>,
}

/// Snapshot of a collection's configuration and state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Backend variant serving the collection
    pub backend: BackendKind,
    /// Embedding dimension
    pub dimension: usize,
    /// Hard capacity limit
    pub max_vectors: usize,
    /// Records currently stored
    pub vector_count: usize,
    /// Whether the backend is connected
    pub connected: bool,
    /// Whether state is persisted to disk
    pub persistence_enabled: bool,
    /// Configured ANN algorithm
    pub algorithm: Algorithm,
}
