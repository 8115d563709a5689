//! Error types for the Mnemos vector engine
//!
//! Every fallible operation in the workspace returns [`VectorResult`].
//! Validation errors (dimension, length, capacity, not-found) are raised
//! to the caller; persistence problems on the load path are logged and
//! recovered by the storage layer and only surface from an explicit flush.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::RecordId;

/// Errors raised by the ANN index, storage backends and managers
#[derive(Debug, Error)]
pub enum VectorError {
    /// Vector length doesn't match the collection dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension from collection config
        expected: usize,
        /// Actual length of the provided vector
        got: usize,
    },

    /// Vector has a NaN or infinite component
    #[error("Invalid vector: component {component} is {value}")]
    InvalidVector {
        /// Position of the first offending component
        component: usize,
        /// The offending value
        value: f32,
    },

    /// Batch arrays of unequal size
    #[error("Length mismatch: {field} has {got} entries, expected {expected}")]
    LengthMismatch {
        /// Which batch argument disagreed with the vector count
        field: &'static str,
        /// Number of vectors in the batch
        expected: usize,
        /// Number of entries in the mismatched argument
        got: usize,
    },

    /// Insert would push the collection past `max_vectors`
    #[error(
        "Capacity exceeded for collection '{collection}': limit {limit}, current {current}, requested {requested}"
    )]
    CapacityExceeded {
        /// Collection name
        collection: String,
        /// Configured maximum
        limit: usize,
        /// Records currently stored
        current: usize,
        /// New records the rejected call would have added
        requested: usize,
    },

    /// Record with the given id does not exist
    #[error("Record not found: {id}")]
    NotFound {
        /// The missing id
        id: RecordId,
    },

    /// ANN index used before `initialize` or after `disconnect`
    #[error("Index not initialized")]
    NotInitialized,

    /// Storage backend used while disconnected
    #[error("Collection '{collection}' is not connected")]
    NotConnected {
        /// Collection name
        collection: String,
    },

    /// Configuration rejected (non-positive dimension, unknown algorithm, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Collection name rejected by validation
    #[error("Invalid collection name: {name} ({reason})")]
    InvalidCollectionName {
        /// The invalid name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Filter uses an operator the backend does not support
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Dual-collection half that is disabled or failed to connect
    #[error("Collection unavailable: {name}")]
    CollectionUnavailable {
        /// Collection name (or role when unnamed)
        name: String,
    },

    /// Reading or writing persisted state failed
    #[error("Persistence error at {}: {message}", path.display())]
    Persistence {
        /// File or directory involved
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// External embedder failed
    #[error("Embedding error: {0}")]
    Embedding(String),
}

impl VectorError {
    /// Check if this error indicates a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorError::NotFound { .. })
    }

    /// Check if this error is a caller-side validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            VectorError::DimensionMismatch { .. }
                | VectorError::InvalidVector { .. }
                | VectorError::LengthMismatch { .. }
                | VectorError::CapacityExceeded { .. }
                | VectorError::InvalidConfiguration(_)
                | VectorError::InvalidCollectionName { .. }
                | VectorError::InvalidFilter(_)
        )
    }

    /// Build a persistence error from an I/O failure
    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        VectorError::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(e: serde_json::Error) -> Self {
        VectorError::Serialization(e.to_string())
    }
}

/// Result type alias for vector operations
pub type VectorResult<T> = Result<T, VectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(VectorError::NotFound { id: RecordId::from(7) }.is_not_found());
        assert!(!VectorError::NotInitialized.is_not_found());
    }

    #[test]
    fn test_is_validation_error() {
        assert!(VectorError::DimensionMismatch {
            expected: 768,
            got: 384
        }
        .is_validation_error());
        assert!(VectorError::CapacityExceeded {
            collection: "knowledge".into(),
            limit: 2,
            current: 2,
            requested: 1,
        }
        .is_validation_error());
        assert!(!VectorError::NotInitialized.is_validation_error());
        assert!(!VectorError::Serialization("bad".into()).is_validation_error());
    }

    #[test]
    fn test_error_display() {
        let err = VectorError::DimensionMismatch {
            expected: 768,
            got: 384,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 768, got 384");
    }

    #[test]
    fn test_error_display_length_mismatch() {
        let err = VectorError::LengthMismatch {
            field: "ids",
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch: ids has 2 entries, expected 3"
        );
    }

    #[test]
    fn test_error_display_not_found() {
        let err = VectorError::NotFound {
            id: RecordId::from("doc-1"),
        };
        assert_eq!(err.to_string(), "Record not found: doc-1");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = VectorError::persistence("/tmp/x/payloads.json", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("payloads.json"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_from_serde_json() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: VectorError = bad.into();
        assert!(matches!(err, VectorError::Serialization(_)));
    }
}
