//! Embedder seam
//!
//! Embedding generation is an external service. The engine only consumes
//! the vectors it produces: the normalization migration job re-embeds
//! stored text through this trait, and callers use it to build query
//! vectors.

use crate::error::VectorResult;

/// Turns text into an embedding vector
///
/// Implementations wrap a model runtime or a remote API. Failures should
/// be reported as [`VectorError::Embedding`](crate::VectorError::Embedding).
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;

    /// Output dimension, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        (**self).embed(text)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        (**self).embed(text)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}
