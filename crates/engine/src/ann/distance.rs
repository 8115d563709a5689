//! Similarity functions
//!
//! Scores are "higher = more similar". Collections use cosine similarity;
//! the flat backend stores unit-length rows so cosine reduces to a dot
//! product at search time.

use mnemos_core::{VectorError, VectorResult};

/// Reject wrong lengths and NaN or infinite components
pub fn validate_vector(dimension: usize, vector: &[f32]) -> VectorResult<()> {
    if vector.len() != dimension {
        return Err(VectorError::DimensionMismatch {
            expected: dimension,
            got: vector.len(),
        });
    }
    if let Some((component, &value)) = vector.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        return Err(VectorError::InvalidVector { component, value });
    }
    Ok(())
}

/// Cosine similarity: dot(a,b) / (||a|| * ||b||)
///
/// Range: [-1, 1]. Returns 0.0 if either vector has zero norm.
/// Accumulates in f64 so large finite components do not overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(
        a.len(),
        b.len(),
        "Dimension mismatch in similarity computation"
    );

    let (mut dot, mut sq_a, mut sq_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        sq_a += x * x;
        sq_b += y * y;
    }

    if sq_a == 0.0 || sq_b == 0.0 {
        0.0
    } else {
        (dot / (sq_a.sqrt() * sq_b.sqrt())) as f32
    }
}

/// Dot product (inner product)
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm (Euclidean length), accumulated in f64
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x = (f64::from(*x) / norm) as f32);
    }
}
