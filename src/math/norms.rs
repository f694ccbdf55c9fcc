//! Dot product and magnitude for gradient vectors.
//!
//! Both operate over [`Array1<f32>`] with an explicit sequential
//! reduction so results do not depend on chunking.

use ndarray::Array1;

/// Compute the dot product of two equal-length vectors.
pub fn dot(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute the L2 (Euclidean) magnitude of a vector.
pub fn magnitude(a: &Array1<f32>) -> f32 {
    dot(a, a).sqrt()
}
