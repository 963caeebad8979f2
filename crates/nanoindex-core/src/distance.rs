//! Distance kernels over contiguous `f32` buffers (spec.md C1).
//!
//! These are pure functions with no allocation on the hot path beyond the
//! batched result vector. Mismatched dimensions are a programmer error: we
//! `debug_assert!` rather than branch on it in release builds, since every
//! caller reachable from the outside (`DataStore`, `IVFIndex`) validates
//! dimension first and returns `InvalidInput` before reaching here.

/// Squared Euclidean distance between two equal-length vectors.
pub fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "l2_sq: dimension mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Squared L2 norm, i.e. `dot(v, v)`.
pub fn norm_sq(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine distance: `1 - cos(theta)`. A zero vector on either side is
/// defined as maximally dissimilar (returns 1.0) rather than dividing by
/// zero.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine: dimension mismatch");
    let na = norm_sq(a).sqrt();
    let nb = norm_sq(b).sqrt();
    if na < 1e-12 || nb < 1e-12 {
        return 1.0;
    }
    1.0 - dot(a, b) / (na * nb)
}

/// L2-normalizes `v`. Vectors with norm below `1e-12` are returned
/// unchanged (spec.md §8 boundary behavior: `normalize(zero_vector)` is a
/// no-op).
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = norm_sq(v).sqrt();
    if norm < 1e-12 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Fused batched squared-L2 distance: for each row `r` of `matrix`,
/// `‖q‖² + ‖r‖² − 2·q·r`. This is the central performance primitive — it
/// lets a single pass over `matrix` stand in for `matrix.len()` calls to
/// `l2_sq`, and reuses `cached_norms` when the caller already has them
/// (the `DataStore` norm cache).
///
/// `matrix` is a flat row-major buffer of `n` rows, each of length
/// `q.len()`. Empty input yields an empty result, not an error.
pub fn l2_sq_batch(q: &[f32], matrix: &[f32], cached_norms: Option<&[f32]>) -> Vec<f32> {
    let dim = q.len();
    if dim == 0 || matrix.is_empty() {
        return Vec::new();
    }
    debug_assert_eq!(matrix.len() % dim, 0, "l2_sq_batch: ragged matrix");
    let n = matrix.len() / dim;
    if let Some(norms) = cached_norms {
        debug_assert_eq!(norms.len(), n, "l2_sq_batch: cached_norms length mismatch");
    }

    let q_norm = norm_sq(q);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let row = &matrix[i * dim..(i + 1) * dim];
        let row_norm = match cached_norms {
            Some(norms) => norms[i],
            None => norm_sq(row),
        };
        let qr = dot(q, row);
        out.push(q_norm + row_norm - 2.0 * qr);
    }
    out
}
