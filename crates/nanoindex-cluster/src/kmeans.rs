use crate::error::{ClusterError, Result};
use nanoindex_core::distance::{l2_sq, l2_sq_batch, norm_sq};
use rand::rngs::StdRng;
use rand::seq::index::sample as sample_indices;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

/// Mini-batch K-means configuration (spec.md C3). Defaults match the spec.
#[derive(Debug, Clone, Copy)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iters: usize,
    pub tol: f32,
    pub sample_cap: usize,
    pub seed: u64,
}

impl KMeansConfig {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            max_iters: 20,
            tol: 1e-4,
            sample_cap: 10_000,
            seed,
        }
    }
}

/// Result of a training run: the `k * dim` centroid matrix, row-major, plus
/// the iteration count actually used (useful for logging/diagnostics).
#[derive(Debug, Clone)]
pub struct KMeansResult {
    pub centroids: Vec<f32>,
    pub iterations: usize,
    pub converged: bool,
}

fn gather_rows(x: &[f32], dim: usize, indices: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(indices.len() * dim);
    for &i in indices {
        out.extend_from_slice(&x[i * dim..(i + 1) * dim]);
    }
    out
}

/// Trains K centroids on `x` (row-major, `n * dim` floats). Deterministic
/// given the same seed and input: subsampling, initial seeding, and
/// assignment tiebreaks (lowest centroid index wins) are all
/// seed-controlled or index-ordered.
///
/// `deadline`, if set, is checked once per iteration — the "between
/// batches" coarse cancellation boundary spec.md §5 describes. A deadline
/// that has already passed when checked aborts the run with
/// `ClusterError::Timeout`; any centroids computed so far are discarded,
/// not returned as a partial result.
pub fn train(x: &[f32], dim: usize, config: KMeansConfig, deadline: Option<Instant>) -> Result<KMeansResult> {
    if dim == 0 || x.len() % dim != 0 {
        return Err(ClusterError::DimensionMismatch {
            expected: dim,
            actual: if dim == 0 { 0 } else { x.len() % dim },
        });
    }
    if config.k == 0 {
        return Err(ClusterError::ZeroClusters);
    }

    let n = x.len() / dim;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let x_prime: Vec<f32> = if n > config.sample_cap {
        let indices = sample_indices(&mut rng, n, config.sample_cap).into_vec();
        gather_rows(x, dim, &indices)
    } else {
        x.to_vec()
    };
    let n_sample = x_prime.len() / dim;

    if config.k > n_sample {
        return Err(ClusterError::TooFewSamples {
            k: config.k,
            n_sample,
        });
    }

    let init_indices = sample_indices(&mut rng, n_sample, config.k).into_vec();
    let mut centroids = gather_rows(&x_prime, dim, &init_indices);

    let mut iterations = 0;
    let mut converged = false;

    for iter in 0..config.max_iters {
        if let Some(dl) = deadline {
            if Instant::now() >= dl {
                return Err(ClusterError::Timeout);
            }
        }
        iterations = iter + 1;
        let centroid_norms: Vec<f32> = (0..config.k)
            .map(|c| norm_sq(&centroids[c * dim..(c + 1) * dim]))
            .collect();

        let mut assignments = vec![0usize; n_sample];
        for row in 0..n_sample {
            let v = &x_prime[row * dim..(row + 1) * dim];
            let dists = l2_sq_batch(v, &centroids, Some(&centroid_norms));
            let mut best = 0usize;
            for c in 1..config.k {
                if dists[c] < dists[best] {
                    best = c;
                }
            }
            assignments[row] = best;
        }

        let mut sums = vec![0f32; config.k * dim];
        let mut counts = vec![0usize; config.k];
        for row in 0..n_sample {
            let c = assignments[row];
            counts[c] += 1;
            let v = &x_prime[row * dim..(row + 1) * dim];
            for d in 0..dim {
                sums[c * dim + d] += v[d];
            }
        }

        let mut max_shift = 0f32;
        let mut new_centroids = centroids.clone();
        for c in 0..config.k {
            if counts[c] == 0 {
                // Empty cluster: keep the previous centroid unchanged.
                continue;
            }
            let mean: Vec<f32> = sums[c * dim..(c + 1) * dim]
                .iter()
                .map(|s| s / counts[c] as f32)
                .collect();
            let shift = l2_sq(&mean, &centroids[c * dim..(c + 1) * dim]).sqrt();
            max_shift = max_shift.max(shift);
            new_centroids[c * dim..(c + 1) * dim].copy_from_slice(&mean);
        }
        centroids = new_centroids;

        debug!(iter, max_shift, "kmeans iteration");
        if max_shift <= config.tol {
            converged = true;
            break;
        }
    }

    info!(
        k = config.k,
        n_sample,
        iterations,
        converged,
        "kmeans training finished"
    );

    Ok(KMeansResult {
        centroids,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn synthetic_clusters() -> (Vec<f32>, usize) {
        let dim = 2;
        let mut x = Vec::new();
        for _ in 0..20 {
            x.extend_from_slice(&[0.0, 0.0]);
        }
        for _ in 0..20 {
            x.extend_from_slice(&[10.0, 10.0]);
        }
        (x, dim)
    }

    #[test]
    fn determinism_given_seed() {
        let (x, dim) = synthetic_clusters();
        let cfg = KMeansConfig::new(2, 42);
        let r1 = train(&x, dim, cfg, None).unwrap();
        let r2 = train(&x, dim, cfg, None).unwrap();
        assert_eq!(r1.centroids, r2.centroids);
    }

    #[test]
    fn different_seeds_still_converge_to_clusters() {
        let (x, dim) = synthetic_clusters();
        let result = train(&x, dim, KMeansConfig::new(2, 7), None).unwrap();
        assert!(result.converged);
        let mut near_zero = 0;
        let mut near_ten = 0;
        for c in 0..2 {
            let centroid = &result.centroids[c * dim..(c + 1) * dim];
            if centroid[0] < 5.0 {
                near_zero += 1;
            } else {
                near_ten += 1;
            }
        }
        assert_eq!(near_zero, 1);
        assert_eq!(near_ten, 1);
    }

    #[test]
    fn k_greater_than_n_sample_is_invalid() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let err = train(&x, 2, KMeansConfig::new(5, 0), None);
        assert!(err.is_err());
    }

    #[test]
    fn subsamples_when_above_sample_cap() {
        let dim = 1;
        let x: Vec<f32> = (0..50).map(|i| i as f32).collect();
        let mut cfg = KMeansConfig::new(3, 1);
        cfg.sample_cap = 10;
        let result = train(&x, dim, cfg, None).unwrap();
        assert_eq!(result.centroids.len(), 3);
    }

    #[test]
    fn expired_deadline_aborts_with_timeout() {
        let (x, dim) = synthetic_clusters();
        let cfg = KMeansConfig::new(2, 42);
        let already_passed = Instant::now() - std::time::Duration::from_secs(1);
        let err = train(&x, dim, cfg, Some(already_passed));
        assert!(matches!(err, Err(ClusterError::Timeout)));
    }

    proptest! {
        /// `train` must always hand back exactly `k * dim` centroid values
        /// and be deterministic for a fixed seed, whatever the input shape.
        #[test]
        fn centroid_matrix_shape_and_determinism(
            dim in 1usize..5,
            n in 1usize..40,
            k in 1usize..6,
            seed in any::<u64>(),
        ) {
            prop_assume!(k <= n);
            let x: Vec<f32> = (0..n * dim).map(|i| (i as f32 * 1.37) % 97.0).collect();
            let cfg = KMeansConfig::new(k, seed);

            let r1 = train(&x, dim, cfg, None).unwrap();
            prop_assert_eq!(r1.centroids.len(), k * dim);

            let r2 = train(&x, dim, cfg, None).unwrap();
            prop_assert_eq!(r1.centroids, r2.centroids);
        }
    }
}
