use crate::error::{IndexError, Result};
use nanoindex_core::distance::{l2_sq_batch, norm_sq};
use nanoindex_cluster::{train as kmeans_train, KMeansConfig};
use nanoindex_store::DataStore;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use tracing::info;

/// Parameters controlling the mini-batch K-means run behind `train`.
/// Defaults mirror `nanoindex_cluster::KMeansConfig`'s. `deadline`, if set,
/// is forwarded to the K-means loop and also checked once more before the
/// row-partitioning pass (spec.md §5's "between batches" cancellation
/// boundary) — `train` is one logical operation with two coarse phases,
/// centroid fitting and partition assignment.
#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    pub max_iters: usize,
    pub tol: f32,
    pub sample_cap: usize,
    pub seed: u64,
    pub deadline: Option<Instant>,
}

impl TrainParams {
    pub fn new(seed: u64) -> Self {
        Self {
            max_iters: 20,
            tol: 1e-4,
            sample_cap: 10_000,
            seed,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// A single search hit: the row index into `DataStore` and its squared L2
/// distance to the query. Resolving `row` to an external ID is the caller's
/// job (it needs `DataStore`, which `IVFIndex` only borrows transiently).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub row: usize,
    pub distance: f32,
}

/// Max-heap candidate ordered so that the *worst* entry (highest distance,
/// then highest row index) sorts greatest — exactly the one a bounded
/// top-k heap should evict first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f32,
    row: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.distance)
            .cmp(&OrderedFloat(other.distance))
            .then_with(|| self.row.cmp(&other.row))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Coarse quantizer plus inverted lists (spec.md C4). Holds row indices
/// into a `DataStore` it does not own — the caller is responsible for
/// re-training after rows are reset, and for not mixing an `IVFIndex`
/// trained against one store with another.
#[derive(Debug, Clone)]
pub struct IVFIndex {
    dim: usize,
    k: usize,
    n_trained: usize,
    centroids: Vec<f32>,
    centroid_norms: Vec<f32>,
    inverted_lists: Vec<Vec<usize>>,
}

impl IVFIndex {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_trained(&self) -> usize {
        self.n_trained
    }

    pub(crate) fn from_parts(
        dim: usize,
        k: usize,
        n_trained: usize,
        centroids: Vec<f32>,
        centroid_norms: Vec<f32>,
        inverted_lists: Vec<Vec<usize>>,
    ) -> Self {
        Self {
            dim,
            k,
            n_trained,
            centroids,
            centroid_norms,
            inverted_lists,
        }
    }

    pub(crate) fn centroids(&self) -> &[f32] {
        &self.centroids
    }

    /// The inverted lists built by the last `train` call, one per
    /// centroid, in row-index insertion order. Exposed `pub` (rather than
    /// `pub(crate)`) so callers can check the partition-exactness
    /// invariant of spec.md §8 directly: every row in `[0, n_trained)`
    /// appears in exactly one list.
    pub fn inverted_lists(&self) -> &[Vec<usize>] {
        &self.inverted_lists
    }

    /// Trains fresh centroids on `store`'s current rows and partitions all
    /// `N_trained` of them into inverted lists. Rows added to `store`
    /// after this call are invisible to `search` until the next `train`.
    pub fn train(store: &DataStore, k: usize, params: TrainParams) -> Result<Self> {
        let dim = store.dim();
        let n_trained = store.len();
        let all_vectors = store.all_vectors();

        if n_trained == 0 {
            return Ok(Self {
                dim,
                k,
                n_trained: 0,
                centroids: vec![0.0; k * dim],
                centroid_norms: vec![0.0; k],
                inverted_lists: vec![Vec::new(); k],
            });
        }

        let cfg = KMeansConfig {
            k,
            max_iters: params.max_iters,
            tol: params.tol,
            sample_cap: params.sample_cap,
            seed: params.seed,
        };
        let kmeans_result = kmeans_train(all_vectors, dim, cfg, params.deadline)?;
        let centroids = kmeans_result.centroids;
        let centroid_norms: Vec<f32> = (0..k)
            .map(|c| norm_sq(&centroids[c * dim..(c + 1) * dim]))
            .collect();

        if let Some(dl) = params.deadline {
            if Instant::now() >= dl {
                return Err(IndexError::Timeout);
            }
        }

        let mut inverted_lists: Vec<Vec<usize>> = vec![Vec::new(); k];
        for row in 0..n_trained {
            let v = store.get_row(row).map_err(|_| IndexError::CorruptSnapshot(
                "row vanished mid-training".to_string(),
            ))?;
            let dists = l2_sq_batch(v, &centroids, Some(&centroid_norms));
            let mut best = 0usize;
            for c in 1..k {
                if dists[c] < dists[best] {
                    best = c;
                }
            }
            inverted_lists[best].push(row);
        }

        info!(k, n_trained, "ivf index trained");

        Ok(Self {
            dim,
            k,
            n_trained,
            centroids,
            centroid_norms,
            inverted_lists,
        })
    }

    /// Searches for the `top_k` nearest rows to `query`, probing the
    /// `nprobe` closest centroids and scanning at most `max_codes` vectors
    /// total. Returns rows sorted by ascending distance (lower row index
    /// wins ties). Empty if the index was never trained.
    ///
    /// `deadline`, if set, is checked once per probe — there is no
    /// mid-distance-computation cancellation (spec.md §5). An expired
    /// deadline discards whatever partial heap has accumulated and
    /// returns `IndexError::Timeout` rather than a partial result.
    pub fn search(
        &self,
        store: &DataStore,
        query: &[f32],
        top_k: usize,
        nprobe: usize,
        max_codes: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredRow>> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if self.n_trained == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        let centroid_dists = l2_sq_batch(query, &self.centroids, Some(&self.centroid_norms));
        let mut probe_order: Vec<usize> = (0..self.k).collect();
        probe_order.sort_by(|&a, &b| {
            OrderedFloat(centroid_dists[a])
                .cmp(&OrderedFloat(centroid_dists[b]))
                .then_with(|| a.cmp(&b))
        });
        probe_order.truncate(nprobe.min(self.k));

        let norms = store.norms_sq();
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(top_k + 1);
        let mut codes_scanned = 0usize;

        'probes: for &centroid in &probe_order {
            if let Some(dl) = deadline {
                if Instant::now() >= dl {
                    return Err(IndexError::Timeout);
                }
            }
            let list = &self.inverted_lists[centroid];
            for &row in list {
                if codes_scanned >= max_codes {
                    break 'probes;
                }
                codes_scanned += 1;
                let v = store.get_row(row).map_err(|_| {
                    IndexError::CorruptSnapshot("row vanished mid-search".to_string())
                })?;
                let row_norm = norms.get(row).copied().unwrap_or_else(|| norm_sq(v));
                let dist = l2_sq_batch(query, v, Some(std::slice::from_ref(&row_norm)))[0];
                let candidate = Candidate { distance: dist, row };

                if heap.len() < top_k {
                    heap.push(candidate);
                } else if let Some(worst) = heap.peek() {
                    if candidate < *worst {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
        }

        let mut results: Vec<ScoredRow> = heap
            .into_iter()
            .map(|c| ScoredRow {
                row: c.row,
                distance: c.distance,
            })
            .collect();
        results.sort_by(|a, b| {
            OrderedFloat(a.distance)
                .cmp(&OrderedFloat(b.distance))
                .then_with(|| a.row.cmp(&b.row))
        });
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_ordering_prefers_lower_distance_then_lower_row() {
        let a = Candidate { distance: 1.0, row: 5 };
        let b = Candidate { distance: 1.0, row: 2 };
        let c = Candidate { distance: 0.5, row: 9 };
        assert!(a > b, "equal distance, higher row is worse");
        assert!(b > c, "higher distance is worse regardless of row");
    }

    #[test]
    fn train_on_empty_store_yields_zero_trained_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path(), 2, 4).unwrap();
        let index = IVFIndex::train(&store, 1, TrainParams::new(0)).unwrap();
        assert_eq!(index.n_trained(), 0);
        assert!(index.inverted_lists().iter().all(Vec::is_empty));
    }
}
