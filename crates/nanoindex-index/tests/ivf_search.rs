use nanoindex_core::distance::l2_sq_batch;
use nanoindex_index::{IVFIndex, TrainParams};
use nanoindex_store::DataStore;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashSet;

fn seeded_store(dir: &std::path::Path, dim: usize, vectors: &[f32], ids: &[i64]) -> DataStore {
    let mut store = DataStore::open(dir, dim, ids.len().max(1)).unwrap();
    store.add(vectors, ids).unwrap();
    store
}

#[test]
fn degenerate_single_cluster_matches_flat_scan() {
    let dir = tempfile::tempdir().unwrap();
    let dim = 2;
    let vectors = [0.0, 0.0, 5.0, 5.0, -3.0, 2.0, 1.0, 1.0];
    let ids = [10i64, 20, 30, 40];
    let store = seeded_store(dir.path(), dim, &vectors, &ids);

    let index = IVFIndex::train(&store, 1, TrainParams::new(0)).unwrap();
    let query = [1.0, 1.0];
    let ivf_results = index.search(&store, &query, 4, 1, 1_000_000, None).unwrap();

    let norms = store.norms_sq();
    let flat_dists = l2_sq_batch(&query, store.all_vectors(), Some(&norms));
    let mut flat_order: Vec<usize> = (0..4).collect();
    flat_order.sort_by(|&a, &b| {
        flat_dists[a]
            .partial_cmp(&flat_dists[b])
            .unwrap()
            .then_with(|| a.cmp(&b))
    });

    let ivf_order: Vec<usize> = ivf_results.iter().map(|r| r.row).collect();
    assert_eq!(ivf_order, flat_order);
}

#[test]
fn training_on_empty_store_yields_empty_search_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path(), 3, 4).unwrap();
    let index = IVFIndex::train(&store, 1, TrainParams::new(0)).unwrap();
    assert_eq!(index.n_trained(), 0);
    let results = index.search(&store, &[0.0, 0.0, 0.0], 5, 1, 1000, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn max_codes_bounds_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let dim = 1;
    let vectors: Vec<f32> = (0..200).map(|i| i as f32).collect();
    let ids: Vec<i64> = (0..200).collect();
    let store = seeded_store(dir.path(), dim, &vectors, &ids);

    let index = IVFIndex::train(&store, 4, TrainParams::new(3)).unwrap();
    let results = index
        .search(&store, &[0.0], 200, 4, 10, None)
        .unwrap();
    assert!(results.len() <= 10);
}

#[test]
fn rows_appended_after_training_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let dim = 1;
    let mut store = DataStore::open(dir.path(), dim, 8).unwrap();
    store.add(&[0.0, 1.0, 2.0], &[1, 2, 3]).unwrap();
    let index = IVFIndex::train(&store, 2, TrainParams::new(1)).unwrap();

    store.add(&[100.0], &[4]).unwrap();
    let results = index.search(&store, &[100.0], 4, 2, 1000, None).unwrap();
    assert!(results.iter().all(|r| r.row != 3));
}

#[test]
fn query_dimension_mismatch_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DataStore::open(dir.path(), 2, 4).unwrap();
    store.add(&[0.0, 0.0, 1.0, 1.0], &[1, 2]).unwrap();
    let index = IVFIndex::train(&store, 1, TrainParams::new(0)).unwrap();
    let err = index.search(&store, &[0.0, 0.0, 0.0], 1, 1, 1000, None);
    assert!(err.is_err());
}

#[test]
fn expired_deadline_discards_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    let dim = 1;
    let vectors: Vec<f32> = (0..50).map(|i| i as f32).collect();
    let ids: Vec<i64> = (0..50).collect();
    let store = seeded_store(dir.path(), dim, &vectors, &ids);
    let index = IVFIndex::train(&store, 4, TrainParams::new(1)).unwrap();

    let already_passed = std::time::Instant::now() - std::time::Duration::from_secs(1);
    let err = index.search(&store, &[0.0], 10, 4, 1000, Some(already_passed));
    assert!(err.is_err());
}

proptest! {
    /// spec.md §8: "after `train(K)`, the inverted lists partition
    /// `[0, N_trained)` exactly (disjoint union, every row present exactly
    /// once)". Exercised over randomly sized/dimensioned/seeded stores
    /// rather than one fixed shape.
    #[test]
    fn inverted_lists_partition_trained_rows_exactly(
        dim in 1usize..5,
        n in 1usize..60,
        k in 1usize..8,
        seed in any::<u64>(),
    ) {
        prop_assume!(k <= n);

        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let vectors: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(-50.0..50.0)).collect();
        let ids: Vec<i64> = (0..n as i64).collect();
        let store = seeded_store(dir.path(), dim, &vectors, &ids);

        let index = IVFIndex::train(&store, k, TrainParams::new(seed)).unwrap();

        let mut seen = HashSet::with_capacity(n);
        let mut total = 0usize;
        for list in index.inverted_lists() {
            for &row in list {
                prop_assert!(row < n, "row {} out of range for n_trained={}", row, n);
                prop_assert!(seen.insert(row), "row {} appears in more than one inverted list", row);
                total += 1;
            }
        }
        prop_assert_eq!(total, n);
        prop_assert_eq!(seen.len(), n);
    }
}
