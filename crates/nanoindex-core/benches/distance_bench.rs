use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nanoindex_core::distance::{l2_sq, l2_sq_batch, norm_sq};
use rand::Rng;

const DIM: usize = 128;
const N: usize = 10_000;

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();

    let q: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let matrix: Vec<f32> = (0..N * DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let norms: Vec<f32> = (0..N)
        .map(|i| norm_sq(&matrix[i * DIM..(i + 1) * DIM]))
        .collect();

    let mut group = c.benchmark_group("l2_sq_batch");

    group.bench_function("fused_with_cached_norms", |b| {
        b.iter(|| black_box(l2_sq_batch(black_box(&q), black_box(&matrix), Some(&norms))))
    });

    group.bench_function("fused_recompute_norms", |b| {
        b.iter(|| black_box(l2_sq_batch(black_box(&q), black_box(&matrix), None)))
    });

    group.bench_function("pairwise_loop", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(N);
            for i in 0..N {
                out.push(l2_sq(&q, &matrix[i * DIM..(i + 1) * DIM]));
            }
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
