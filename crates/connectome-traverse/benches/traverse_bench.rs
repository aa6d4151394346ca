//! Criterion benchmarks for multistart traversal.
//!
//! Run with:
//! ```bash
//! cargo bench -p connectome-traverse
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use connectome_traverse::{
    to_markov_matrix, to_transmission_matrix, Cascade, DispatchConfig, RandomWalk,
    TraverseConfig, TraverseDispatcher,
};
use ndarray::Array2;

// ── helpers ──────────────────────────────────────────────────────────────────

/// Sparse pseudo-random connectome with ~8 out-edges per node.
fn connectome(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        let h = (i.wrapping_mul(2_654_435_761) ^ j.wrapping_mul(40_503)) % 1000;
        if i != j && h < (8_000 / n).max(1) { 1.0 + (h % 7) as f64 } else { 0.0 }
    })
}

fn config(n: usize) -> TraverseConfig {
    TraverseConfig {
        stop_nodes:  (n - n / 10..n).collect(),
        max_hops:    10,
        allow_loops: false,
        ..Default::default()
    }
}

// ── random walk ──────────────────────────────────────────────────────────────

fn bench_random_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse/random_walk");

    for &n in &[200usize, 1000] {
        let model = to_markov_matrix(&connectome(n)).unwrap();
        let cfg = config(n);
        let sources: Vec<usize> = (0..20).collect();

        for &parallel in &[false, true] {
            let td = TraverseDispatcher::new(
                RandomWalk::new(&model, &cfg).unwrap(),
                DispatchConfig { parallel, ..Default::default() },
            );
            let label = if parallel { "parallel" } else { "serial" };
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| td.multistart(&sources, 100).unwrap())
            });
        }
    }

    group.finish();
}

// ── cascade ──────────────────────────────────────────────────────────────────

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse/cascade");

    for &n in &[200usize, 1000] {
        let model = to_transmission_matrix(&connectome(n), 0.05).unwrap();
        let sources: Vec<usize> = (0..20).collect();

        for &simultaneous in &[true, false] {
            let cfg = TraverseConfig { simultaneous, ..config(n) };
            let td = TraverseDispatcher::new(
                Cascade::new(&model, &cfg).unwrap(),
                DispatchConfig { parallel: true, ..Default::default() },
            );
            let label = if simultaneous { "simultaneous" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| td.multistart(&sources, 100).unwrap())
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_random_walk, bench_cascade);
criterion_main!(benches);
