//! Criterion benchmarks for the sweep hot paths in `ht-core`.
//!
//! Benchmarks `build_distribution`, `find_critical_value` and a full
//! `run_sweep` with one and several worker threads.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ht_core::measurement::{generate_samples, GenerateParams};
use ht_core::sweep::{build_distribution, find_critical_value};
use ht_core::{run_sweep, Hypothesis, HypothesisPair, SweepParams};

fn samples(rate: f64, count: usize, seed: u64) -> Vec<f64> {
    let params = GenerateParams::new(rate, count as i64, seed).unwrap();
    generate_samples(&params)
}

fn pair(count: usize) -> HypothesisPair {
    HypothesisPair::new(
        Hypothesis::from_parts(0, 1.0, samples(1.0, count, 1)),
        Hypothesis::from_parts(1, 1.5, samples(1.5, count, 2)),
    )
}

fn bench_build_distribution(c: &mut Criterion) {
    let n_exp = 1000;
    let pair = pair(n_exp * 64);
    let rates = pair.rates();

    let mut group = c.benchmark_group("sweep/build_distribution");
    for m in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("m", m), &m, |b, &m| {
            b.iter(|| {
                let d = build_distribution(black_box(&pair.h0), rates, m, n_exp);
                black_box(d.unwrap().len());
            })
        });
    }
    group.finish();
}

fn bench_find_critical_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep/find_critical_value");
    for n in [100usize, 1_000, 10_000] {
        let pair = pair(n * 4);
        let rates = pair.rates();
        let d0 = build_distribution(&pair.h0, rates, 4, n).unwrap();
        let d1 = build_distribution(&pair.h1, rates, 4, n).unwrap();

        group.bench_with_input(BenchmarkId::new("n", n), &(d0, d1), |b, (d0, d1)| {
            b.iter(|| {
                let cv = find_critical_value(black_box(d0.values()), black_box(d1.values()));
                black_box(cv.unwrap().alpha);
            })
        });
    }
    group.finish();
}

fn bench_run_sweep(c: &mut Criterion) {
    let n_exp = 500;
    let mpe = 40;
    let pair = pair(n_exp * mpe);

    let mut group = c.benchmark_group("sweep/run_sweep");
    group.sample_size(20);
    for jobs in [1usize, 4] {
        let params = SweepParams::new(n_exp, mpe, 1)
            .and_then(|p| p.with_jobs(jobs))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("jobs", jobs), &params, |b, params| {
            b.iter(|| {
                let curve = run_sweep(black_box(params), black_box(&pair), None);
                black_box(curve.unwrap().len());
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build_distribution,
    bench_find_critical_value,
    bench_run_sweep
);
criterion_main!(benches);
