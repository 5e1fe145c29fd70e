//! Criterion benchmarks for the sampler and detector hot paths.
//!
//! Benchmarks:
//! 1. Sampler draw at the demo sample count
//! 2. ROC curve + AUC over pooled populations
//! 3. Full bundle (ranking once, curve + three operating points)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lsaprobe_core::detector::{evaluate, roc_curve, DetectorConfig};
use lsaprobe_core::rng::SeedHierarchy;
use lsaprobe_core::sampler::SamplerConfig;
use lsaprobe_core::PopulationPair;

fn make_pair(n: usize) -> PopulationPair {
    let mut rng = SeedHierarchy::default().sequential();
    SamplerConfig::default()
        .generate(0.6, n, &mut rng)
        .unwrap()
}

fn bench_sampler(c: &mut Criterion) {
    let config = SamplerConfig::default();
    let mut group = c.benchmark_group("sampler");
    for n in [500usize, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = SeedHierarchy::default().sequential();
            b.iter(|| config.generate(black_box(0.6), n, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_roc(c: &mut Criterion) {
    let mut group = c.benchmark_group("roc_curve");
    for n in [500usize, 5_000] {
        let pair = make_pair(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &pair, |b, pair| {
            b.iter(|| {
                roc_curve(
                    black_box(pair.members.as_slice()),
                    black_box(pair.non_members.as_slice()),
                    10,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_bundle(c: &mut Criterion) {
    let pair = make_pair(500);
    let config = DetectorConfig::default();
    c.bench_function("evaluate_bundle_500", |b| {
        b.iter(|| evaluate(0.6, black_box(&pair), &config).unwrap())
    });
}

criterion_group!(benches, bench_sampler, bench_roc, bench_bundle);
criterion_main!(benches);
