//! Expansion benchmarks
//!
//! Measures configuration-space expansion and population throughput for
//! growing parameter spaces, and the cost of truncating a large space.
//!
//! Run with: cargo bench --bench expansion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nfv_bench::config::ExpansionConfig;
use nfv_bench::experiment::{Experiment, ExperimentKind, RunIdCounter};
use nfv_bench::space::cartesian_product;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const DIMENSIONS: [usize; 3] = [2, 4, 6];

/// Experiment with `functions` functions, each sweeping cpu and memory
fn experiment(functions: usize) -> Value {
    let groups: Vec<Value> = (0..functions)
        .map(|i| {
            json!({
                "function": format!("vnf{i}"),
                "cpu_bw": {"min": 0.2, "max": 0.8, "step": 0.2},
                "mem_max": [256, 512]
            })
        })
        .collect();
    json!({
        "name": "bench",
        "repetitions": 2,
        "experiment_parameters": groups,
        "measurement_points": [{"name": "mp.in", "container": ["iperf", "pktgen"]}]
    })
}

/// Benchmark the raw Cartesian product
fn bench_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("cartesian_product");

    for dims in DIMENSIONS {
        let space: BTreeMap<String, Vec<u32>> =
            (0..dims).map(|i| (format!("k{i}"), vec![0, 1, 2, 3])).collect();
        group.bench_with_input(BenchmarkId::new("4_values", dims), &space, |b, space| {
            b.iter(|| cartesian_product(black_box(space)));
        });
    }

    group.finish();
}

/// Benchmark full population (space building, product, configurations)
fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");
    let config = ExpansionConfig::default();

    for functions in [1, 2, 3] {
        let raw = experiment(functions);
        group.bench_with_input(BenchmarkId::new("functions", functions), &raw, |b, raw| {
            b.iter(|| {
                let counter = RunIdCounter::new();
                let mut e = Experiment::new(ExperimentKind::Service, black_box(raw)).unwrap();
                let n = e.populate(&config, &counter).unwrap().len();
                n
            });
        });
    }

    group.finish();
}

/// Benchmark truncation of a large space (should not depend on full size)
fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncation");
    let raw = experiment(5);

    for max in [10, 100, 1000] {
        let config = ExpansionConfig::builder().max_experiments(max).build();
        group.bench_with_input(BenchmarkId::new("max_experiments", max), &config, |b, config| {
            b.iter(|| {
                let counter = RunIdCounter::new();
                let mut e = Experiment::new(ExperimentKind::Service, &raw).unwrap();
                let n = e.populate(black_box(config), &counter).unwrap().len();
                n
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_product, bench_populate, bench_truncation);
criterion_main!(benches);
