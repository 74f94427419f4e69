//! Criterion benchmarks for coupled-system stepping.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cadence_bench::{fan_in_profile, reference_profile};
use cadence_core::Timestamp;

fn bench_reference_profile(c: &mut Criterion) {
    let mut sim = reference_profile();
    sim.start(Timestamp::ZERO).unwrap();

    // Warm up: one instant so initial allocation is done.
    sim.step().unwrap();

    c.bench_function("reference_step", |b| {
        b.iter(|| {
            let out = sim.step().unwrap();
            black_box(&out);
        });
    });
}

fn bench_fan_in_64(c: &mut Criterion) {
    let mut sim = fan_in_profile(64);
    sim.start(Timestamp::ZERO).unwrap();
    sim.step().unwrap();

    c.bench_function("fan_in_64_step", |b| {
        b.iter(|| {
            let out = sim.step().unwrap();
            black_box(&out);
        });
    });
}

criterion_group!(benches, bench_reference_profile, bench_fan_in_64);
criterion_main!(benches);
