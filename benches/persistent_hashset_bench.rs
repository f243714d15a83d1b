//! Benchmark for PersistentHashSet vs standard HashSet.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use keepsake::PersistentHashSet;
use std::collections::HashSet;
use std::hint::black_box;

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_insert");

    for size in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("PersistentHashSet", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut set = PersistentHashSet::empty();
                    for element in 0..size {
                        set = set.insert(black_box(element));
                    }
                    black_box(set)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("HashSet", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut set = HashSet::new();
                    for element in 0..size {
                        set.insert(black_box(element));
                    }
                    black_box(set)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// contains Benchmark
// =============================================================================

fn benchmark_contains(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_contains");

    for size in [100, 1000, 10000] {
        let persistent: PersistentHashSet<i32> = (0..size).collect();
        let standard: HashSet<i32> = (0..size).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentHashSet", size),
            &persistent,
            |bencher, set| {
                bencher.iter(|| {
                    for element in 0..size {
                        black_box(set.contains(&element));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("HashSet", size),
            &standard,
            |bencher, set| {
                bencher.iter(|| {
                    for element in 0..size {
                        black_box(set.contains(&element));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_insert, benchmark_contains);
criterion_main!(benches);
