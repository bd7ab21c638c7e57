//! Basic benchmarks for the `growing_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use growing_pool::GrowingPool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const MAX_ELEMENTS: usize = 65_536;
const BUCKET_SIZE: usize = 128;

type TestPool = GrowingPool<u64, MAX_ELEMENTS, BUCKET_SIZE>;

const TEST_VALUE: u64 = 1024;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp_basic");

    group.bench_function("build_empty", |b| {
        b.iter(|| drop(black_box(TestPool::new())));
    });

    group.bench_function("allocate_first", |b| {
        b.iter_custom(|iters| {
            let mut pools: Vec<_> = (0..iters).map(|_| TestPool::new()).collect();

            let start = Instant::now();

            for pool in &mut pools {
                _ = black_box(pool.allocate(black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("allocate_release_steady_state", |b| {
        let mut pool = TestPool::new();

        // Warm one bucket up front so the loop measures slot recycling,
        // not bucket materialization.
        let warm = pool.allocate(TEST_VALUE);

        b.iter(|| {
            let ptr = pool.allocate(black_box(TEST_VALUE));
            pool.release(ptr);
        });

        pool.release(warm);
    });

    group.bench_function("get", |b| {
        let mut pool = TestPool::new();
        let ptr = pool.allocate(TEST_VALUE);

        b.iter(|| black_box(*pool.get(black_box(&ptr))));

        pool.release(ptr);
    });

    group.bench_function("fill_and_drain_1024", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut pool = TestPool::new();

                let handles: Vec<_> = (0..1024).map(|i| pool.allocate(i)).collect();

                for ptr in handles {
                    pool.release(ptr);
                }

                drop(black_box(pool));
            }

            start.elapsed()
        });
    });

    group.finish();
}
