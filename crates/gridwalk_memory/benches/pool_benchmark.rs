//! # Pool Benchmark
//!
//! Measures the node expansion hot path:
//! 1. Bump allocation from a warm Block
//! 2. Free/allocate churn served from the LIFO free list
//! 3. Reclaim between queries
//! 4. Baseline: one `Box` per node from the system allocator
//!
//! Target: allocate + free under 5ns on the warm path.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridwalk_memory::{Pool, PoolConfig, SlotAddr};

/// Typical search node: id, g, f, parent, flags.
const NODE_SIZE: usize = 32;

fn fresh_pool() -> Pool {
    Pool::with_config(&PoolConfig::for_object_size(NODE_SIZE).with_initial_blocks(4))
        .expect("pool")
}

fn bench_bump_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_bump_allocate");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut pool = fresh_pool();
            b.iter(|| {
                pool.reclaim();
                for _ in 0..count {
                    black_box(pool.allocate().expect("allocate"));
                }
            });
        });
    }

    group.finish();
}

fn bench_free_list_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_free_list_churn");
    let live = 65_536;

    group.throughput(Throughput::Elements(live as u64));
    group.bench_function("free_then_reallocate", |b| {
        let mut pool = Pool::with_max_blocks(NODE_SIZE, 1).expect("pool");
        let mut addrs: Vec<SlotAddr> = (0..live).map(|_| pool.allocate().expect("allocate")).collect();
        b.iter(|| {
            for addr in addrs.drain(..) {
                pool.deallocate(addr).expect("deallocate");
            }
            for _ in 0..live {
                addrs.push(pool.allocate().expect("allocate"));
            }
        });
    });

    group.finish();
}

fn bench_reclaim(c: &mut Criterion) {
    c.bench_function("pool_reclaim_20_blocks", |b| {
        let mut pool = Pool::new(NODE_SIZE).expect("pool");
        b.iter(|| {
            for _ in 0..1_000 {
                black_box(pool.allocate().expect("allocate"));
            }
            pool.reclaim();
        });
    });
}

fn bench_box_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_baseline");
    let count = 10_000;

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("box_per_node", |b| {
        b.iter(|| {
            let nodes: Vec<Box<[u8; NODE_SIZE]>> =
                (0..count).map(|_| Box::new([0u8; NODE_SIZE])).collect();
            black_box(nodes);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bump_allocate,
    bench_free_list_churn,
    bench_reclaim,
    bench_box_baseline
);
criterion_main!(benches);
