//! Integration tests for the parallel task runner and per-worker pools.

use gridwalk_memory::{PoolConfig, PoolError, SlotAddr};
use gridwalk_parallel::{
    parallel_compute, parallel_compute_pooled, partition, ParallelError,
};
use proptest::prelude::*;

#[test]
fn test_each_worker_gets_a_private_pool() {
    let config = PoolConfig::for_object_size(16)
        .with_block_bytes(16 * 8)
        .with_initial_blocks(1);

    let reports = parallel_compute_pooled(&(), 40, 4, &config, |params, pool| {
        let addrs: Vec<SlotAddr> = params
            .tasks()
            .map(|_| pool.allocate().unwrap())
            .collect();
        params.processed = params.task_count();
        addrs
    })
    .unwrap();

    assert_eq!(reports.len(), 4);
    for report in &reports {
        let stats = report.pool.as_ref().unwrap();
        assert_eq!(report.output.len(), 10);
        assert_eq!(report.processed, 10);
        // 10 nodes in blocks of 8 slots: every worker grew its own pool once
        assert_eq!(stats.block_count, 2);
    }

    // no two workers ever saw the same Block
    let mut blocks: Vec<_> = reports
        .iter()
        .flat_map(|r| r.output.iter().map(|a| a.block()))
        .collect();
    blocks.sort_unstable();
    blocks.dedup();
    assert_eq!(blocks.len(), 8);
}

#[test]
fn test_worker_reclaims_between_queries() {
    let config = PoolConfig::for_object_size(8)
        .with_block_bytes(8 * 4)
        .with_initial_blocks(1);
    let queries_per_task = 3;

    let reports = parallel_compute_pooled(&queries_per_task, 8, 2, &config, |params, pool| {
        for _ in params.tasks() {
            for _ in 0..*params.shared {
                for _ in 0..4 {
                    let _ = pool.allocate().unwrap();
                }
                pool.reclaim();
            }
            params.processed += 1;
        }
        pool.block_count()
    })
    .unwrap();

    assert!(reports.iter().all(|r| r.output == 1 && r.processed == 4));
}

#[test]
fn test_invalid_pool_config_is_reported() {
    let config = PoolConfig::for_object_size(0);
    let result = parallel_compute_pooled(&(), 4, 2, &config, |_, _| ());
    assert!(matches!(
        result,
        Err(ParallelError::Pool(PoolError::InvalidConfig(_)))
    ));
}

#[test]
fn test_panicking_worker_is_reported() {
    let result = parallel_compute(&(), 4, 2, |params| {
        assert!(params.thread_id != 1, "worker one fails");
    });
    assert_eq!(result, Err(ParallelError::WorkerPanicked { thread_id: 1 }));
}

#[test]
fn test_reports_in_thread_order() {
    let reports = parallel_compute(&(), 9, 3, |params| params.thread_id).unwrap();
    let ids: Vec<u32> = reports.iter().map(|r| r.output).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(reports[2].tasks, 6..9);
}

proptest! {
    #[test]
    fn partition_covers_range_exactly(task_total in 0u32..10_000, threads in 1u32..64) {
        let slices = partition(task_total, threads);
        prop_assert_eq!(slices.len(), threads as usize);

        let mut next = 0;
        for slice in &slices {
            prop_assert_eq!(slice.start, next);
            next = slice.end;
        }
        prop_assert_eq!(next, task_total);

        let longest = slices.iter().map(|s| s.len()).max().unwrap_or(0);
        let shortest = slices.iter().map(|s| s.len()).min().unwrap_or(0);
        prop_assert!(longest - shortest <= 1);
    }
}
