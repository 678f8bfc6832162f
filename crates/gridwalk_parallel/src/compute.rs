//! # Parallel Compute
//!
//! Runs one worker closure per thread over disjoint task slices. Workers do
//! not talk to each other: they read `shared`, write their own output and,
//! in the pooled variant, allocate from their own private [`Pool`].

use std::num::NonZeroUsize;
use std::ops::Range;
use std::thread;

use gridwalk_memory::{Pool, PoolConfig, PoolStats};
use tracing::debug;

use crate::error::{ParallelError, ParallelResult};
use crate::task::{partition, TaskParams};

/// Output of one worker thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport<R> {
    /// Id of the worker.
    pub thread_id: u32,
    /// Task ids the worker was assigned.
    pub tasks: Range<u32>,
    /// Tasks the worker reported as processed.
    pub processed: u32,
    /// Statistics of the worker's private pool, if it had one.
    pub pool: Option<PoolStats>,
    /// Whatever the worker returned.
    pub output: R,
}

/// Number of hardware threads, or 1 if it can not be determined.
#[must_use]
pub fn default_threads() -> u32 {
    thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .try_into()
        .unwrap_or(u32::MAX)
}

/// Runs `worker` on `threads` threads over `0..task_total`.
///
/// Reports come back in thread-id order. A panicking worker turns the whole
/// computation into [`ParallelError::WorkerPanicked`] once every thread has
/// finished.
pub fn parallel_compute<S, R, F>(
    shared: &S,
    task_total: u32,
    threads: u32,
    worker: F,
) -> ParallelResult<Vec<WorkerReport<R>>>
where
    S: Sync + ?Sized,
    R: Send,
    F: Fn(&mut TaskParams<'_, S>) -> R + Sync,
{
    run(shared, task_total, threads, |params| Ok((worker(params), None)))
}

/// Like [`parallel_compute`], but every worker gets a private [`Pool`] built
/// from `config` inside its own thread.
///
/// The pool lives exactly as long as the worker; its final statistics are
/// attached to the report.
pub fn parallel_compute_pooled<S, R, F>(
    shared: &S,
    task_total: u32,
    threads: u32,
    config: &PoolConfig,
    worker: F,
) -> ParallelResult<Vec<WorkerReport<R>>>
where
    S: Sync + ?Sized,
    R: Send,
    F: Fn(&mut TaskParams<'_, S>, &mut Pool) -> R + Sync,
{
    config.validate()?;
    run(shared, task_total, threads, |params| {
        let mut pool = Pool::with_config(config)?;
        let output = worker(params, &mut pool);
        Ok((output, Some(pool.stats())))
    })
}

type WorkerOutput<R> = ParallelResult<(R, Option<PoolStats>)>;
type Joined<R> = (u32, Range<u32>, thread::Result<(u32, WorkerOutput<R>)>);

fn run<S, R, F>(
    shared: &S,
    task_total: u32,
    threads: u32,
    body: F,
) -> ParallelResult<Vec<WorkerReport<R>>>
where
    S: Sync + ?Sized,
    R: Send,
    F: Fn(&mut TaskParams<'_, S>) -> WorkerOutput<R> + Sync,
{
    if threads == 0 {
        return Err(ParallelError::NoWorkers);
    }

    let slices = partition(task_total, threads);
    let body = &body;

    let joined: Vec<Joined<R>> = thread::scope(|scope| {
        let handles: Vec<_> = slices
            .into_iter()
            .zip(0..threads)
            .map(|(tasks, thread_id)| {
                let slice = tasks.clone();
                let handle = scope.spawn(move || {
                    let mut params = TaskParams::new(thread_id, threads, slice, shared);
                    let output = body(&mut params);
                    (params.processed, output)
                });
                (thread_id, tasks, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(thread_id, tasks, handle)| (thread_id, tasks, handle.join()))
            .collect()
    });

    let mut reports = Vec::with_capacity(joined.len());
    for (thread_id, tasks, result) in joined {
        let (processed, output) = result.map_err(|_| ParallelError::WorkerPanicked { thread_id })?;
        let (output, pool) = output?;
        debug!(
            thread_id,
            first_id = tasks.start,
            last_id = tasks.end,
            processed,
            pool_bytes = pool.as_ref().map_or(0, |p| p.memory_footprint),
            "worker finished"
        );
        reports.push(WorkerReport {
            thread_id,
            tasks,
            processed,
            pool,
            output,
        });
    }
    Ok(reports)
}
