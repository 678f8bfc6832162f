//! # Task Partitioning
//!
//! The per-thread task descriptor and the split of a task range into
//! contiguous, disjoint slices.

use std::ops::Range;

/// What one worker thread is asked to do.
///
/// Handed to the worker by mutable reference; the worker bumps `processed`
/// as it finishes tasks.
#[derive(Debug)]
pub struct TaskParams<'a, S: ?Sized> {
    /// Id of this worker, `0..max_threads`.
    pub thread_id: u32,
    /// Number of workers in the computation.
    pub max_threads: u32,
    /// First task id of this worker's slice.
    pub first_id: u32,
    /// One past the last task id of this worker's slice.
    pub last_id: u32,
    /// Tasks this worker has completed so far.
    pub processed: u32,
    /// Read-only data shared by every worker.
    pub shared: &'a S,
}

impl<'a, S: ?Sized> TaskParams<'a, S> {
    pub(crate) fn new(thread_id: u32, max_threads: u32, tasks: Range<u32>, shared: &'a S) -> Self {
        Self {
            thread_id,
            max_threads,
            first_id: tasks.start,
            last_id: tasks.end,
            processed: 0,
            shared,
        }
    }

    /// Task ids assigned to this worker.
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> Range<u32> {
        self.first_id..self.last_id
    }

    /// Number of tasks assigned to this worker.
    #[inline]
    #[must_use]
    pub fn task_count(&self) -> u32 {
        self.last_id - self.first_id
    }
}

/// Splits `0..task_total` into `threads` contiguous slices.
///
/// Slice sizes differ by at most one; earlier slices take the remainder.
/// Returns an empty list for zero threads.
#[must_use]
pub fn partition(task_total: u32, threads: u32) -> Vec<Range<u32>> {
    if threads == 0 {
        return Vec::new();
    }

    let base = task_total / threads;
    let extra = task_total % threads;
    let mut start = 0;
    (0..threads)
        .map(|thread| {
            let len = base + u32::from(thread < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}
