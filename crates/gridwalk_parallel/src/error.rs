//! # Parallel Error Types

use gridwalk_memory::PoolError;
use thiserror::Error;

/// Errors that can occur while running a parallel computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParallelError {
    /// Asked to run with zero worker threads.
    #[error("at least one worker thread is required")]
    NoWorkers,

    /// A worker thread panicked before returning its output.
    #[error("worker thread {thread_id} panicked")]
    WorkerPanicked {
        /// Id of the thread that panicked.
        thread_id: u32,
    },

    /// A worker could not build its private pool.
    #[error("worker pool: {0}")]
    Pool(#[from] PoolError),
}

/// Result type for parallel computations.
pub type ParallelResult<T> = Result<T, ParallelError>;
