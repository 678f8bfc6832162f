//! # Gridwalk Parallel
//!
//! Simple parallel computations for precompute jobs (labelling every node of
//! a map, solving a batch of scenario instances). Simple means no
//! synchronisation between threads: each worker gets a contiguous slice of
//! task ids, a shared read-only input and, if it needs node storage, its own
//! [`Pool`](gridwalk_memory::Pool).
//!
//! ## Example
//!
//! ```rust
//! use gridwalk_memory::PoolConfig;
//! use gridwalk_parallel::parallel_compute_pooled;
//!
//! let costs: Vec<u32> = (0..64).collect();
//! let config = PoolConfig::for_object_size(16).with_initial_blocks(1);
//!
//! let reports = parallel_compute_pooled(&costs[..], 64, 4, &config, |params, pool| {
//!     for _ in params.tasks() {
//!         let _node = pool.allocate().expect("node");
//!         params.processed += 1;
//!     }
//!     params.processed
//! })?;
//! assert_eq!(reports.iter().map(|r| r.output).sum::<u32>(), 64);
//! # Ok::<(), gridwalk_parallel::ParallelError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod compute;
pub mod error;
pub mod task;

pub use compute::{default_threads, parallel_compute, parallel_compute_pooled, WorkerReport};
pub use error::{ParallelError, ParallelResult};
pub use task::{partition, TaskParams};
