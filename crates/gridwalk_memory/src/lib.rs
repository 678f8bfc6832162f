//! # Gridwalk Memory
//!
//! Fixed-size object pool for grid pathfinding search, designed for:
//! - One allocation per generated node, one free per pruned node
//! - O(1) allocate and free on the expansion hot path
//! - Cheap bulk reset between independent search queries
//!
//! ## Architecture Rules
//!
//! 1. **Blocks never move** - growing a pool adds Blocks, it never resizes one
//! 2. **Bump before reuse** - fresh space is consumed before freed slots
//! 3. **One pool per thread** - [`Pool`] is `Send` but not `Sync`
//!
//! ## Example
//!
//! ```rust
//! use gridwalk_memory::Pool;
//!
//! let mut nodes = Pool::new(32)?;
//! let a = nodes.allocate()?;
//! let b = nodes.allocate()?;
//! nodes.deallocate(a)?;
//!
//! // next query: drop every outstanding node at once
//! nodes.reclaim();
//! # let _ = b;
//! # Ok::<(), gridwalk_memory::PoolError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod config;
pub mod error;
pub mod pool;
pub mod typed;

pub use block::{Block, BlockId, BlockStats, SlotAddr};
pub use config::{PoolConfig, DEFAULT_BLOCK_BYTES, DEFAULT_INITIAL_BLOCKS};
pub use error::{PoolError, PoolResult};
pub use pool::{Pool, PoolStats};
pub use typed::TypedPool;
