//! # Pool Error Types
//!
//! Everything the pool reports to its caller. Block exhaustion is not in
//! here: it is a routing signal between a Block and its Pool, never an error.

use thiserror::Error;

use crate::block::SlotAddr;

/// Errors that can occur in the pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Every Block was exhausted and the system refused memory for a new one.
    #[error("out of memory: could not reserve {bytes} bytes for a new block")]
    OutOfMemory {
        /// Size of the reservation that failed.
        bytes: usize,
    },

    /// Freed an address that no Block of this pool ever issued.
    #[error("invalid free: {addr} is not owned by any block in this pool")]
    InvalidFree {
        /// The offending address.
        addr: SlotAddr,
    },

    /// Freed an address that is already on its Block's free list.
    ///
    /// Only the checked deallocation path detects this.
    #[error("double free: {addr} is already on the free list")]
    DoubleFree {
        /// The offending address.
        addr: SlotAddr,
    },

    /// Pool configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
