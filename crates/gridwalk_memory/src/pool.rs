//! # Pool
//!
//! Fixed-size object allocator backed by a growable list of [`Block`]s.
//!
//! Search nodes are allocated on every expansion and released on every
//! prune, so the hot path is a single bump or pop inside the cached current
//! Block. Everything slower (scanning, growing) lives behind `#[cold]`.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;

use tracing::{debug, trace, warn};

use crate::block::{Block, BlockStats, SlotAddr};
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};

/// A pool of fixed-size slots.
///
/// Slots are handed out as opaque [`SlotAddr`] handles. A handle stays valid
/// until [`Pool::reclaim`] or until the pool is dropped; growing the pool
/// never moves or resizes an existing Block.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe and is `!Sync` by construction. It can be
/// moved to another thread, so the intended pattern is one pool per worker.
///
/// # Example
///
/// ```rust
/// use gridwalk_memory::Pool;
///
/// let mut pool = Pool::with_max_blocks(32, 1)?;
/// let addr = pool.allocate()?;
/// pool.bytes_mut(addr).unwrap().fill(7);
/// pool.deallocate(addr)?;
/// # Ok::<(), gridwalk_memory::PoolError>(())
/// ```
pub struct Pool {
    /// Blocks in creation order.
    blocks: Vec<Block>,
    /// Index of the Block last known to have room. A cache only.
    current: usize,
    object_size: usize,
    /// Region size for every Block this pool creates.
    block_bytes: usize,
    /// Capacity of the Block reference array. Doubles when full.
    max_blocks: usize,
    _not_sync: PhantomData<Cell<()>>,
}

impl Pool {
    /// Creates a pool for `object_size` objects with default sizing.
    pub fn new(object_size: usize) -> PoolResult<Self> {
        Self::with_config(&PoolConfig::for_object_size(object_size))
    }

    /// Creates a pool that pre-creates `max_blocks` Blocks.
    pub fn with_max_blocks(object_size: usize, max_blocks: usize) -> PoolResult<Self> {
        Self::with_config(&PoolConfig::for_object_size(object_size).with_initial_blocks(max_blocks))
    }

    /// Creates a pool from an explicit configuration.
    pub fn with_config(config: &PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let block_bytes = config.effective_block_bytes();
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(config.initial_blocks)
            .map_err(|_| PoolError::OutOfMemory {
                bytes: config.initial_blocks * mem::size_of::<Block>(),
            })?;
        for _ in 0..config.initial_blocks {
            blocks.push(Block::new(config.object_size, block_bytes)?);
        }

        debug!(
            object_size = config.object_size,
            block_bytes,
            blocks = blocks.len(),
            "pool created"
        );

        Ok(Self {
            blocks,
            current: 0,
            object_size: config.object_size,
            block_bytes,
            max_blocks: config.initial_blocks,
            _not_sync: PhantomData,
        })
    }

    /// Allocates one slot.
    ///
    /// Tries the current Block, then every Block in creation order
    /// (first fit), then grows by one Block. Only fails if the system can
    /// not supply memory for that Block.
    #[inline]
    pub fn allocate(&mut self) -> PoolResult<SlotAddr> {
        if let Some(addr) = self.blocks.get_mut(self.current).and_then(Block::allocate) {
            return Ok(addr);
        }
        self.allocate_slow()
    }

    #[cold]
    fn allocate_slow(&mut self) -> PoolResult<SlotAddr> {
        // NB: linear scan; raise block_bytes if the block count grows large
        for (index, block) in self.blocks.iter_mut().enumerate() {
            if let Some(addr) = block.allocate() {
                self.current = index;
                return Ok(addr);
            }
        }

        self.add_block()?;
        self.current = self.blocks.len() - 1;
        self.blocks
            .get_mut(self.current)
            .and_then(Block::allocate)
            .ok_or(PoolError::OutOfMemory {
                bytes: self.block_bytes,
            })
    }

    /// Returns a slot to the Block that issued it.
    ///
    /// Unchecked fast path: freeing an address twice is not detected and
    /// leads to the slot being issued twice. An address no Block owns is
    /// reported as [`PoolError::InvalidFree`] and changes nothing.
    ///
    /// With the `checked` feature this is [`Pool::deallocate_checked`].
    #[inline]
    pub fn deallocate(&mut self, addr: SlotAddr) -> PoolResult<()> {
        if cfg!(feature = "checked") {
            return self.deallocate_checked(addr);
        }
        match self.owner_mut(addr) {
            Some(block) => block.deallocate(addr),
            None => Err(self.invalid_free(addr)),
        }
    }

    /// Returns a slot after proving it is outstanding.
    ///
    /// Detects double frees and addresses never issued since the last
    /// reclaim. Costs O(free-list depth) on top of the Block scan.
    pub fn deallocate_checked(&mut self, addr: SlotAddr) -> PoolResult<()> {
        match self.owner_mut(addr) {
            Some(block) => block.deallocate_checked(addr),
            None => Err(self.invalid_free(addr)),
        }
    }

    /// Invalidates every outstanding slot in every Block. Memory is kept.
    ///
    /// The next allocation is served from the first address of the first
    /// Block.
    pub fn reclaim(&mut self) {
        for block in &mut self.blocks {
            block.reclaim();
        }
        self.current = 0;
        trace!(blocks = self.blocks.len(), "pool reclaimed");
    }

    /// Bytes of the slot at `addr`, if this pool owns it.
    #[must_use]
    pub fn bytes(&self, addr: SlotAddr) -> Option<&[u8]> {
        self.owner(addr)?.bytes(addr)
    }

    /// Mutable bytes of the slot at `addr`, if this pool owns it.
    pub fn bytes_mut(&mut self, addr: SlotAddr) -> Option<&mut [u8]> {
        self.owner_mut(addr)?.bytes_mut(addr)
    }

    /// True if some Block of this pool contains `addr`.
    #[inline]
    #[must_use]
    pub fn contains(&self, addr: SlotAddr) -> bool {
        self.owner(addr).is_some()
    }

    /// Index (creation order) of the Block containing `addr`.
    #[must_use]
    pub fn block_index_of(&self, addr: SlotAddr) -> Option<usize> {
        self.blocks.iter().position(|block| block.contains(addr))
    }

    /// Size of every object in bytes.
    #[inline]
    #[must_use]
    pub const fn object_size(&self) -> usize {
        self.object_size
    }

    /// Region size new Blocks are created with.
    #[inline]
    #[must_use]
    pub const fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Number of Blocks owned.
    #[inline]
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Capacity of the Block reference array.
    #[inline]
    #[must_use]
    pub const fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Blocks in creation order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total bytes held: every Block plus the reference array and the pool
    /// itself.
    #[must_use]
    pub fn memory_footprint(&self) -> usize {
        let blocks: usize = self.blocks.iter().map(Block::memory_footprint).sum();
        let spare_refs = (self.max_blocks - self.blocks.len()) * mem::size_of::<Block>();
        blocks + spare_refs + mem::size_of::<Self>()
    }

    /// Read-only statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            object_size: self.object_size,
            block_bytes: self.block_bytes,
            block_count: self.blocks.len(),
            max_blocks: self.max_blocks,
            blocks: self.blocks.iter().map(Block::stats).collect(),
            memory_footprint: self.memory_footprint(),
        }
    }

    fn owner(&self, addr: SlotAddr) -> Option<&Block> {
        self.blocks.iter().find(|block| block.contains(addr))
    }

    fn owner_mut(&mut self, addr: SlotAddr) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.contains(addr))
    }

    #[cold]
    fn invalid_free(&self, addr: SlotAddr) -> PoolError {
        warn!(
            %addr,
            object_size = self.object_size,
            blocks = self.blocks.len(),
            "tried to free an address not in any block"
        );
        PoolError::InvalidFree { addr }
    }

    fn add_block(&mut self) -> PoolResult<()> {
        if self.blocks.len() == self.max_blocks {
            self.grow_references()?;
        }
        let block = Block::new(self.object_size, self.block_bytes)?;
        self.blocks.push(block);
        debug!(
            object_size = self.object_size,
            blocks = self.blocks.len(),
            "pool grew by one block"
        );
        Ok(())
    }

    /// Doubles the reference array. Block regions are untouched, so no
    /// issued address changes.
    fn grow_references(&mut self) -> PoolResult<()> {
        let grown = self.max_blocks * 2;
        self.blocks
            .try_reserve_exact(grown - self.blocks.len())
            .map_err(|_| PoolError::OutOfMemory {
                bytes: grown * mem::size_of::<Block>(),
            })?;
        debug!(from = self.max_blocks, to = grown, "block reference array doubled");
        self.max_blocks = grown;
        Ok(())
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("object_size", &self.object_size)
            .field("block_bytes", &self.block_bytes)
            .field("blocks", &self.blocks)
            .field("current", &self.current)
            .field("max_blocks", &self.max_blocks)
            .finish()
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pool blocks: {} max_blocks: {} object_size: {}",
            self.blocks.len(),
            self.max_blocks,
            self.object_size
        )?;
        for block in &self.blocks {
            writeln!(f, "  {block}")?;
        }
        Ok(())
    }
}

/// Point-in-time view of a pool, for telemetry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Slot size in bytes.
    pub object_size: usize,
    /// Region size of Blocks this pool creates.
    pub block_bytes: usize,
    /// Number of Blocks owned.
    pub block_count: usize,
    /// Capacity of the Block reference array.
    pub max_blocks: usize,
    /// Per-Block statistics, in creation order.
    pub blocks: Vec<BlockStats>,
    /// Total bytes held by the pool.
    pub memory_footprint: usize,
}

impl PoolStats {
    /// Total released slots waiting for reuse across all Blocks.
    #[must_use]
    pub fn free_list_depth(&self) -> usize {
        self.blocks.iter().map(|b| b.free_list_depth).sum()
    }
}
