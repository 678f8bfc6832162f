//! # Block
//!
//! One contiguous region carved into equal-sized slots.
//!
//! Slots are handed out with a bump cursor until the region has been walked
//! once, then recycled from a LIFO stack of freed offsets. Both paths are O(1)
//! and neither touches the system allocator: the free stack is sized for the
//! worst case (every slot free at once) when the Block is created.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::error::{PoolError, PoolResult};

/// Source of process-unique Block identities.
static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one Block's backing buffer.
///
/// Never reused within a process, so an address issued by one pool can not be
/// mistaken for an address of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u64);

impl BlockId {
    fn next() -> Self {
        Self(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identity value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// Opaque address of one slot: the owning buffer plus a byte offset into it.
///
/// Stays valid until the owning Block is reclaimed or its pool is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotAddr {
    block: BlockId,
    offset: u32,
}

impl SlotAddr {
    /// The Block this address points into.
    #[inline]
    #[must_use]
    pub const fn block(self) -> BlockId {
        self.block
    }

    /// Byte offset of the slot from the start of its Block's region.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }
}

impl fmt::Display for SlotAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.block, self.offset)
    }
}

/// A fixed region of memory divided into `object_size` slots.
///
/// # Thread Safety
///
/// A Block has no interior synchronisation. It is owned by exactly one
/// [`Pool`](crate::Pool), which is itself confined to one thread at a time.
pub struct Block {
    id: BlockId,
    /// Backing storage, never resized after construction.
    region: Box<[u8]>,
    object_size: usize,
    /// Offset of the next never-used slot.
    bump_cursor: usize,
    /// Offsets released back to this Block, most recent last.
    free_offsets: Vec<u32>,
}

impl Block {
    /// Creates a Block for `object_size` slots out of `region_bytes` bytes.
    ///
    /// The region is rounded down to a whole number of slots. A region
    /// smaller than one object is widened to exactly one slot.
    pub fn new(object_size: usize, region_bytes: usize) -> PoolResult<Self> {
        if object_size == 0 {
            return Err(PoolError::InvalidConfig(
                "object size must be greater than zero".to_string(),
            ));
        }

        let mut region_len = region_bytes - region_bytes % object_size;
        if region_len < object_size {
            warn!(
                object_size,
                region_bytes, "region smaller than one object; using one slot"
            );
            region_len = object_size;
        }
        if u32::try_from(region_len).is_err() {
            return Err(PoolError::InvalidConfig(format!(
                "block region of {region_len} bytes exceeds the addressable range"
            )));
        }

        let capacity_slots = region_len / object_size;

        let mut region = Vec::new();
        region
            .try_reserve_exact(region_len)
            .map_err(|_| PoolError::OutOfMemory { bytes: region_len })?;
        region.resize(region_len, 0u8);

        let mut free_offsets = Vec::new();
        free_offsets
            .try_reserve_exact(capacity_slots)
            .map_err(|_| PoolError::OutOfMemory {
                bytes: capacity_slots * mem::size_of::<u32>(),
            })?;

        Ok(Self {
            id: BlockId::next(),
            region: region.into_boxed_slice(),
            object_size,
            bump_cursor: 0,
            free_offsets,
        })
    }

    /// Hands out one slot, or `None` if the Block is exhausted.
    ///
    /// Never-used space is always consumed before recycled slots.
    #[inline]
    pub fn allocate(&mut self) -> Option<SlotAddr> {
        if self.bump_cursor < self.region.len() {
            let offset = self.bump_cursor as u32;
            self.bump_cursor += self.object_size;
            return Some(self.addr(offset));
        }

        let offset = self.free_offsets.pop()?;
        Some(self.addr(offset))
    }

    /// Returns a slot to the free stack without validating it.
    ///
    /// The caller guarantees `addr` is outstanding. Freeing the same address
    /// twice is not detected unless the stack is already full, and makes a
    /// later `allocate` issue that slot twice. Addresses outside this Block
    /// are rejected and leave the Block untouched.
    #[inline]
    pub fn deallocate(&mut self, addr: SlotAddr) -> PoolResult<()> {
        if !self.contains(addr) {
            warn!(%addr, block = %self.id, "freeing memory outside the range of the block");
            return Err(PoolError::InvalidFree { addr });
        }
        if self.free_offsets.len() == self.capacity_slots() {
            warn!(%addr, "free stack already holds every slot");
            return Err(PoolError::DoubleFree { addr });
        }

        self.free_offsets.push(addr.offset);
        Ok(())
    }

    /// Returns a slot to the free stack after proving it is outstanding.
    ///
    /// Rejects misaligned offsets, offsets never issued since the last
    /// reclaim, and offsets already on the free stack. O(free-list depth).
    pub fn deallocate_checked(&mut self, addr: SlotAddr) -> PoolResult<()> {
        let offset = addr.offset as usize;
        if !self.contains(addr) || offset % self.object_size != 0 || offset >= self.bump_cursor {
            warn!(%addr, block = %self.id, "freeing an address this block never issued");
            return Err(PoolError::InvalidFree { addr });
        }
        if self.free_offsets.contains(&addr.offset) {
            warn!(%addr, "double free");
            return Err(PoolError::DoubleFree { addr });
        }

        self.free_offsets.push(addr.offset);
        Ok(())
    }

    /// O(1) test for whether `addr` lies inside this Block's region.
    #[inline]
    #[must_use]
    pub fn contains(&self, addr: SlotAddr) -> bool {
        addr.block == self.id && (addr.offset as usize) < self.region.len()
    }

    /// Invalidates every outstanding slot. Memory is kept.
    #[inline]
    pub fn reclaim(&mut self) {
        self.bump_cursor = 0;
        self.free_offsets.clear();
    }

    /// Bytes of the slot at `addr`, if it is a slot of this Block.
    #[must_use]
    pub fn bytes(&self, addr: SlotAddr) -> Option<&[u8]> {
        let start = self.slot_start(addr)?;
        self.region.get(start..start + self.object_size)
    }

    /// Mutable bytes of the slot at `addr`, if it is a slot of this Block.
    pub fn bytes_mut(&mut self, addr: SlotAddr) -> Option<&mut [u8]> {
        let start = self.slot_start(addr)?;
        let end = start + self.object_size;
        self.region.get_mut(start..end)
    }

    /// Address of the first slot in the region.
    #[inline]
    #[must_use]
    pub const fn first_addr(&self) -> SlotAddr {
        self.addr(0)
    }

    /// Identity of the backing buffer.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Size of every slot in bytes.
    #[inline]
    #[must_use]
    pub const fn object_size(&self) -> usize {
        self.object_size
    }

    /// Region length in bytes (a multiple of the object size).
    #[inline]
    #[must_use]
    pub fn region_bytes(&self) -> usize {
        self.region.len()
    }

    /// Number of slots in the region.
    #[inline]
    #[must_use]
    pub fn capacity_slots(&self) -> usize {
        self.region.len() / self.object_size
    }

    /// Offset of the next never-used slot.
    #[inline]
    #[must_use]
    pub const fn bump_cursor(&self) -> usize {
        self.bump_cursor
    }

    /// Number of released slots waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_list_depth(&self) -> usize {
        self.free_offsets.len()
    }

    /// True when `allocate` would return `None`.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.bump_cursor >= self.region.len() && self.free_offsets.is_empty()
    }

    /// Bytes held by this Block: header, region and worst-case free stack.
    #[must_use]
    pub fn memory_footprint(&self) -> usize {
        mem::size_of::<Self>()
            + self.region.len()
            + self.free_offsets.capacity() * mem::size_of::<u32>()
    }

    /// Read-only statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> BlockStats {
        BlockStats {
            id: self.id,
            object_size: self.object_size,
            region_bytes: self.region.len(),
            capacity_slots: self.capacity_slots(),
            bump_cursor: self.bump_cursor,
            free_list_depth: self.free_offsets.len(),
            memory_footprint: self.memory_footprint(),
        }
    }

    #[inline]
    const fn addr(&self, offset: u32) -> SlotAddr {
        SlotAddr {
            block: self.id,
            offset,
        }
    }

    fn slot_start(&self, addr: SlotAddr) -> Option<usize> {
        let start = addr.offset as usize;
        (self.contains(addr) && start % self.object_size == 0).then_some(start)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} region_bytes: {} object_size: {} free_list_depth: {}",
            self.id,
            self.region.len(),
            self.object_size,
            self.free_offsets.len()
        )
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("region_bytes", &self.region.len())
            .field("object_size", &self.object_size)
            .field("bump_cursor", &self.bump_cursor)
            .field("free_list_depth", &self.free_offsets.len())
            .finish()
    }
}

/// Point-in-time view of one Block, for telemetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockStats {
    /// Identity of the backing buffer.
    pub id: BlockId,
    /// Slot size in bytes.
    pub object_size: usize,
    /// Region length in bytes.
    pub region_bytes: usize,
    /// Number of slots in the region.
    pub capacity_slots: usize,
    /// Offset of the next never-used slot.
    pub bump_cursor: usize,
    /// Released slots waiting for reuse.
    pub free_list_depth: usize,
    /// Total bytes held by the Block.
    pub memory_footprint: usize,
}
