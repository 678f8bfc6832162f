//! # Typed Pool
//!
//! A [`Pool`] whose slots hold one plain-old-data `T` each. Search nodes,
//! labels and other fixed-size records are written into the slot by value
//! and read back by value; no pointer casts are involved.

use std::marker::PhantomData;
use std::mem;

use bytemuck::Pod;

use crate::block::SlotAddr;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::{Pool, PoolStats};

/// A pool of `T`-sized slots.
///
/// # Example
///
/// ```rust
/// use gridwalk_memory::TypedPool;
///
/// #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
/// #[repr(C)]
/// struct Node { id: u32, g: u32, parent: u32, flags: u32 }
///
/// let mut nodes: TypedPool<Node> = TypedPool::with_max_blocks(1)?;
/// let addr = nodes.alloc(Node { id: 7, g: 0, parent: u32::MAX, flags: 0 })?;
/// assert_eq!(nodes.get(addr).map(|n| n.id), Some(7));
/// # Ok::<(), gridwalk_memory::PoolError>(())
/// ```
pub struct TypedPool<T: Pod> {
    pool: Pool,
    _marker: PhantomData<T>,
}

impl<T: Pod> TypedPool<T> {
    /// Creates a pool with default sizing.
    pub fn new() -> PoolResult<Self> {
        Self::with_config(&PoolConfig::for_object_size(mem::size_of::<T>()))
    }

    /// Creates a pool that pre-creates `max_blocks` Blocks.
    pub fn with_max_blocks(max_blocks: usize) -> PoolResult<Self> {
        Self::with_config(
            &PoolConfig::for_object_size(mem::size_of::<T>()).with_initial_blocks(max_blocks),
        )
    }

    /// Creates a pool from a configuration whose object size is `size_of::<T>()`.
    pub fn with_config(config: &PoolConfig) -> PoolResult<Self> {
        if config.object_size != mem::size_of::<T>() {
            return Err(PoolError::InvalidConfig(format!(
                "object_size {} does not match the {} byte element type",
                config.object_size,
                mem::size_of::<T>()
            )));
        }
        Ok(Self {
            pool: Pool::with_config(config)?,
            _marker: PhantomData,
        })
    }

    /// Allocates a slot and writes `value` into it.
    pub fn alloc(&mut self, value: T) -> PoolResult<SlotAddr> {
        let addr = self.pool.allocate()?;
        let bytes = self
            .pool
            .bytes_mut(addr)
            .ok_or(PoolError::InvalidFree { addr })?;
        bytes.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(addr)
    }

    /// Reads the value stored at `addr`.
    ///
    /// Returns `None` for addresses this pool does not own. A reclaimed or
    /// freed slot still reads back whatever bytes it last held.
    #[must_use]
    pub fn get(&self, addr: SlotAddr) -> Option<T> {
        self.pool.bytes(addr).map(bytemuck::pod_read_unaligned)
    }

    /// Overwrites the value at `addr`. Returns false if the pool does not
    /// own `addr`.
    pub fn set(&mut self, addr: SlotAddr, value: T) -> bool {
        match self.pool.bytes_mut(addr) {
            Some(bytes) => {
                bytes.copy_from_slice(bytemuck::bytes_of(&value));
                true
            }
            None => false,
        }
    }

    /// Releases the slot at `addr`. See [`Pool::deallocate`].
    pub fn free(&mut self, addr: SlotAddr) -> PoolResult<()> {
        self.pool.deallocate(addr)
    }

    /// Invalidates every outstanding slot. See [`Pool::reclaim`].
    pub fn reclaim(&mut self) {
        self.pool.reclaim();
    }

    /// Total bytes held by the underlying pool.
    #[must_use]
    pub fn memory_footprint(&self) -> usize {
        self.pool.memory_footprint()
    }

    /// Statistics of the underlying pool.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The untyped pool underneath.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Label {
        id: u32,
        cost: f32,
        parent: u64,
    }

    fn label(id: u32) -> Label {
        Label {
            id,
            cost: id as f32 * 1.5,
            parent: u64::from(id) << 32,
        }
    }

    #[test]
    fn test_typed_pool_round_trip() {
        let mut pool: TypedPool<Label> = TypedPool::with_max_blocks(1).unwrap();
        let addrs: Vec<SlotAddr> = (0..100).map(|i| pool.alloc(label(i)).unwrap()).collect();

        for (i, addr) in addrs.iter().enumerate() {
            assert_eq!(pool.get(*addr), Some(label(i as u32)));
        }
    }

    #[test]
    fn test_typed_pool_reclaim_keeps_footprint() {
        let mut pool: TypedPool<Label> = TypedPool::new().unwrap();
        assert_eq!(pool.pool().object_size(), mem::size_of::<Label>());

        for i in 0..10 {
            let _ = pool.alloc(label(i)).unwrap();
        }
        let footprint = pool.memory_footprint();

        pool.reclaim();
        assert_eq!(pool.memory_footprint(), footprint);

        let first = pool.pool().blocks()[0].first_addr();
        let addr = pool.alloc(label(42)).unwrap();
        assert_eq!(addr, first);
        assert_eq!(pool.get(addr), Some(label(42)));
    }

    #[test]
    fn test_typed_pool_alloc_writes_every_slot() {
        let config = PoolConfig::for_object_size(mem::size_of::<Label>())
            .with_block_bytes(mem::size_of::<Label>() * 2)
            .with_initial_blocks(1);
        let mut pool: TypedPool<Label> = TypedPool::with_config(&config).unwrap();

        let addrs: Vec<SlotAddr> = (0..5).map(|i| pool.alloc(label(i)).unwrap()).collect();
        assert_eq!(pool.stats().block_count, 3);
        for (i, addr) in addrs.iter().enumerate() {
            assert_eq!(pool.get(*addr), Some(label(i as u32)));
        }
    }

    #[test]
    fn test_typed_pool_set_and_free() {
        let mut pool: TypedPool<Label> = TypedPool::with_max_blocks(1).unwrap();
        let addr = pool.alloc(label(1)).unwrap();

        assert!(pool.set(addr, label(9)));
        assert_eq!(pool.get(addr), Some(label(9)));
        pool.free(addr).unwrap();
        assert_eq!(pool.stats().free_list_depth(), 1);
    }

    #[test]
    fn test_typed_pool_foreign_address() {
        let mut pool: TypedPool<Label> = TypedPool::with_max_blocks(1).unwrap();
        let mut other: TypedPool<Label> = TypedPool::with_max_blocks(1).unwrap();
        let foreign = other.alloc(label(3)).unwrap();

        assert_eq!(pool.get(foreign), None);
        assert!(!pool.set(foreign, label(4)));
        assert!(matches!(pool.free(foreign), Err(PoolError::InvalidFree { .. })));
    }

    #[test]
    fn test_typed_pool_rejects_mismatched_size() {
        let config = PoolConfig::for_object_size(3).with_initial_blocks(1);
        assert!(matches!(
            TypedPool::<Label>::with_config(&config),
            Err(PoolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_typed_pool_rejects_zero_sized() {
        assert!(matches!(
            TypedPool::<()>::with_max_blocks(1),
            Err(PoolError::InvalidConfig(_))
        ));
    }
}
