//! Growable descriptor-pool allocator
//!
//! Batches many small descriptor-set allocations into coarse fixed-capacity
//! pools. When the active pool runs out (or fragments), the allocator grabs
//! a pool — recycled from the free list if possible, freshly created
//! otherwise — and retries exactly once. `reset_pools` is the O(1)
//! bulk-recycle path for per-frame or per-pass transient sets.

use crate::descriptor::device::{DescriptorDevice, PoolSize, SetAllocError};
use crate::descriptor::types::DescriptorType;
use crate::error::{Error, Result};

/// Fixed per-pool set capacity
pub const MAX_SETS_PER_POOL: u32 = 1024;

/// Per-type capacity weights for every pool this allocator creates
pub const POOL_SIZES: [PoolSize; 4] = [
    PoolSize {
        descriptor_type: DescriptorType::CombinedImageSampler,
        count: 2048,
    },
    PoolSize {
        descriptor_type: DescriptorType::UniformBuffer,
        count: 1024,
    },
    PoolSize {
        descriptor_type: DescriptorType::UniformBufferDynamic,
        count: 512,
    },
    PoolSize {
        descriptor_type: DescriptorType::StorageBuffer,
        count: 1024,
    },
];

/// Pools descriptor-set allocations; one instance per device.
///
/// A pool is in exactly one of three places: `current` (accepting new
/// allocations), `used` (holds live allocations, no longer current), or
/// `free` (reset, available for reuse).
pub struct DescriptorAllocator<D: DescriptorDevice> {
    current_pool: Option<D::Pool>,
    used_pools: Vec<D::Pool>,
    free_pools: Vec<D::Pool>,
}

impl<D: DescriptorDevice> DescriptorAllocator<D> {
    /// Create an allocator with no pools; the first allocation creates one
    pub fn new() -> Self {
        Self {
            current_pool: None,
            used_pools: Vec::new(),
            free_pools: Vec::new(),
        }
    }

    /// Take a pool from the free list, or create a fresh one
    fn grab_pool(&mut self, device: &mut D) -> Result<D::Pool> {
        match self.free_pools.pop() {
            Some(pool) => Ok(pool),
            None => device.create_pool(MAX_SETS_PER_POOL, &POOL_SIZES),
        }
    }

    /// Allocate one descriptor set for `layout`.
    ///
    /// On pool exhaustion or fragmentation the current pool is retired to
    /// the used list and the allocation retries exactly once against a
    /// grabbed pool. A second capacity failure surfaces as
    /// [`Error::OutOfPoolMemory`]; device-level failures propagate
    /// unchanged.
    pub fn allocate(&mut self, device: &mut D, layout: D::Layout) -> Result<D::Set> {
        let pool = match self.current_pool {
            Some(pool) => pool,
            None => {
                let pool = self.grab_pool(device)?;
                self.current_pool = Some(pool);
                pool
            }
        };

        match device.allocate_set(pool, layout) {
            Ok(set) => Ok(set),
            Err(SetAllocError::OutOfPoolMemory) | Err(SetAllocError::FragmentedPool) => {
                // Retire the exhausted pool and retry once with a fresh one
                self.used_pools.push(pool);
                let fresh = self.grab_pool(device)?;
                self.current_pool = Some(fresh);

                match device.allocate_set(fresh, layout) {
                    Ok(set) => Ok(set),
                    Err(SetAllocError::OutOfPoolMemory) | Err(SetAllocError::FragmentedPool) => {
                        Err(Error::OutOfPoolMemory)
                    }
                    Err(SetAllocError::Device(e)) => Err(e),
                }
            }
            Err(SetAllocError::Device(e)) => Err(e),
        }
    }

    /// Reset every pool and move it to the free list.
    ///
    /// Invalidates every descriptor set previously allocated from this
    /// allocator; callers must not use those sets afterwards.
    pub fn reset_pools(&mut self, device: &mut D) -> Result<()> {
        if let Some(pool) = self.current_pool.take() {
            self.used_pools.push(pool);
        }
        for pool in self.used_pools.drain(..) {
            device.reset_pool(pool)?;
            self.free_pools.push(pool);
        }
        Ok(())
    }

    /// Destroy all pools (free and used) unconditionally
    pub fn finalize(&mut self, device: &mut D) {
        if let Some(pool) = self.current_pool.take() {
            device.destroy_pool(pool);
        }
        for pool in self.used_pools.drain(..) {
            device.destroy_pool(pool);
        }
        for pool in self.free_pools.drain(..) {
            device.destroy_pool(pool);
        }
    }

    /// Whether a pool is currently accepting allocations
    pub fn has_current_pool(&self) -> bool {
        self.current_pool.is_some()
    }

    /// Number of retired pools holding live allocations
    pub fn used_pool_count(&self) -> usize {
        self.used_pools.len()
    }

    /// Number of reset pools available for reuse
    pub fn free_pool_count(&self) -> usize {
        self.free_pools.len()
    }
}

impl<D: DescriptorDevice> Default for DescriptorAllocator<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
