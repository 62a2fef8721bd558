//! Mock descriptor device for unit tests (no GPU required)
//!
//! Integer handles, configurable per-pool capacity, and full recording of
//! pool/layout/write traffic so tests can assert the allocator's retry and
//! recycle behavior and the cache's dedup behavior.

use rustc_hash::FxHashMap;

use crate::descriptor::device::{
    BoundResource, DescriptorDevice, PoolSize, SetAllocError, SetWrite,
};
use crate::descriptor::types::{DescriptorLayoutInfo, DescriptorType};
use crate::error::{Error, Result};

/// What kind of resource a recorded write carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Buffer,
    Image,
}

/// One recorded descriptor write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedWrite {
    pub set: u64,
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub kind: WriteKind,
}

struct MockPool {
    capacity: u32,
    allocated: u32,
}

/// Mock [`DescriptorDevice`] with integer handles
pub struct MockDescriptorDevice {
    sets_per_pool: u32,
    pools: FxHashMap<u32, MockPool>,
    next_pool: u32,
    next_layout: u32,
    next_set: u64,

    /// Total pools ever created (never decremented)
    pub pools_created: u32,
    /// Pool handles passed to `destroy_pool`
    pub destroyed_pools: Vec<u32>,
    /// Canonical infos of every layout ever created, in creation order
    pub created_layouts: Vec<DescriptorLayoutInfo>,
    /// Layout handles passed to `destroy_layout`
    pub destroyed_layouts: Vec<u32>,
    /// Every descriptor write applied, in order
    pub writes: Vec<RecordedWrite>,
    /// Total sets ever allocated
    pub sets_allocated: u64,
    /// When set, the next `allocate_set` fails with `FragmentedPool`
    pub fail_next_with_fragmentation: bool,
    /// When set, `create_pool` fails (device-level error path)
    pub fail_pool_creation: bool,
}

impl MockDescriptorDevice {
    /// Create a mock whose pools hold `sets_per_pool` sets each
    pub fn new(sets_per_pool: u32) -> Self {
        Self {
            sets_per_pool,
            pools: FxHashMap::default(),
            next_pool: 0,
            next_layout: 0,
            next_set: 0,
            pools_created: 0,
            destroyed_pools: Vec::new(),
            created_layouts: Vec::new(),
            destroyed_layouts: Vec::new(),
            writes: Vec::new(),
            sets_allocated: 0,
            fail_next_with_fragmentation: false,
            fail_pool_creation: false,
        }
    }

    /// Number of live (not yet destroyed) pools
    pub fn live_pool_count(&self) -> usize {
        self.pools.len()
    }
}

impl DescriptorDevice for MockDescriptorDevice {
    type Pool = u32;
    type Layout = u32;
    type Set = u64;
    type Buffer = u64;
    type ImageView = u64;
    type Sampler = u64;

    fn create_pool(&mut self, _max_sets: u32, _sizes: &[PoolSize]) -> Result<Self::Pool> {
        if self.fail_pool_creation {
            return Err(Error::InitializationFailed(
                "mock pool creation failure".to_string(),
            ));
        }
        let handle = self.next_pool;
        self.next_pool += 1;
        self.pools.insert(
            handle,
            MockPool {
                capacity: self.sets_per_pool,
                allocated: 0,
            },
        );
        self.pools_created += 1;
        Ok(handle)
    }

    fn reset_pool(&mut self, pool: Self::Pool) -> Result<()> {
        match self.pools.get_mut(&pool) {
            Some(p) => {
                p.allocated = 0;
                Ok(())
            }
            None => Err(Error::InvalidResource(format!("unknown pool {}", pool))),
        }
    }

    fn destroy_pool(&mut self, pool: Self::Pool) {
        self.pools.remove(&pool);
        self.destroyed_pools.push(pool);
    }

    fn create_layout(&mut self, info: &DescriptorLayoutInfo) -> Result<Self::Layout> {
        let handle = self.next_layout;
        self.next_layout += 1;
        self.created_layouts.push(info.clone());
        Ok(handle)
    }

    fn destroy_layout(&mut self, layout: Self::Layout) {
        self.destroyed_layouts.push(layout);
    }

    fn allocate_set(
        &mut self,
        pool: Self::Pool,
        _layout: Self::Layout,
    ) -> std::result::Result<Self::Set, SetAllocError> {
        if self.fail_next_with_fragmentation {
            self.fail_next_with_fragmentation = false;
            return Err(SetAllocError::FragmentedPool);
        }

        let p = self.pools.get_mut(&pool).ok_or_else(|| {
            SetAllocError::Device(Error::InvalidResource(format!("unknown pool {}", pool)))
        })?;

        if p.allocated >= p.capacity {
            return Err(SetAllocError::OutOfPoolMemory);
        }

        p.allocated += 1;
        let set = self.next_set;
        self.next_set += 1;
        self.sets_allocated += 1;
        Ok(set)
    }

    fn update_sets(&mut self, writes: &[SetWrite<Self>]) {
        for w in writes {
            let kind = match w.resource {
                BoundResource::Buffer { .. } => WriteKind::Buffer,
                BoundResource::Image { .. } => WriteKind::Image,
            };
            self.writes.push(RecordedWrite {
                set: w.set,
                binding: w.binding,
                descriptor_type: w.descriptor_type,
                kind,
            });
        }
    }
}
