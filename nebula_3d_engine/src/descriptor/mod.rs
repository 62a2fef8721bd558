//! Descriptor subsystem: allocator, layout cache, editor
//!
//! The three pieces compose: the editor accumulates bindings, resolves the
//! layout through the cache (dedup by structure), and allocates the set
//! through the allocator (pooled, retry-once). All are generic over
//! [`DescriptorDevice`](device::DescriptorDevice) so the logic tests
//! without a GPU.

pub mod allocator;
pub mod device;
pub mod editor;
pub mod layout_cache;
pub mod types;

#[cfg(test)]
pub mod mock_device;

pub use allocator::{DescriptorAllocator, MAX_SETS_PER_POOL, POOL_SIZES};
pub use device::{BoundResource, DescriptorDevice, ImageAccess, PoolSize, SetAllocError, SetWrite};
pub use editor::{DescriptorEditor, DescriptorSet};
pub use layout_cache::DescriptorLayoutCache;
pub use types::{DescriptorLayoutInfo, DescriptorType, LayoutBinding, ShaderStageFlags};
