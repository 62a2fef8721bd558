//! Backend seam for the descriptor subsystem
//!
//! The allocator, layout cache and editor are generic over
//! [`DescriptorDevice`] so their pool/dedup/retry logic is unit-testable
//! without a GPU. The Vulkan backend implements this trait over `ash`;
//! tests use a mock with integer handles.

use crate::descriptor::types::{DescriptorLayoutInfo, DescriptorType};
use crate::error::Result;

/// Requested capacity for one descriptor type within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSize {
    pub descriptor_type: DescriptorType,
    pub count: u32,
}

/// Why a single pool-level set allocation failed.
///
/// The allocator retries on the first two variants with a fresh pool;
/// `Device` errors propagate immediately (fatal path).
#[derive(Debug, Clone)]
pub enum SetAllocError {
    /// The pool has no capacity left for this layout
    OutOfPoolMemory,
    /// The pool has capacity but is too fragmented to serve the layout
    FragmentedPool,
    /// Any other device-level failure
    Device(crate::error::Error),
}

/// Expected image layout at shader-read time for an image write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    /// Sampled in a shader (SHADER_READ_ONLY_OPTIMAL)
    ShaderReadOnly,
    /// Storage/general access
    General,
    /// Depth attachment read
    DepthStencilReadOnly,
}

/// One bound resource inside a [`SetWrite`]
pub enum BoundResource<D: DescriptorDevice + ?Sized> {
    Buffer {
        buffer: D::Buffer,
        offset: u64,
        range: u64,
    },
    Image {
        sampler: D::Sampler,
        view: D::ImageView,
        access: ImageAccess,
    },
}

/// One pending descriptor write: (set, binding, type, resource).
///
/// Writes are owned records; the backend translates them into API write
/// structures inside [`DescriptorDevice::update_sets`], so no pointers into
/// caller-owned storage ever outlive the call.
pub struct SetWrite<D: DescriptorDevice + ?Sized> {
    pub set: D::Set,
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub resource: BoundResource<D>,
}

/// GPU-side operations the descriptor subsystem needs.
///
/// Mutation happens only on the single render thread (`&mut self`); adding
/// multi-threaded recording would require external locking or thread-local
/// pools.
pub trait DescriptorDevice {
    /// Opaque pool handle
    type Pool: Copy + Eq + std::hash::Hash + std::fmt::Debug;
    /// Opaque set-layout handle
    type Layout: Copy + Eq + std::fmt::Debug;
    /// Opaque descriptor-set handle
    type Set: Copy + Eq + std::fmt::Debug;
    /// Opaque buffer handle referenced by writes
    type Buffer: Copy + std::fmt::Debug;
    /// Opaque image-view handle referenced by writes
    type ImageView: Copy + std::fmt::Debug;
    /// Opaque sampler handle referenced by writes
    type Sampler: Copy + std::fmt::Debug;

    /// Create a pool able to hold `max_sets` sets with the given per-type
    /// capacity weights
    fn create_pool(&mut self, max_sets: u32, sizes: &[PoolSize]) -> Result<Self::Pool>;

    /// Return all of a pool's sets to it (invalidates those set handles)
    fn reset_pool(&mut self, pool: Self::Pool) -> Result<()>;

    /// Destroy a pool and everything allocated from it
    fn destroy_pool(&mut self, pool: Self::Pool);

    /// Create a set layout from canonical binding info
    fn create_layout(&mut self, info: &DescriptorLayoutInfo) -> Result<Self::Layout>;

    /// Destroy a set layout
    fn destroy_layout(&mut self, layout: Self::Layout);

    /// Allocate one set of `layout` from `pool`
    fn allocate_set(
        &mut self,
        pool: Self::Pool,
        layout: Self::Layout,
    ) -> std::result::Result<Self::Set, SetAllocError>;

    /// Apply descriptor writes immediately
    fn update_sets(&mut self, writes: &[SetWrite<Self>]);
}
