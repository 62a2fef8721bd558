//! Fluent builder for creating and updating descriptor sets
//!
//! Accumulates (binding, resource) pairs, then either creates a set — layout
//! resolved through the cache, set allocated through the allocator — or
//! pushes the writes into an already-allocated set (the fast path for
//! swapping a bound texture without reallocating).

use crate::descriptor::allocator::DescriptorAllocator;
use crate::descriptor::device::{BoundResource, DescriptorDevice, ImageAccess, SetWrite};
use crate::descriptor::layout_cache::DescriptorLayoutCache;
use crate::descriptor::types::{DescriptorType, LayoutBinding, ShaderStageFlags};
use crate::error::{Error, Result};

/// A layout/set pair produced by the editor.
///
/// The layout is owned by the cache (lives until cache finalize); the set is
/// owned by whichever pool allocated it and is only valid until that pool is
/// reset.
pub struct DescriptorSet<D: DescriptorDevice> {
    pub layout: D::Layout,
    pub set: D::Set,
}

impl<D: DescriptorDevice> Clone for DescriptorSet<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DescriptorDevice> Copy for DescriptorSet<D> {}

impl<D: DescriptorDevice> std::fmt::Debug for DescriptorSet<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSet")
            .field("layout", &self.layout)
            .field("set", &self.set)
            .finish()
    }
}

/// One accumulated binding: layout info plus the pending write
struct PendingWrite<D: DescriptorDevice> {
    binding: u32,
    descriptor_type: DescriptorType,
    resource: BoundResource<D>,
}

/// Builder accumulating bindings for one descriptor set.
///
/// Writes are owned records; nothing borrows from the editor after
/// [`execute`](Self::execute) / [`execute_update`](Self::execute_update).
pub struct DescriptorEditor<'c, D: DescriptorDevice> {
    allocator: &'c mut DescriptorAllocator<D>,
    cache: &'c mut DescriptorLayoutCache<D>,
    bindings: Vec<LayoutBinding>,
    writes: Vec<PendingWrite<D>>,
}

impl<'c, D: DescriptorDevice> DescriptorEditor<'c, D> {
    /// Start accumulating bindings against the shared allocator and cache
    pub fn begin(
        allocator: &'c mut DescriptorAllocator<D>,
        cache: &'c mut DescriptorLayoutCache<D>,
    ) -> Self {
        Self {
            allocator,
            cache,
            bindings: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Bind a buffer region at `binding`
    pub fn bind_buffer(
        mut self,
        binding: u32,
        descriptor_type: DescriptorType,
        stages: ShaderStageFlags,
        buffer: D::Buffer,
        offset: u64,
        range: u64,
    ) -> Self {
        self.bindings
            .push(LayoutBinding::new(binding, descriptor_type, stages));
        self.writes.push(PendingWrite {
            binding,
            descriptor_type,
            resource: BoundResource::Buffer {
                buffer,
                offset,
                range,
            },
        });
        self
    }

    /// Bind a sampled image at `binding`
    pub fn bind_image(
        mut self,
        binding: u32,
        descriptor_type: DescriptorType,
        stages: ShaderStageFlags,
        sampler: D::Sampler,
        view: D::ImageView,
        access: ImageAccess,
    ) -> Self {
        self.bindings
            .push(LayoutBinding::new(binding, descriptor_type, stages));
        self.writes.push(PendingWrite {
            binding,
            descriptor_type,
            resource: BoundResource::Image {
                sampler,
                view,
                access,
            },
        });
        self
    }

    /// Create the set: resolve the layout through the cache, allocate
    /// through the allocator, then apply the accumulated writes.
    ///
    /// Fails with [`Error::AllocationFailed`] when the allocator's
    /// fresh-pool retry also fails; other device errors propagate unchanged.
    pub fn execute(self, device: &mut D) -> Result<DescriptorSet<D>> {
        let layout = self.cache.create_descriptor_layout(device, &self.bindings)?;
        let set = self.allocator.allocate(device, layout).map_err(|e| match e {
            Error::OutOfPoolMemory => {
                Error::AllocationFailed("descriptor pool exhausted after retry".to_string())
            }
            other => other,
        })?;

        let writes: Vec<SetWrite<D>> = self
            .writes
            .into_iter()
            .map(|w| SetWrite {
                set,
                binding: w.binding,
                descriptor_type: w.descriptor_type,
                resource: w.resource,
            })
            .collect();
        device.update_sets(&writes);

        Ok(DescriptorSet { layout, set })
    }

    /// Update-only fast path: skip layout resolution and allocation, push
    /// the accumulated writes into an existing set.
    pub fn execute_update(self, device: &mut D, target: DescriptorSet<D>) {
        let writes: Vec<SetWrite<D>> = self
            .writes
            .into_iter()
            .map(|w| SetWrite {
                set: target.set,
                binding: w.binding,
                descriptor_type: w.descriptor_type,
                resource: w.resource,
            })
            .collect();
        device.update_sets(&writes);
    }

    /// Number of bindings accumulated so far
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
