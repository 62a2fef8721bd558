/// Vulkan implementation of the core DescriptorDevice seam
///
/// Translates the core's descriptor types into `ash` calls. Write records
/// arrive as owned data and are converted to `vk::WriteDescriptorSet`
/// structures locally, so no pointer into caller storage ever outlives the
/// `update_sets` call.

use ash::vk;
use nebula_3d_engine::descriptor::{
    BoundResource, DescriptorDevice, DescriptorLayoutInfo, DescriptorType, ImageAccess, PoolSize,
    SetAllocError, SetWrite, ShaderStageFlags,
};
use nebula_3d_engine::{Error, Result};

/// Convert a core descriptor type to the Vulkan equivalent
pub(crate) fn descriptor_type_to_vk(ty: DescriptorType) -> vk::DescriptorType {
    match ty {
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::UniformBufferDynamic => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        DescriptorType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorType::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        DescriptorType::Sampler => vk::DescriptorType::SAMPLER,
        DescriptorType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
    }
}

/// Convert core shader stage flags to the Vulkan equivalent.
///
/// Bit values match by construction; the mask keeps unknown bits out.
pub(crate) fn stage_flags_to_vk(stages: ShaderStageFlags) -> vk::ShaderStageFlags {
    vk::ShaderStageFlags::from_raw(stages.bits())
}

/// Convert an image access hint to the expected Vulkan image layout
pub(crate) fn image_access_to_vk(access: ImageAccess) -> vk::ImageLayout {
    match access {
        ImageAccess::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageAccess::General => vk::ImageLayout::GENERAL,
        ImageAccess::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
    }
}

/// [`DescriptorDevice`] backed by a Vulkan device.
///
/// Owned by the resource store; all descriptor traffic goes through one
/// instance on the single render thread.
pub struct VulkanDescriptorDevice {
    device: ash::Device,
}

impl VulkanDescriptorDevice {
    pub fn new(device: ash::Device) -> Self {
        Self { device }
    }
}

impl DescriptorDevice for VulkanDescriptorDevice {
    type Pool = vk::DescriptorPool;
    type Layout = vk::DescriptorSetLayout;
    type Set = vk::DescriptorSet;
    type Buffer = vk::Buffer;
    type ImageView = vk::ImageView;
    type Sampler = vk::Sampler;

    fn create_pool(&mut self, max_sets: u32, sizes: &[PoolSize]) -> Result<Self::Pool> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = sizes
            .iter()
            .map(|s| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(s.descriptor_type),
                descriptor_count: s.count,
            })
            .collect();

        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);

        unsafe {
            self.device.create_descriptor_pool(&info, None).map_err(|e| {
                Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
            })
        }
    }

    fn reset_pool(&mut self, pool: Self::Pool) -> Result<()> {
        unsafe {
            self.device
                .reset_descriptor_pool(pool, vk::DescriptorPoolResetFlags::empty())
                .map_err(|e| {
                    Error::BackendError(format!("Failed to reset descriptor pool: {:?}", e))
                })
        }
    }

    fn destroy_pool(&mut self, pool: Self::Pool) {
        unsafe {
            self.device.destroy_descriptor_pool(pool, None);
        }
    }

    fn create_layout(&mut self, info: &DescriptorLayoutInfo) -> Result<Self::Layout> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = info
            .bindings()
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_type_to_vk(b.descriptor_type))
                    .descriptor_count(b.count)
                    .stage_flags(stage_flags_to_vk(b.stages))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        unsafe {
            self.device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to create descriptor set layout: {:?}", e))
                })
        }
    }

    fn destroy_layout(&mut self, layout: Self::Layout) {
        unsafe {
            self.device.destroy_descriptor_set_layout(layout, None);
        }
    }

    fn allocate_set(
        &mut self,
        pool: Self::Pool,
        layout: Self::Layout,
    ) -> std::result::Result<Self::Set, SetAllocError> {
        let layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);

        unsafe {
            match self.device.allocate_descriptor_sets(&alloc_info) {
                Ok(sets) => Ok(sets[0]),
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) => Err(SetAllocError::OutOfPoolMemory),
                Err(vk::Result::ERROR_FRAGMENTED_POOL) => Err(SetAllocError::FragmentedPool),
                Err(e) => Err(SetAllocError::Device(Error::BackendError(format!(
                    "Failed to allocate descriptor set: {:?}",
                    e
                )))),
            }
        }
    }

    fn update_sets(&mut self, writes: &[SetWrite<Self>]) {
        // Build all info structures first so the write array can reference
        // them without any reallocation invalidating pointers.
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::with_capacity(writes.len());
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::with_capacity(writes.len());

        // (info index, is_buffer) per write, in order
        let mut slots: Vec<(usize, bool)> = Vec::with_capacity(writes.len());

        for write in writes {
            match &write.resource {
                BoundResource::Buffer {
                    buffer,
                    offset,
                    range,
                } => {
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(*buffer)
                            .offset(*offset)
                            .range(*range),
                    );
                    slots.push((buffer_infos.len() - 1, true));
                }
                BoundResource::Image {
                    sampler,
                    view,
                    access,
                } => {
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .sampler(*sampler)
                            .image_view(*view)
                            .image_layout(image_access_to_vk(*access)),
                    );
                    slots.push((image_infos.len() - 1, false));
                }
            }
        }

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(slots.iter())
            .map(|(write, &(info_index, is_buffer))| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_set(write.set)
                    .dst_binding(write.binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type_to_vk(write.descriptor_type));
                if is_buffer {
                    base.buffer_info(std::slice::from_ref(&buffer_infos[info_index]))
                } else {
                    base.image_info(std::slice::from_ref(&image_infos[info_index]))
                }
            })
            .collect();

        unsafe {
            self.device.update_descriptor_sets(&vk_writes, &[]);
        }
    }
}

#[cfg(test)]
#[path = "descriptor_device_tests.rs"]
mod tests;
