/// GPU image creation and upload
///
/// Sampled textures are uploaded through a scoped staging buffer with the
/// usual UNDEFINED → TRANSFER_DST → SHADER_READ_ONLY transition chain.
/// Attachment images (color/depth) are allocated without data and take
/// their first layout transition from the render pass.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Error, Result};

use crate::buffer::{create_buffer, destroy_buffer};
use crate::gpu_context::GpuContext;

/// Parameters for creating a 2D texture
#[derive(Debug, Clone)]
pub struct TextureCreateInfo {
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
}

/// A Vulkan image with its view.
///
/// As with buffers, the backing allocation is owned by a destruction-queue
/// closure, not by this struct.
pub struct GpuImage {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub extent: vk::Extent2D,
    pub format: vk::Format,
}

/// Create an image plus view and bind allocator memory.
///
/// Returns the image and its allocation; the caller registers destruction.
pub fn create_image(
    ctx: &EngineContext,
    gpu: &GpuContext,
    name: &str,
    extent: vk::Extent2D,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
    aspect: vk::ImageAspectFlags,
) -> Result<(GpuImage, Allocation)> {
    unsafe {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = gpu
            .device
            .create_image(&image_info, None)
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to create image '{}': {:?}", name, e))?;

        let requirements = gpu.device.get_image_memory_requirements(image);

        let allocation = gpu
            .allocator
            .lock()
            .expect("allocator lock poisoned")
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                gpu.device.destroy_image(image, None);
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                nebula_3d_engine::engine_error!(
                    ctx,
                    "nebula3d::vulkan",
                    "Out of GPU memory for image '{}' ({:.2} MB): {:?}",
                    name,
                    size_mb,
                    e
                );
                Error::OutOfMemory
            })?;

        gpu.device
            .bind_image_memory(image, allocation.memory(), allocation.offset())
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to bind image memory for '{}': {:?}", name, e))?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = gpu
            .device
            .create_image_view(&view_info, None)
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to create image view for '{}': {:?}", name, e))?;

        Ok((
            GpuImage {
                image,
                view,
                extent,
                format,
            },
            allocation,
        ))
    }
}

/// Destroy an image, its view, and free its allocation immediately.
///
/// Only valid after the device no longer references the image.
pub fn destroy_image(gpu: &GpuContext, image: vk::Image, view: vk::ImageView, allocation: Allocation) {
    unsafe {
        gpu.device.destroy_image_view(view, None);
        if let Ok(mut allocator) = gpu.allocator.lock() {
            allocator.free(allocation).ok();
        }
        gpu.device.destroy_image(image, None);
    }
}

/// Create a sampled 2D texture and upload `pixels` through a staging buffer.
///
/// `pixels` must be tightly packed rows matching `info.format`. The staging
/// buffer is destroyed before this function returns.
pub fn create_texture_2d(
    ctx: &EngineContext,
    gpu: &GpuContext,
    name: &str,
    info: &TextureCreateInfo,
    pixels: &[u8],
) -> Result<(GpuImage, Allocation)> {
    let extent = vk::Extent2D {
        width: info.width,
        height: info.height,
    };

    let (image, allocation) = create_image(
        ctx,
        gpu,
        name,
        extent,
        info.format,
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        vk::ImageAspectFlags::COLOR,
    )?;

    // Staging buffer scoped to this upload
    let (staging, staging_allocation) = create_buffer(
        ctx,
        gpu,
        &format!("{}_staging", name),
        pixels.len() as u64,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::CpuToGpu,
    )?;
    staging.write(ctx, 0, pixels)?;

    let upload_result = gpu.submit_one_shot(ctx, |cmd| unsafe {
        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        // UNDEFINED -> TRANSFER_DST
        let to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

        gpu.device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_transfer],
        );

        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D {
                width: info.width,
                height: info.height,
                depth: 1,
            },
        };

        gpu.device.cmd_copy_buffer_to_image(
            cmd,
            staging.buffer,
            image.image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        // TRANSFER_DST -> SHADER_READ_ONLY
        let to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);

        gpu.device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_shader],
        );
    });

    // Copy complete (fence-waited); the staging pair dies here either way
    destroy_buffer(gpu, staging.buffer, staging_allocation);

    match upload_result {
        Ok(()) => Ok((image, allocation)),
        Err(e) => {
            destroy_image(gpu, image.image, image.view, allocation);
            Err(e)
        }
    }
}

/// Create the default sampler used by sampled textures (linear, repeat,
/// anisotropic)
pub fn create_default_sampler(ctx: &EngineContext, gpu: &GpuContext) -> Result<vk::Sampler> {
    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(vk::LOD_CLAMP_NONE)
        .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .anisotropy_enable(true)
        .max_anisotropy(16.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS);

    unsafe {
        gpu.device
            .create_sampler(&create_info, None)
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to create default sampler: {:?}", e))
    }
}
