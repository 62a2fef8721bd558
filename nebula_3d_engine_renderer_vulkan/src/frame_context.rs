/// Per-frame-in-flight contexts: command buffers, sync primitives, and
/// ring-buffered per-frame GPU data
///
/// One context per frame slot; the CPU round-robins through them and slot
/// reuse is gated by that slot's fence, so per-frame buffer writes for slot
/// i are never visible to GPU reads of slot i until the previous use of the
/// slot has fully completed.

use ash::vk;
use gpu_allocator::MemoryLocation;
use nebula_3d_engine::descriptor::{
    DescriptorAllocator, DescriptorEditor, DescriptorLayoutCache, DescriptorSet, DescriptorType,
    ShaderStageFlags,
};
use nebula_3d_engine::frame::{FrameRing, RingBufferLayout};
use nebula_3d_engine::gpu_data::{CameraData, EnvironmentData, InstanceData};
use nebula_3d_engine::destruction_queue::DestructionQueue;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Result};
use std::sync::Arc;

use crate::buffer::{create_buffer, GpuBuffer};
use crate::descriptor_device::VulkanDescriptorDevice;
use crate::gpu_context::GpuContext;

/// Instance capacity of each frame's dynamic uniform ring
pub const MAX_INSTANCES_PER_FRAME: usize = 1024;

/// Bindings of the global-per-frame set (slot 1): camera + environment.
///
/// Material pipeline layouts resolve this list through the layout cache, so
/// they share the exact layout object the frame sets were allocated with.
pub fn global_set_bindings() -> [nebula_3d_engine::descriptor::LayoutBinding; 2] {
    use nebula_3d_engine::descriptor::LayoutBinding;
    [
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
        LayoutBinding::uniform_buffer(1, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
    ]
}

/// Bindings of the per-instance set (slot 2): one dynamic uniform buffer
pub fn instance_set_bindings() -> [nebula_3d_engine::descriptor::LayoutBinding; 1] {
    use nebula_3d_engine::descriptor::LayoutBinding;
    [LayoutBinding::uniform_buffer_dynamic(0, ShaderStageFlags::VERTEX)]
}

/// One frame slot's command recording and synchronization state
pub struct FrameContext {
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,

    /// Signaled when this slot's submission finishes on the GPU
    pub render_fence: vk::Fence,
    /// Signaled when the acquired swapchain image is ready
    pub image_available: vk::Semaphore,
    /// Signaled when this slot's rendering completes (present waits on it)
    pub render_finished: vk::Semaphore,

    /// Host-visible camera block for this slot
    pub camera_buffer: GpuBuffer,
    /// Host-visible environment block for this slot
    pub environment_buffer: GpuBuffer,
    /// Host-visible per-instance ring for this slot
    pub instance_buffer: GpuBuffer,

    /// Global-per-frame set: camera (binding 0) + environment (binding 1)
    pub global_set: DescriptorSet<VulkanDescriptorDevice>,
    /// Per-instance set: dynamic uniform over the instance ring (binding 0)
    pub instance_set: DescriptorSet<VulkanDescriptorDevice>,
}

impl FrameContext {
    fn new(
        ctx: &EngineContext,
        gpu: &GpuContext,
        descriptor_device: &mut VulkanDescriptorDevice,
        allocator: &mut DescriptorAllocator<VulkanDescriptorDevice>,
        cache: &mut DescriptorLayoutCache<VulkanDescriptorDevice>,
        device_queue: &mut DestructionQueue,
        instance_layout: &RingBufferLayout,
        slot: usize,
    ) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(gpu.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = gpu
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to create command pool for frame {}: {:?}", slot, e)
                })?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = gpu
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to allocate command buffer for frame {}: {:?}", slot, e)
                })?[0];

            // Fence starts signaled so the first wait on this slot passes
            let fence_info =
                vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            let render_fence = gpu.device.create_fence(&fence_info, None).map_err(|e| {
                engine_err!(ctx, "nebula3d::vulkan", "Failed to create render fence for frame {}: {:?}", slot, e)
            })?;

            let semaphore_info = vk::SemaphoreCreateInfo::default();
            let image_available = gpu
                .device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to create image-available semaphore for frame {}: {:?}", slot, e)
                })?;
            let render_finished = gpu
                .device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to create render-finished semaphore for frame {}: {:?}", slot, e)
                })?;

            // Per-frame host-visible buffers
            let (camera_buffer, camera_allocation) = create_buffer(
                ctx,
                gpu,
                &format!("frame{}_camera", slot),
                std::mem::size_of::<CameraData>() as u64,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                MemoryLocation::CpuToGpu,
            )?;
            let (environment_buffer, environment_allocation) = create_buffer(
                ctx,
                gpu,
                &format!("frame{}_environment", slot),
                std::mem::size_of::<EnvironmentData>() as u64,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                MemoryLocation::CpuToGpu,
            )?;
            let (instance_buffer, instance_allocation) = create_buffer(
                ctx,
                gpu,
                &format!("frame{}_instances", slot),
                instance_layout.total_size(),
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                MemoryLocation::CpuToGpu,
            )?;

            // Frame buffers die with the device-lifetime queue; allocations
            // ride along in the cleanup closure.
            let device_handle = gpu.device.clone();
            let allocator_handle = Arc::clone(&*gpu.allocator);
            let camera_vk = camera_buffer.buffer;
            let environment_vk = environment_buffer.buffer;
            let instance_vk = instance_buffer.buffer;
            device_queue.push(move || unsafe {
                if let Ok(mut allocator) = allocator_handle.lock() {
                    allocator.free(camera_allocation).ok();
                    allocator.free(environment_allocation).ok();
                    allocator.free(instance_allocation).ok();
                }
                device_handle.destroy_buffer(camera_vk, None);
                device_handle.destroy_buffer(environment_vk, None);
                device_handle.destroy_buffer(instance_vk, None);
            });

            // Global-per-frame set: camera + environment
            let global_set = DescriptorEditor::begin(allocator, cache)
                .bind_buffer(
                    0,
                    DescriptorType::UniformBuffer,
                    ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                    camera_buffer.buffer,
                    0,
                    std::mem::size_of::<CameraData>() as u64,
                )
                .bind_buffer(
                    1,
                    DescriptorType::UniformBuffer,
                    ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                    environment_buffer.buffer,
                    0,
                    std::mem::size_of::<EnvironmentData>() as u64,
                )
                .execute(descriptor_device)?;

            // Per-instance set: dynamic offset selects the instance region
            let instance_set = DescriptorEditor::begin(allocator, cache)
                .bind_buffer(
                    0,
                    DescriptorType::UniformBufferDynamic,
                    ShaderStageFlags::VERTEX,
                    instance_buffer.buffer,
                    0,
                    std::mem::size_of::<InstanceData>() as u64,
                )
                .execute(descriptor_device)?;

            Ok(Self {
                command_pool,
                command_buffer,
                render_fence,
                image_available,
                render_finished,
                camera_buffer,
                environment_buffer,
                instance_buffer,
                global_set,
                instance_set,
            })
        }
    }

    /// Block until the GPU has finished the previous use of this slot
    pub fn wait_fence(&self, ctx: &EngineContext, device: &ash::Device) -> Result<()> {
        unsafe {
            device
                .wait_for_fences(&[self.render_fence], true, u64::MAX)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to wait for render fence: {:?}", e)
                })
        }
    }

    /// Reset the fence and command buffer for re-recording
    pub fn reset(&self, ctx: &EngineContext, device: &ash::Device) -> Result<()> {
        unsafe {
            device.reset_fences(&[self.render_fence]).map_err(|e| {
                engine_err!(ctx, "nebula3d::vulkan", "Failed to reset render fence: {:?}", e)
            })?;
            device
                .reset_command_buffer(
                    self.command_buffer,
                    vk::CommandBufferResetFlags::empty(),
                )
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to reset command buffer: {:?}", e)
                })
        }
    }

    /// Upload this frame's camera block
    pub fn write_camera(&self, ctx: &EngineContext, camera: &CameraData) -> Result<()> {
        self.camera_buffer.write(ctx, 0, bytemuck::bytes_of(camera))
    }

    /// Upload this frame's environment block
    pub fn write_environment(
        &self,
        ctx: &EngineContext,
        environment: &EnvironmentData,
    ) -> Result<()> {
        self.environment_buffer
            .write(ctx, 0, bytemuck::bytes_of(environment))
    }

    /// Upload one instance block into the ring; returns the dynamic offset
    /// to bind for its draw
    pub fn write_instance(
        &self,
        ctx: &EngineContext,
        layout: &RingBufferLayout,
        index: usize,
        instance: &InstanceData,
    ) -> Result<u32> {
        if index >= layout.slots() {
            return Err(engine_err!(
                ctx,
                "nebula3d::vulkan",
                "Instance {} exceeds per-frame capacity {}",
                index,
                layout.slots()
            ));
        }
        let offset = layout.offset_of(index);
        self.instance_buffer
            .write(ctx, offset, bytemuck::bytes_of(instance))?;
        Ok(offset as u32)
    }

    fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_semaphore(self.render_finished, None);
            device.destroy_semaphore(self.image_available, None);
            device.destroy_fence(self.render_fence, None);
            device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// The full ring of frame contexts
pub struct FrameContexts {
    frames: Vec<FrameContext>,
    ring: FrameRing,
    instance_layout: RingBufferLayout,
}

impl FrameContexts {
    /// Create `frames_in_flight` contexts with their per-frame buffers and
    /// descriptor sets
    pub fn new(
        ctx: &EngineContext,
        gpu: &GpuContext,
        descriptor_device: &mut VulkanDescriptorDevice,
        allocator: &mut DescriptorAllocator<VulkanDescriptorDevice>,
        cache: &mut DescriptorLayoutCache<VulkanDescriptorDevice>,
        device_queue: &mut DestructionQueue,
        frames_in_flight: usize,
    ) -> Result<Self> {
        let ring = FrameRing::new(frames_in_flight);
        let instance_layout = RingBufferLayout::new(
            std::mem::size_of::<InstanceData>() as u64,
            gpu.min_uniform_offset_alignment.max(1),
            MAX_INSTANCES_PER_FRAME,
        );

        let mut frames = Vec::with_capacity(ring.count());
        for slot in 0..ring.count() {
            frames.push(FrameContext::new(
                ctx,
                gpu,
                descriptor_device,
                allocator,
                cache,
                device_queue,
                &instance_layout,
                slot,
            )?);
        }

        Ok(Self {
            frames,
            ring,
            instance_layout,
        })
    }

    /// Context for the slot currently being recorded
    pub fn current(&self) -> &FrameContext {
        &self.frames[self.ring.current()]
    }

    /// Current slot index
    pub fn slot(&self) -> usize {
        self.ring.current()
    }

    /// Number of frame slots
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    /// Advance to the next slot after a submission
    pub fn advance(&mut self) {
        self.ring.advance();
    }

    /// Layout of each frame's instance ring
    pub fn instance_layout(&self) -> &RingBufferLayout {
        &self.instance_layout
    }

    /// Destroy command pools and sync primitives.
    ///
    /// Per-frame buffers are destroyed by the device-lifetime destruction
    /// queue; descriptor sets die with the allocator's pools.
    pub fn destroy(&mut self, device: &ash::Device) {
        for frame in &self.frames {
            frame.destroy(device);
        }
        self.frames.clear();
    }
}
