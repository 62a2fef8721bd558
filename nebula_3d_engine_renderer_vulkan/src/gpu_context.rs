/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue for command submission
/// - Command pool for one-shot upload operations

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Result};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan resources.
///
/// This struct is shared (via `Arc`) by the swapchain, frame contexts, pass
/// pipeline and resource store to avoid duplicating device/allocator/queue
/// references in each of them.
///
/// Note: device and instance destruction is handled by
/// `NebulaRenderer::finalize()` to keep teardown ordering explicit; the
/// allocator is wrapped in `ManuallyDrop` so it can be dropped before the
/// device goes away.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for &self access)
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: vk::CommandPool,

    /// Minimum alignment for dynamic uniform-buffer offsets
    pub min_uniform_offset_alignment: u64,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        min_uniform_offset_alignment: u64,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool,
            min_uniform_offset_alignment,
        }
    }

    /// Record and submit a one-shot command buffer on the graphics queue,
    /// then block until it completes.
    ///
    /// Used for staging-buffer copies and image layout transitions during
    /// resource upload; the staging resources can be destroyed as soon as
    /// this returns.
    pub fn submit_one_shot(
        &self,
        ctx: &EngineContext,
        record: impl FnOnce(vk::CommandBuffer),
    ) -> Result<()> {
        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.upload_command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to allocate one-shot command buffer: {:?}", e)
                })?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to begin one-shot command buffer: {:?}", e)
                })?;

            record(command_buffer);

            self.device.end_command_buffer(command_buffer).map_err(|e| {
                engine_err!(ctx, "nebula3d::vulkan", "Failed to end one-shot command buffer: {:?}", e)
            })?;

            let fence = self
                .device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to create upload fence: {:?}", e)
                })?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let submit_result = self
                .device
                .queue_submit(self.graphics_queue, &[submit_info], fence)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to submit one-shot commands: {:?}", e)
                });

            let wait_result = submit_result.and_then(|_| {
                self.device
                    .wait_for_fences(&[fence], true, u64::MAX)
                    .map_err(|e| {
                        engine_err!(ctx, "nebula3d::vulkan", "Failed to wait for upload fence: {:?}", e)
                    })
            });

            self.device.destroy_fence(fence, None);
            self.device
                .free_command_buffers(self.upload_command_pool, &command_buffers);

            wait_result
        }
    }
}
