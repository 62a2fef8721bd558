/// GPU buffer creation and upload
///
/// Buffers come in two flavors: host-visible (persistently mapped, used for
/// the per-frame uniform ring buffers) and device-local (vertex/index data,
/// filled through a scoped staging buffer that is destroyed as soon as the
/// one-shot copy completes).

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Error, Result};

use crate::gpu_context::GpuContext;

/// A Vulkan buffer handle plus its size and optional persistent mapping.
///
/// The backing `Allocation` is not stored here: it is either moved into a
/// destruction-queue closure (persistent buffers) or freed right after the
/// upload copy (staging buffers).
pub struct GpuBuffer {
    pub buffer: vk::Buffer,
    pub size: u64,
    mapped: *mut u8,
}

impl GpuBuffer {
    /// Write bytes at `offset` into a host-visible buffer
    pub fn write(&self, ctx: &EngineContext, offset: u64, data: &[u8]) -> Result<()> {
        if self.mapped.is_null() {
            return Err(engine_err!(
                ctx,
                "nebula3d::vulkan",
                "Buffer write failed: buffer is not CPU-accessible"
            ));
        }
        if offset + data.len() as u64 > self.size {
            return Err(engine_err!(
                ctx,
                "nebula3d::vulkan",
                "Buffer write failed: {} bytes at offset {} exceeds size {}",
                data.len(),
                offset,
                self.size
            ));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                self.mapped.offset(offset as isize),
                data.len(),
            );
        }
        Ok(())
    }
}

/// Create a buffer and bind allocator memory to it.
///
/// Returns the buffer plus its allocation; the caller decides whether the
/// allocation goes into a destruction queue (persistent) or is freed
/// immediately after use (staging).
pub fn create_buffer(
    ctx: &EngineContext,
    gpu: &GpuContext,
    name: &str,
    size: u64,
    usage: vk::BufferUsageFlags,
    location: MemoryLocation,
) -> Result<(GpuBuffer, Allocation)> {
    unsafe {
        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = gpu
            .device
            .create_buffer(&create_info, None)
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to create buffer '{}': {:?}", name, e))?;

        let requirements = gpu.device.get_buffer_memory_requirements(buffer);

        let allocation = gpu
            .allocator
            .lock()
            .expect("allocator lock poisoned")
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                gpu.device.destroy_buffer(buffer, None);
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                nebula_3d_engine::engine_error!(
                    ctx,
                    "nebula3d::vulkan",
                    "Out of GPU memory for buffer '{}' ({:.2} MB): {:?}",
                    name,
                    size_mb,
                    e
                );
                Error::OutOfMemory
            })?;

        gpu.device
            .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            .map_err(|e| engine_err!(ctx, "nebula3d::vulkan", "Failed to bind buffer memory for '{}': {:?}", name, e))?;

        let mapped = allocation
            .mapped_ptr()
            .map(|p| p.as_ptr() as *mut u8)
            .unwrap_or(std::ptr::null_mut());

        Ok((
            GpuBuffer {
                buffer,
                size,
                mapped,
            },
            allocation,
        ))
    }
}

/// Destroy a buffer and free its allocation immediately.
///
/// Only valid when the GPU no longer references the buffer (staging buffers
/// after a fence-waited upload, or teardown after device idle).
pub fn destroy_buffer(gpu: &GpuContext, buffer: vk::Buffer, allocation: Allocation) {
    unsafe {
        if let Ok(mut allocator) = gpu.allocator.lock() {
            allocator.free(allocation).ok();
        }
        gpu.device.destroy_buffer(buffer, None);
    }
}

/// Create a device-local buffer filled with `data` through a scoped staging
/// buffer.
///
/// The staging buffer is destroyed before this function returns; the
/// device-local buffer persists until its destruction-queue entry runs.
pub fn create_device_local_buffer(
    ctx: &EngineContext,
    gpu: &GpuContext,
    name: &str,
    data: &[u8],
    usage: vk::BufferUsageFlags,
) -> Result<(GpuBuffer, Allocation)> {
    let size = data.len() as u64;

    // Staging buffer, CPU-visible, scoped to this upload
    let (staging, staging_allocation) = create_buffer(
        ctx,
        gpu,
        &format!("{}_staging", name),
        size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::CpuToGpu,
    )?;
    staging.write(ctx, 0, data)?;

    let result = (|| -> Result<(GpuBuffer, Allocation)> {
        let (device_local, allocation) = create_buffer(
            ctx,
            gpu,
            name,
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuOnly,
        )?;

        gpu.submit_one_shot(ctx, |cmd| unsafe {
            let region = vk::BufferCopy {
                src_offset: 0,
                dst_offset: 0,
                size,
            };
            gpu.device
                .cmd_copy_buffer(cmd, staging.buffer, device_local.buffer, &[region]);
        })?;

        Ok((device_local, allocation))
    })();

    // The copy has completed (one-shot submit waits on its fence), so the
    // staging pair dies here regardless of the outcome.
    destroy_buffer(gpu, staging.buffer, staging_allocation);

    result
}
