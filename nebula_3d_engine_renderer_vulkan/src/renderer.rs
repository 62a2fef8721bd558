/// NebulaRenderer - the frame submission loop and renderer lifecycle
///
/// Three calls cover the whole lifecycle: `init` (device bring-up, frame
/// contexts, forward pass), `render` (one frame: wait fence → acquire →
/// record → submit → present, with swapchain recreation handled
/// internally), and `finalize` (ordered teardown).

use ash::vk;
use glam::{Vec3, Vec4};
use gpu_allocator::vulkan::Allocator;
use nebula_3d_engine::gpu_data::EnvironmentData;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::scene::RenderScene;
use nebula_3d_engine::{engine_err, engine_info, engine_warn, Error, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::forward::create_forward_pass;
use crate::frame_context::FrameContexts;
use crate::gpu_context::GpuContext;
use crate::instance::DeviceBundle;
use crate::render_pass::RenderPassPipeline;
use crate::resource_store::RenderResourceStore;
use crate::swapchain::Swapchain;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation layers and the debug messenger
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Frames in flight (clamped to [1, 3])
    pub frames_in_flight: usize,
    /// Directory holding compiled `<name>.<stage>.spv` shader binaries
    pub shader_dir: PathBuf,
    /// (material name, kind name) pairs created against the forward pass
    /// at init
    pub default_materials: Vec<(String, String)>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Nebula3D Application".to_string(),
            app_version: (1, 0, 0),
            frames_in_flight: 2,
            shader_dir: PathBuf::from("assets/shaders"),
            default_materials: vec![("default".to_string(), "unlit".to_string())],
        }
    }
}

/// Per-frame statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct RendererStats {
    /// Draw calls recorded this frame
    pub draw_calls: u32,
    /// Triangles drawn this frame
    pub triangles: u32,
}

/// The Vulkan renderer: device, swapchain, frame contexts, forward pass,
/// and resource store
pub struct NebulaRenderer {
    ctx: Arc<EngineContext>,

    // Bring-up state (kept for teardown; entry must outlive the instance)
    _entry: ash::Entry,
    instance: ash::Instance,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    device: ash::Device,
    present_queue: vk::Queue,

    gpu: Arc<GpuContext>,
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    swapchain: Swapchain,
    frames: FrameContexts,
    forward_pass: RenderPassPipeline,
    store: RenderResourceStore,

    /// Window-system callback: current drawable size, consumed at swapchain
    /// (re)creation
    extent_provider: Box<dyn Fn() -> (u32, u32)>,

    stats: RendererStats,
    recreate_count: u64,
}

impl NebulaRenderer {
    /// Bring up the device and all swapchain/frame/pass state.
    ///
    /// `extent_provider` supplies the drawable size whenever the swapchain
    /// is (re)created; the window handles are only used here.
    pub fn init<W: HasDisplayHandle + HasWindowHandle>(
        ctx: Arc<EngineContext>,
        window: &W,
        extent_provider: Box<dyn Fn() -> (u32, u32)>,
        config: RendererConfig,
    ) -> Result<Self> {
        let bundle = DeviceBundle::new(&ctx, window, &config)?;
        let allocator = Arc::new(Mutex::new(bundle.create_allocator(&ctx)?));

        // Upload command pool (TRANSIENT + RESET for reusable one-shot uploads)
        let upload_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(bundle.graphics_queue_family)
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            );
        let upload_command_pool = unsafe {
            bundle
                .device
                .create_command_pool(&upload_pool_info, None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to create upload command pool: {:?}", e)
                })?
        };

        let gpu = Arc::new(GpuContext::new(
            bundle.device.clone(),
            Arc::clone(&allocator),
            bundle.graphics_queue,
            bundle.graphics_queue_family,
            upload_command_pool,
            bundle.limits.min_uniform_buffer_offset_alignment,
        ));

        let swapchain = Swapchain::new(
            &ctx,
            &bundle.instance,
            bundle.device.clone(),
            bundle.physical_device,
            bundle.surface,
            bundle.surface_loader,
            extent_provider(),
        )?;

        let mut store =
            RenderResourceStore::new(Arc::clone(&ctx), Arc::clone(&gpu), config.shader_dir.clone())?;

        let frames = {
            let (descriptor_device, allocator, cache, device_queue) = store.frame_init_parts();
            FrameContexts::new(
                &ctx,
                &gpu,
                descriptor_device,
                allocator,
                cache,
                device_queue,
                config.frames_in_flight,
            )?
        };

        let mut forward_pass = create_forward_pass(config.default_materials.clone())?;
        forward_pass.init(
            &ctx,
            &gpu,
            &mut store,
            swapchain.format(),
            swapchain.image_views(),
            swapchain.extent(),
        )?;

        engine_info!(
            ctx,
            "nebula3d::Renderer",
            "Renderer initialized ({} frames in flight, {} swapchain images)",
            frames.count(),
            swapchain.image_count()
        );

        Ok(Self {
            ctx,
            _entry: bundle.entry,
            instance: bundle.instance,
            debug_utils_loader: bundle.debug_utils_loader,
            debug_messenger: bundle.debug_messenger,
            device: bundle.device,
            present_queue: bundle.present_queue,
            gpu,
            allocator: ManuallyDrop::new(allocator),
            swapchain,
            frames,
            forward_pass,
            store,
            extent_provider,
            stats: RendererStats::default(),
            recreate_count: 0,
        })
    }

    /// Resource store (asset loaders create textures/meshes/materials here)
    pub fn store(&self) -> &RenderResourceStore {
        &self.store
    }

    /// Mutable resource store access
    pub fn store_mut(&mut self) -> &mut RenderResourceStore {
        &mut self.store
    }

    /// The forward pass (for creating materials against it)
    pub fn forward_pass(&self) -> &RenderPassPipeline {
        &self.forward_pass
    }

    /// Statistics of the most recently rendered frame
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Number of swapchain recreations since init
    pub fn recreate_count(&self) -> u64 {
        self.recreate_count
    }

    /// Block until the GPU is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle().map_err(|e| {
                engine_err!(self.ctx, "nebula3d::Renderer", "Failed to wait for device idle: {:?}", e)
            })
        }
    }

    /// Render one frame of `scene`.
    ///
    /// Safe to call at a steady cadence; an out-of-date swapchain recreates
    /// swapchain-scoped resources and silently drops the frame.
    pub fn render(&mut self, scene: &RenderScene) -> Result<()> {
        self.stats = RendererStats::default();

        // 1. Wait on this slot's fence: the GPU is done with the slot's
        //    command buffer and per-frame buffers.
        let frame = self.frames.current();
        frame.wait_fence(&self.ctx, &self.device)?;
        let command_buffer = frame.command_buffer;
        let image_available = frame.image_available;
        let render_finished = frame.render_finished;
        let render_fence = frame.render_fence;

        // 2. Acquire; out-of-date drops the frame and rebuilds.
        let (image_index, suboptimal_acquire) =
            match self.swapchain.acquire_next_image(&self.ctx, image_available) {
                Ok(pair) => pair,
                Err(Error::SwapchainOutOfDate) => {
                    self.recreate_swapchain()?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

        // 3. Reset the fence and command buffer for this slot.
        let frame = self.frames.current();
        frame.reset(&self.ctx, &self.device)?;

        // Per-frame data: camera from the scene, tunables from the cvars.
        frame.write_camera(&self.ctx, scene.camera())?;
        let ambient = self
            .ctx
            .with_cvars(|c| c.get_vec3_or("render.ambient_light", Vec3::splat(0.08)));
        let environment = EnvironmentData {
            ambient_color: ambient.extend(0.0),
            ..EnvironmentData::default()
        };
        frame.write_environment(&self.ctx, &environment)?;

        let clear_color = self.ctx.with_cvars(|c| {
            c.get_vec4_or("render.clear_color", Vec4::new(0.01, 0.01, 0.03, 1.0))
        });
        self.forward_pass.set_clear_color(clear_color.to_array());

        // 4. Record: begin → pass (subpasses in declared order) → end.
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| {
                    engine_err!(self.ctx, "nebula3d::Renderer", "Failed to begin command buffer: {:?}", e)
                })?;
        }

        self.forward_pass.cmd_execute(
            &self.ctx,
            &self.device,
            command_buffer,
            image_index as usize,
            &self.store,
            self.frames.current(),
            self.frames.instance_layout(),
            scene,
            &mut self.stats,
        )?;

        unsafe {
            self.device.end_command_buffer(command_buffer).map_err(|e| {
                engine_err!(self.ctx, "nebula3d::Renderer", "Failed to end command buffer: {:?}", e)
            })?;
        }

        // 5. Submit: wait on acquire, signal render-finished, fence the slot.
        unsafe {
            let wait_semaphores = [image_available];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [command_buffer];
            let signal_semaphores = [render_finished];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(self.gpu.graphics_queue, &[submit_info], render_fence)
                .map_err(|e| {
                    engine_err!(self.ctx, "nebula3d::Renderer", "Failed to submit commands to GPU queue: {:?}", e)
                })?;
        }

        // 6. Present, then advance the slot ring.
        let needs_recreate =
            self.swapchain
                .present(&self.ctx, self.present_queue, render_finished, image_index)?;
        self.frames.advance();

        if needs_recreate || suboptimal_acquire {
            self.recreate_swapchain()?;
        }

        let log_stats = self
            .ctx
            .with_cvars(|c| c.get_bool_or("render.log_frame_stats", false));
        if log_stats {
            engine_info!(
                self.ctx,
                "nebula3d::Renderer",
                "Frame: {} draws, {} triangles",
                self.stats.draw_calls,
                self.stats.triangles
            );
        }

        Ok(())
    }

    /// Tear down and rebuild swapchain-scoped resources at the current
    /// window size.
    ///
    /// Waits for all in-flight frames, flushes the swapchain-scoped
    /// destruction queue, then rebuilds the swapchain, attachment images
    /// and framebuffers.
    pub fn recreate_swapchain(&mut self) -> Result<()> {
        let (width, height) = (self.extent_provider)();
        if width == 0 || height == 0 {
            // Minimized: keep the old swapchain until the window is visible
            engine_warn!(
                self.ctx,
                "nebula3d::Renderer",
                "Skipping swapchain recreation for zero-sized window"
            );
            return Ok(());
        }

        self.wait_idle()?;
        self.swapchain.recreate(&self.ctx, (width, height))?;
        self.forward_pass.recreate_swapchain(
            &self.ctx,
            &self.gpu,
            self.swapchain.image_views(),
            self.swapchain.extent(),
        )?;
        self.recreate_count += 1;

        engine_info!(
            self.ctx,
            "nebula3d::Renderer",
            "Swapchain recreated at {}x{}",
            width,
            height
        );
        Ok(())
    }

    /// Ordered teardown of everything `init` created
    pub fn finalize(self) {
        let NebulaRenderer {
            ctx,
            _entry,
            instance,
            debug_utils_loader,
            debug_messenger,
            device,
            gpu,
            allocator,
            mut swapchain,
            mut frames,
            mut forward_pass,
            mut store,
            ..
        } = self;

        unsafe {
            device.device_wait_idle().ok();
        }

        // Pass resources (framebuffers, attachments, render pass), then
        // frame contexts, then the store's device-lifetime queue.
        forward_pass.destroy();
        frames.destroy(&device);
        store.finalize();
        drop(store); // releases the store's GpuContext reference
        swapchain.destroy();

        unsafe {
            device.destroy_command_pool(gpu.upload_command_pool, None);
        }

        // Drop the allocator before the device: release our Arc, then the
        // sole remaining one inside the GpuContext.
        drop(ManuallyDrop::into_inner(allocator));
        match Arc::into_inner(gpu) {
            Some(gpu_ctx) => {
                drop(ManuallyDrop::into_inner(gpu_ctx.allocator));
            }
            None => {
                engine_warn!(
                    ctx,
                    "nebula3d::Renderer",
                    "GpuContext still referenced at finalize; allocator not dropped"
                );
            }
        }

        unsafe {
            device.destroy_device(None);
            if let (Some(loader), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            instance.destroy_instance(None);
        }

        engine_info!(ctx, "nebula3d::Renderer", "Renderer finalized");
    }
}
