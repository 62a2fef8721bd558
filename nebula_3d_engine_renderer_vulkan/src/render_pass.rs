/// Render pass / subpass pipeline
///
/// A pass composes one or more subpasses into a single `vk::RenderPass`
/// with declarative attachment and dependency descriptions. Swapchain-sized
/// passes own one framebuffer per swapchain image and rebuild attachments
/// and framebuffers on resize; fixed-size passes (shadow maps) never do.
///
/// Init sequence: instantiate subpass objects (builder) → declare clear
/// values → allocate attachment images → build the render-pass object →
/// build framebuffers → post-init (subpasses build pipelines/materials
/// against the final pass and subpass index).

use ash::vk;
use nebula_3d_engine::destruction_queue::DestructionQueue;
use nebula_3d_engine::frame::RingBufferLayout;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::scene::RenderScene;
use nebula_3d_engine::{engine_err, Error, Result};
use std::sync::Arc;

use crate::frame_context::FrameContext;
use crate::gpu_context::GpuContext;
use crate::image::{create_image, GpuImage};
use crate::renderer::RendererStats;
use crate::resource_store::RenderResourceStore;

/// How a pass's attachments are sized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassExtent {
    /// Match the swapchain; rebuilt on resize
    Swapchain,
    /// Fixed size independent of the window (e.g. shadow maps)
    Fixed { width: u32, height: u32 },
}

/// What backs an attachment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// The swapchain's presentable image (final color output)
    SwapchainColor,
    /// A pass-owned color image
    Color,
    /// A pass-owned depth image
    Depth,
}

/// Declarative attachment description
#[derive(Clone, Copy)]
pub struct AttachmentSpec {
    pub kind: AttachmentKind,
    /// Ignored for `SwapchainColor` (the swapchain format is used)
    pub format: vk::Format,
    pub clear_value: vk::ClearValue,
}

impl std::fmt::Debug for AttachmentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentSpec")
            .field("kind", &self.kind)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Declarative subpass description (attachment indices into the pass)
#[derive(Debug, Clone, Default)]
pub struct SubpassSpec {
    pub color_attachments: Vec<u32>,
    pub depth_attachment: Option<u32>,
    pub input_attachments: Vec<u32>,
}

/// Declarative execution/memory dependency between subpasses
#[derive(Debug, Clone, Copy)]
pub struct DependencySpec {
    /// `None` = VK_SUBPASS_EXTERNAL
    pub src: Option<u32>,
    pub dst: u32,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

/// Everything a subpass needs to build its pipelines/materials
pub struct SubpassSetup<'a> {
    pub ctx: &'a EngineContext,
    pub store: &'a mut RenderResourceStore,
    pub render_pass: vk::RenderPass,
    pub subpass_index: u32,
}

/// Everything a subpass needs to record its draws
pub struct SubpassRenderContext<'a> {
    pub ctx: &'a EngineContext,
    pub device: &'a ash::Device,
    pub command_buffer: vk::CommandBuffer,
    pub extent: vk::Extent2D,
    pub store: &'a RenderResourceStore,
    pub frame: &'a FrameContext,
    pub instance_layout: &'a RingBufferLayout,
    pub scene: &'a RenderScene,
    pub stats: &'a mut RendererStats,
}

/// One stage of a render pass.
///
/// Subpasses execute in declared order within one render-pass instance via
/// `NextSubpass` transitions.
pub trait Subpass {
    fn name(&self) -> &str;

    /// Build pipelines/materials against the now-final render pass
    fn post_init(&mut self, setup: &mut SubpassSetup<'_>) -> Result<()>;

    /// Record this subpass's draw commands
    fn cmd_render(&mut self, rc: &mut SubpassRenderContext<'_>) -> Result<()>;
}

/// Validate that dependencies match declared execution order.
///
/// A dependency whose source subpass comes after (or is) its destination is
/// a forward reference and rejected; all indices must be in range.
pub fn validate_dependencies(
    dependencies: &[DependencySpec],
    subpass_count: usize,
) -> std::result::Result<(), String> {
    for (i, dep) in dependencies.iter().enumerate() {
        if dep.dst as usize >= subpass_count {
            return Err(format!(
                "dependency {}: dst subpass {} out of range ({} subpasses)",
                i, dep.dst, subpass_count
            ));
        }
        if let Some(src) = dep.src {
            if src as usize >= subpass_count {
                return Err(format!(
                    "dependency {}: src subpass {} out of range ({} subpasses)",
                    i, src, subpass_count
                ));
            }
            if src >= dep.dst {
                return Err(format!(
                    "dependency {}: src subpass {} does not precede dst {}",
                    i, src, dep.dst
                ));
            }
        }
    }
    Ok(())
}

/// A render pass with its subpasses, attachments, and framebuffers
pub struct RenderPassPipeline {
    name: String,
    extent_mode: PassExtent,
    attachment_specs: Vec<AttachmentSpec>,
    subpass_specs: Vec<SubpassSpec>,
    dependencies: Vec<DependencySpec>,
    subpasses: Vec<Box<dyn Subpass>>,

    render_pass: vk::RenderPass,
    /// Pass-owned attachment images, parallel to `attachment_specs`
    /// (`None` for swapchain slots)
    owned_attachments: Vec<Option<GpuImage>>,
    framebuffers: Vec<vk::Framebuffer>,
    clear_values: Vec<vk::ClearValue>,
    extent: vk::Extent2D,

    /// Swapchain-scoped cleanup: attachment images and framebuffers,
    /// flushed on recreate and at teardown
    swapchain_scope: DestructionQueue,
    /// Pass-lifetime cleanup: the render-pass object itself
    pass_scope: DestructionQueue,
}

impl RenderPassPipeline {
    /// Instantiate a pass from its declarative parts (the pre-init step).
    ///
    /// Nothing touches the GPU until [`init`](Self::init).
    pub fn new(
        name: impl Into<String>,
        extent_mode: PassExtent,
        attachment_specs: Vec<AttachmentSpec>,
        subpass_specs: Vec<SubpassSpec>,
        dependencies: Vec<DependencySpec>,
        subpasses: Vec<Box<dyn Subpass>>,
    ) -> Result<Self> {
        if subpass_specs.len() != subpasses.len() {
            return Err(Error::InvalidResource(format!(
                "pass declares {} subpass specs but {} subpass objects",
                subpass_specs.len(),
                subpasses.len()
            )));
        }
        validate_dependencies(&dependencies, subpass_specs.len())
            .map_err(Error::InvalidResource)?;

        Ok(Self {
            name: name.into(),
            extent_mode,
            attachment_specs,
            subpass_specs,
            dependencies,
            subpasses,
            render_pass: vk::RenderPass::null(),
            owned_attachments: Vec::new(),
            framebuffers: Vec::new(),
            clear_values: Vec::new(),
            extent: vk::Extent2D {
                width: 0,
                height: 0,
            },
            swapchain_scope: DestructionQueue::new(),
            pass_scope: DestructionQueue::new(),
        })
    }

    /// Pass name (diagnostics)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying render-pass object (valid after `init`)
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Current attachment extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Pending swapchain-scoped cleanup entries (resize-leak diagnostics)
    pub fn swapchain_scope_len(&self) -> usize {
        self.swapchain_scope.len()
    }

    /// Run the full init sequence against the current swapchain state
    pub fn init(
        &mut self,
        ctx: &EngineContext,
        gpu: &GpuContext,
        store: &mut RenderResourceStore,
        swapchain_format: vk::Format,
        swapchain_views: &[vk::ImageView],
        swapchain_extent: vk::Extent2D,
    ) -> Result<()> {
        self.declare_clear_values();
        self.resolve_extent(swapchain_extent);
        self.allocate_attachments(ctx, gpu)?;
        self.build_render_pass(ctx, gpu, swapchain_format)?;
        self.build_framebuffers(ctx, gpu, swapchain_views)?;

        // post-init: subpasses build pipelines/materials against the final
        // render pass and their subpass index
        for (index, subpass) in self.subpasses.iter_mut().enumerate() {
            let mut setup = SubpassSetup {
                ctx,
                store,
                render_pass: self.render_pass,
                subpass_index: index as u32,
            };
            subpass.post_init(&mut setup)?;
        }
        Ok(())
    }

    /// Update the clear color of the first color attachment (read from the
    /// cvar store once per frame)
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        for (spec, clear) in self
            .attachment_specs
            .iter()
            .zip(self.clear_values.iter_mut())
        {
            if matches!(spec.kind, AttachmentKind::SwapchainColor | AttachmentKind::Color) {
                *clear = vk::ClearValue {
                    color: vk::ClearColorValue { float32: color },
                };
                break;
            }
        }
    }

    /// Record the whole pass: begin → subpasses in declared order (with
    /// `NextSubpass` transitions) → end
    pub fn cmd_execute(
        &mut self,
        rc_ctx: &EngineContext,
        device: &ash::Device,
        command_buffer: vk::CommandBuffer,
        framebuffer_index: usize,
        store: &RenderResourceStore,
        frame: &FrameContext,
        instance_layout: &RingBufferLayout,
        scene: &RenderScene,
        stats: &mut RendererStats,
    ) -> Result<()> {
        let framebuffer = *self.framebuffers.get(framebuffer_index).ok_or_else(|| {
            engine_err!(
                rc_ctx,
                "nebula3d::vulkan",
                "Framebuffer index {} out of range for pass '{}' ({} framebuffers)",
                framebuffer_index,
                self.name,
                self.framebuffers.len()
            )
        })?;

        unsafe {
            let begin_info = vk::RenderPassBeginInfo::default()
                .render_pass(self.render_pass)
                .framebuffer(framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: self.extent,
                })
                .clear_values(&self.clear_values);

            device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);

            for (index, subpass) in self.subpasses.iter_mut().enumerate() {
                if index > 0 {
                    device.cmd_next_subpass(command_buffer, vk::SubpassContents::INLINE);
                }
                let mut rc = SubpassRenderContext {
                    ctx: rc_ctx,
                    device,
                    command_buffer,
                    extent: self.extent,
                    store,
                    frame,
                    instance_layout,
                    scene,
                    stats: &mut *stats,
                };
                subpass.cmd_render(&mut rc)?;
            }

            device.cmd_end_render_pass(command_buffer);
        }
        Ok(())
    }

    /// Rebuild attachment images and framebuffers at the new extent.
    ///
    /// The caller must have waited for all in-flight frames. Fixed-size
    /// passes never need this and return immediately. The render-pass
    /// object itself survives (formats are unchanged), so subpass pipelines
    /// stay valid.
    pub fn recreate_swapchain(
        &mut self,
        ctx: &EngineContext,
        gpu: &GpuContext,
        swapchain_views: &[vk::ImageView],
        swapchain_extent: vk::Extent2D,
    ) -> Result<()> {
        if matches!(self.extent_mode, PassExtent::Fixed { .. }) {
            return Ok(());
        }

        // Drop old framebuffers and attachment images
        self.swapchain_scope.flush();
        self.framebuffers.clear();
        self.owned_attachments.clear();

        self.resolve_extent(swapchain_extent);
        self.allocate_attachments(ctx, gpu)?;
        self.build_framebuffers(ctx, gpu, swapchain_views)?;
        Ok(())
    }

    /// Tear the pass down: swapchain-scoped resources first, then the
    /// render-pass object
    pub fn destroy(&mut self) {
        self.swapchain_scope.flush();
        self.framebuffers.clear();
        self.owned_attachments.clear();
        self.pass_scope.flush();
        self.render_pass = vk::RenderPass::null();
    }

    // ===== init steps =====

    fn declare_clear_values(&mut self) {
        self.clear_values = self
            .attachment_specs
            .iter()
            .map(|spec| spec.clear_value)
            .collect();
    }

    fn resolve_extent(&mut self, swapchain_extent: vk::Extent2D) {
        self.extent = match self.extent_mode {
            PassExtent::Swapchain => swapchain_extent,
            PassExtent::Fixed { width, height } => vk::Extent2D { width, height },
        };
    }

    /// Allocate pass-owned attachment images (swapchain slots stay None)
    fn allocate_attachments(&mut self, ctx: &EngineContext, gpu: &GpuContext) -> Result<()> {
        let device_handle = gpu.device.clone();
        let allocator_handle = Arc::clone(&*gpu.allocator);

        self.owned_attachments = Vec::with_capacity(self.attachment_specs.len());
        for (index, spec) in self.attachment_specs.iter().enumerate() {
            match spec.kind {
                AttachmentKind::SwapchainColor => self.owned_attachments.push(None),
                AttachmentKind::Color | AttachmentKind::Depth => {
                    let (usage, aspect) = if spec.kind == AttachmentKind::Depth {
                        (
                            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                            vk::ImageAspectFlags::DEPTH,
                        )
                    } else {
                        (
                            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
                            vk::ImageAspectFlags::COLOR,
                        )
                    };

                    let (image, allocation) = create_image(
                        ctx,
                        gpu,
                        &format!("{}_attachment{}", self.name, index),
                        self.extent,
                        spec.format,
                        usage,
                        aspect,
                    )?;

                    let device = device_handle.clone();
                    let allocator = Arc::clone(&allocator_handle);
                    let (vk_image, vk_view) = (image.image, image.view);
                    self.swapchain_scope.push(move || unsafe {
                        device.destroy_image_view(vk_view, None);
                        if let Ok(mut a) = allocator.lock() {
                            a.free(allocation).ok();
                        }
                        device.destroy_image(vk_image, None);
                    });

                    self.owned_attachments.push(Some(image));
                }
            }
        }
        Ok(())
    }

    /// Build the render-pass object from attachments + subpass descriptions
    /// + inter-subpass dependencies
    fn build_render_pass(
        &mut self,
        ctx: &EngineContext,
        gpu: &GpuContext,
        swapchain_format: vk::Format,
    ) -> Result<()> {
        let attachment_descs: Vec<vk::AttachmentDescription> = self
            .attachment_specs
            .iter()
            .map(|spec| match spec.kind {
                AttachmentKind::SwapchainColor => vk::AttachmentDescription::default()
                    .format(swapchain_format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
                AttachmentKind::Color => vk::AttachmentDescription::default()
                    .format(spec.format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                AttachmentKind::Depth => vk::AttachmentDescription::default()
                    .format(spec.format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            })
            .collect();

        // Per-subpass reference arrays must outlive the descriptions
        let mut color_refs: Vec<Vec<vk::AttachmentReference>> = Vec::new();
        let mut input_refs: Vec<Vec<vk::AttachmentReference>> = Vec::new();
        let mut depth_refs: Vec<Option<vk::AttachmentReference>> = Vec::new();

        for spec in &self.subpass_specs {
            color_refs.push(
                spec.color_attachments
                    .iter()
                    .map(|&a| vk::AttachmentReference {
                        attachment: a,
                        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                    })
                    .collect(),
            );
            input_refs.push(
                spec.input_attachments
                    .iter()
                    .map(|&a| vk::AttachmentReference {
                        attachment: a,
                        layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    })
                    .collect(),
            );
            depth_refs.push(spec.depth_attachment.map(|a| vk::AttachmentReference {
                attachment: a,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            }));
        }

        let subpass_descs: Vec<vk::SubpassDescription> = self
            .subpass_specs
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let mut desc = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .color_attachments(&color_refs[i]);
                if !input_refs[i].is_empty() {
                    desc = desc.input_attachments(&input_refs[i]);
                }
                if let Some(depth) = &depth_refs[i] {
                    desc = desc.depth_stencil_attachment(depth);
                }
                desc
            })
            .collect();

        let dependency_descs: Vec<vk::SubpassDependency> = self
            .dependencies
            .iter()
            .map(|dep| vk::SubpassDependency {
                src_subpass: dep.src.unwrap_or(vk::SUBPASS_EXTERNAL),
                dst_subpass: dep.dst,
                src_stage_mask: dep.src_stage,
                dst_stage_mask: dep.dst_stage,
                src_access_mask: dep.src_access,
                dst_access_mask: dep.dst_access,
                dependency_flags: vk::DependencyFlags::empty(),
            })
            .collect();

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachment_descs)
            .subpasses(&subpass_descs)
            .dependencies(&dependency_descs);

        let render_pass = unsafe {
            gpu.device.create_render_pass(&create_info, None).map_err(|e| {
                engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to create render pass '{}': {:?}",
                    self.name,
                    e
                )
            })?
        };

        self.render_pass = render_pass;
        let device = gpu.device.clone();
        self.pass_scope.push(move || unsafe {
            device.destroy_render_pass(render_pass, None);
        });
        Ok(())
    }

    /// One framebuffer per swapchain image (swapchain-sized passes), or a
    /// single framebuffer for fixed-size passes
    fn build_framebuffers(
        &mut self,
        ctx: &EngineContext,
        gpu: &GpuContext,
        swapchain_views: &[vk::ImageView],
    ) -> Result<()> {
        let uses_swapchain = self
            .attachment_specs
            .iter()
            .any(|s| s.kind == AttachmentKind::SwapchainColor);
        let framebuffer_count = if uses_swapchain {
            swapchain_views.len()
        } else {
            1
        };

        let device_handle = gpu.device.clone();
        for framebuffer_index in 0..framebuffer_count {
            let views: Vec<vk::ImageView> = self
                .attachment_specs
                .iter()
                .zip(self.owned_attachments.iter())
                .map(|(spec, owned)| match spec.kind {
                    AttachmentKind::SwapchainColor => swapchain_views[framebuffer_index],
                    _ => owned.as_ref().expect("owned attachment missing").view,
                })
                .collect();

            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&views)
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);

            let framebuffer = unsafe {
                gpu.device.create_framebuffer(&create_info, None).map_err(|e| {
                    engine_err!(
                        ctx,
                        "nebula3d::vulkan",
                        "Failed to create framebuffer for pass '{}': {:?}",
                        self.name,
                        e
                    )
                })?
            };

            let device = device_handle.clone();
            self.swapchain_scope.push(move || unsafe {
                device.destroy_framebuffer(framebuffer, None);
            });
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
