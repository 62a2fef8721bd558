/// Forward pass: swapchain color + depth, one scene-drawing subpass
///
/// The default pass the renderer drives each frame. Draw calls are batched
/// by (material, mesh) so pipeline and vertex-buffer binds change as rarely
/// as possible; per-draw state is one dynamic offset into the frame's
/// instance ring.

use ash::vk;
use nebula_3d_engine::gpu_data::InstanceData;
use nebula_3d_engine::{engine_warn, Result};

use crate::material::{SET_SLOT_INSTANCE, SET_SLOT_MATERIAL};
use crate::render_pass::{
    AttachmentKind, AttachmentSpec, DependencySpec, PassExtent, RenderPassPipeline, Subpass,
    SubpassRenderContext, SubpassSetup, SubpassSpec,
};

/// Depth format used by the forward pass
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Subpass that draws the scene's (material, mesh) batches
pub struct ForwardSubpass {
    /// Materials created lazily against this subpass at post-init
    default_materials: Vec<(String, String)>,
}

impl ForwardSubpass {
    /// `default_materials`: (material name, kind name) pairs created at
    /// post-init so a scene can reference them immediately
    pub fn new(default_materials: Vec<(String, String)>) -> Self {
        Self { default_materials }
    }
}

impl Subpass for ForwardSubpass {
    fn name(&self) -> &str {
        "forward"
    }

    fn post_init(&mut self, setup: &mut SubpassSetup<'_>) -> Result<()> {
        for (material_name, kind_name) in &self.default_materials {
            setup.store.create_material(
                material_name,
                kind_name,
                setup.render_pass,
                setup.subpass_index,
            )?;
        }
        Ok(())
    }

    fn cmd_render(&mut self, rc: &mut SubpassRenderContext<'_>) -> Result<()> {
        unsafe {
            // Y-flipped viewport: positive Y up, matching the engine's
            // coordinate convention
            let viewport = vk::Viewport {
                x: 0.0,
                y: rc.extent.height as f32,
                width: rc.extent.width as f32,
                height: -(rc.extent.height as f32),
                min_depth: 0.0,
                max_depth: 1.0,
            };
            rc.device.cmd_set_viewport(rc.command_buffer, 0, &[viewport]);

            let scissor = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: rc.extent,
            };
            rc.device.cmd_set_scissor(rc.command_buffer, 0, &[scissor]);

            let instances = rc.scene.instances();
            let mut next_instance_slot = 0usize;

            for batch in rc.scene.batches() {
                let material = match rc.store.material(batch.material) {
                    Some(material) => material,
                    None => {
                        engine_warn!(
                            rc.ctx,
                            "nebula3d::ForwardSubpass",
                            "Skipping batch: material '{}' not found",
                            batch.material
                        );
                        continue;
                    }
                };
                let mesh = match rc.store.mesh(batch.mesh) {
                    Some(mesh) => mesh,
                    None => {
                        engine_warn!(
                            rc.ctx,
                            "nebula3d::ForwardSubpass",
                            "Skipping batch: mesh '{}' not found",
                            batch.mesh
                        );
                        continue;
                    }
                };

                // Bind once per batch: pipeline, cull mode, material +
                // global sets, mesh buffers
                rc.device.cmd_bind_pipeline(
                    rc.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    material.pipeline,
                );
                rc.device
                    .cmd_set_cull_mode(rc.command_buffer, material.cull_mode);

                rc.device.cmd_bind_descriptor_sets(
                    rc.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    material.pipeline_layout,
                    SET_SLOT_MATERIAL,
                    &[material.descriptor_set.set, rc.frame.global_set.set],
                    &[],
                );

                rc.device.cmd_bind_vertex_buffers(
                    rc.command_buffer,
                    0,
                    &[mesh.vertex_buffer],
                    &[0],
                );
                rc.device.cmd_bind_index_buffer(
                    rc.command_buffer,
                    mesh.index_buffer,
                    0,
                    vk::IndexType::UINT32,
                );

                // One indexed draw per instance, selected by dynamic offset
                for &instance_index in &batch.instances {
                    let instance = &instances[instance_index];
                    let block = InstanceData::new(instance.transform);
                    let dynamic_offset = rc.frame.write_instance(
                        rc.ctx,
                        rc.instance_layout,
                        next_instance_slot,
                        &block,
                    )?;
                    next_instance_slot += 1;

                    rc.device.cmd_bind_descriptor_sets(
                        rc.command_buffer,
                        vk::PipelineBindPoint::GRAPHICS,
                        material.pipeline_layout,
                        SET_SLOT_INSTANCE,
                        &[rc.frame.instance_set.set],
                        &[dynamic_offset],
                    );

                    rc.device
                        .cmd_draw_indexed(rc.command_buffer, mesh.index_count, 1, 0, 0, 0);

                    rc.stats.draw_calls += 1;
                    rc.stats.triangles += mesh.index_count / 3;
                }
            }
        }
        Ok(())
    }
}

/// Build the swapchain-sized forward pass: color (swapchain) + depth, one
/// subpass, external dependencies covering color and depth writes
pub fn create_forward_pass(
    default_materials: Vec<(String, String)>,
) -> Result<RenderPassPipeline> {
    let attachments = vec![
        AttachmentSpec {
            kind: AttachmentKind::SwapchainColor,
            format: vk::Format::UNDEFINED, // swapchain format is used
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.01, 0.01, 0.03, 1.0],
                },
            },
        },
        AttachmentSpec {
            kind: AttachmentKind::Depth,
            format: DEPTH_FORMAT,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        },
    ];

    let subpasses = vec![SubpassSpec {
        color_attachments: vec![0],
        depth_attachment: Some(1),
        input_attachments: vec![],
    }];

    let dependencies = vec![
        // Color: wait for the previous frame's output (and the acquire
        // semaphore's stage) before writing
        DependencySpec {
            src: None,
            dst: 0,
            src_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        },
        // Depth: previous frame's late tests must finish before this
        // frame's early tests write
        DependencySpec {
            src: None,
            dst: 0,
            src_stage: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            dst_stage: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        },
    ];

    RenderPassPipeline::new(
        "forward",
        PassExtent::Swapchain,
        attachments,
        subpasses,
        dependencies,
        vec![Box::new(ForwardSubpass::new(default_materials))],
    )
}
