/// Materials: capability kinds, registry, and pipeline construction
///
/// A material pairs one per-material descriptor set with a graphics
/// pipeline and the pipeline layout spanning the three descriptor slots
/// (material / global-per-frame / per-instance). Material behavior is
/// selected through a name-keyed registry of [`MaterialKind`]
/// implementations rather than a type hierarchy.

use ash::vk;
use nebula_3d_engine::descriptor::{DescriptorSet, LayoutBinding, ShaderStageFlags};
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Result};
use rustc_hash::FxHashMap;

use crate::descriptor_device::VulkanDescriptorDevice;
use crate::mesh::Vertex;

/// Descriptor slot indices shared by every material pipeline layout
pub const SET_SLOT_MATERIAL: u32 = 0;
pub const SET_SLOT_GLOBAL: u32 = 1;
pub const SET_SLOT_INSTANCE: u32 = 2;

/// Shader and fixed-function configuration for one material kind
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    /// Shader base name (`<shader_dir>/<name>.vert.spv` / `.frag.spv`)
    pub shader: String,
    pub cull_mode: vk::CullModeFlags,
    pub depth_test: bool,
    pub depth_write: bool,
    pub alpha_blend: bool,
    pub topology: vk::PrimitiveTopology,
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            shader: "unlit".to_string(),
            cull_mode: vk::CullModeFlags::BACK,
            depth_test: true,
            depth_write: true,
            alpha_blend: false,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
        }
    }
}

/// Capability set one material kind implements: its per-material descriptor
/// shape and its pipeline configuration.
///
/// Kinds are stateless; per-material state (bound textures) lives in the
/// material's descriptor set.
pub trait MaterialKind: Send + Sync {
    /// Registry key
    fn type_name(&self) -> &'static str;

    /// Bindings of the per-material descriptor slot (may be empty)
    fn material_bindings(&self) -> Vec<LayoutBinding>;

    /// Shader and fixed-function state
    fn pipeline_spec(&self) -> PipelineSpec;
}

/// Flat-color kind: no per-material bindings
pub struct UnlitKind;

impl MaterialKind for UnlitKind {
    fn type_name(&self) -> &'static str {
        "unlit"
    }

    fn material_bindings(&self) -> Vec<LayoutBinding> {
        Vec::new()
    }

    fn pipeline_spec(&self) -> PipelineSpec {
        PipelineSpec {
            shader: "unlit".to_string(),
            ..PipelineSpec::default()
        }
    }
}

/// Textured, ambient+sun lit kind: one combined image sampler at binding 0
pub struct TexturedLitKind;

impl MaterialKind for TexturedLitKind {
    fn type_name(&self) -> &'static str {
        "textured_lit"
    }

    fn material_bindings(&self) -> Vec<LayoutBinding> {
        vec![LayoutBinding::combined_image_sampler(
            0,
            ShaderStageFlags::FRAGMENT,
        )]
    }

    fn pipeline_spec(&self) -> PipelineSpec {
        PipelineSpec {
            shader: "textured_lit".to_string(),
            ..PipelineSpec::default()
        }
    }
}

/// Name-keyed factory of material kinds.
///
/// Creating a material resolves its `type_name` here; unknown names are an
/// error at creation time, not a runtime dispatch failure.
pub struct MaterialRegistry {
    kinds: FxHashMap<&'static str, Box<dyn MaterialKind>>,
}

impl MaterialRegistry {
    /// Registry seeded with the built-in kinds
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self {
            kinds: FxHashMap::default(),
        };
        registry.register(Box::new(UnlitKind));
        registry.register(Box::new(TexturedLitKind));
        registry
    }

    /// Register a kind (replaces an existing kind of the same name)
    pub fn register(&mut self, kind: Box<dyn MaterialKind>) {
        self.kinds.insert(kind.type_name(), kind);
    }

    /// Look up a kind by name
    pub fn get(&self, type_name: &str) -> Option<&dyn MaterialKind> {
        self.kinds.get(type_name).map(|k| k.as_ref())
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// A named material: descriptor set + pipeline + layout chain
pub struct Material {
    pub name: String,
    pub type_name: String,
    pub pipeline: vk::Pipeline,
    pub pipeline_layout: vk::PipelineLayout,
    /// Per-material descriptor set (slot 0)
    pub descriptor_set: DescriptorSet<VulkanDescriptorDevice>,
    /// Bound with `cmd_set_cull_mode` per draw batch
    pub cull_mode: vk::CullModeFlags,
}

/// Build a graphics pipeline for `spec` against `render_pass` /
/// `subpass_index`.
///
/// Viewport, scissor and cull mode are dynamic; everything else is baked.
/// The viewport is set Y-flipped at record time to match the engine's
/// upward Y convention.
pub(crate) fn build_pipeline(
    ctx: &EngineContext,
    device: &ash::Device,
    render_pass: vk::RenderPass,
    subpass_index: u32,
    spec: &PipelineSpec,
    set_layouts: &[vk::DescriptorSetLayout],
    vert_module: vk::ShaderModule,
    frag_module: vk::ShaderModule,
) -> Result<(vk::Pipeline, vk::PipelineLayout)> {
    unsafe {
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(set_layouts);
        let pipeline_layout = device
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| {
                engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to create pipeline layout for shader '{}': {:?}",
                    spec.shader,
                    e
                )
            })?;

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module)
                .name(c"main"),
        ];

        let bindings = [Vertex::binding_description()];
        let attributes = Vertex::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(spec.topology)
            .primitive_restart_enable(false);

        // Viewport/scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(spec.cull_mode)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(spec.depth_test)
            .depth_write_enable(spec.depth_write)
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachment = if spec.alpha_blend {
            vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD)
                .color_write_mask(vk::ColorComponentFlags::RGBA)
        } else {
            vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(false)
                .color_write_mask(vk::ColorComponentFlags::RGBA)
        };
        let blend_attachments = [blend_attachment];
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::CULL_MODE,
        ];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .render_pass(render_pass)
            .subpass(subpass_index);

        let pipelines = device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
            .map_err(|(_, e)| {
                device.destroy_pipeline_layout(pipeline_layout, None);
                engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to create graphics pipeline for shader '{}': {:?}",
                    spec.shader,
                    e
                )
            })?;

        Ok((pipelines[0], pipeline_layout))
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
