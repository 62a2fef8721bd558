/*!
# Nebula 3D Engine - Vulkan Renderer Backend

Vulkan implementation of the Nebula 3D render core.

Built on the Ash library for Vulkan bindings and gpu-allocator for memory
management. Implements the core crate's `DescriptorDevice` seam and drives
the frame submission protocol: per-slot fence wait → swapchain acquire →
command recording through the render-pass/subpass pipeline → submit →
present, with swapchain recreation handled internally.
*/

// Vulkan implementation modules
mod buffer;
mod debug;
mod descriptor_device;
mod forward;
mod frame_context;
mod gpu_context;
mod image;
mod instance;
mod material;
mod mesh;
mod render_pass;
mod renderer;
mod resource_store;
mod shader;
mod swapchain;

pub use buffer::GpuBuffer;
pub use descriptor_device::VulkanDescriptorDevice;
pub use forward::{create_forward_pass, ForwardSubpass, DEPTH_FORMAT};
pub use frame_context::{
    global_set_bindings, instance_set_bindings, FrameContext, FrameContexts,
    MAX_INSTANCES_PER_FRAME,
};
pub use gpu_context::GpuContext;
pub use image::{GpuImage, TextureCreateInfo};
pub use material::{
    Material, MaterialKind, MaterialRegistry, PipelineSpec, TexturedLitKind, UnlitKind,
    SET_SLOT_GLOBAL, SET_SLOT_INSTANCE, SET_SLOT_MATERIAL,
};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use render_pass::{
    validate_dependencies, AttachmentKind, AttachmentSpec, DependencySpec, PassExtent,
    RenderPassPipeline, Subpass, SubpassRenderContext, SubpassSetup, SubpassSpec,
};
pub use renderer::{NebulaRenderer, RendererConfig, RendererStats};
pub use resource_store::{RenderResourceStore, Texture2D, WHITE_TEXTURE};
pub use shader::{shader_path, ShaderStage};
pub use swapchain::{Swapchain, ACQUIRE_TIMEOUT_NS};
