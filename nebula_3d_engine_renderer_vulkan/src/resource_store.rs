/// Render resource store: named ownership of GPU resources
///
/// Owns textures, meshes, materials and shader modules by value in
/// name-keyed maps; consumers hold names, never independent ownership of
/// GPU handles. Creation is idempotent by name (a duplicate logs a warning
/// and the existing resource is kept). Every GPU object registers its
/// cleanup in the device-lifetime destruction queue at creation time, so
/// teardown is a single LIFO flush.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use nebula_3d_engine::descriptor::{
    DescriptorAllocator, DescriptorEditor, DescriptorLayoutCache, DescriptorSet, DescriptorType,
    ImageAccess,
};
use nebula_3d_engine::destruction_queue::DestructionQueue;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_debug, engine_err, engine_warn, Error, Result};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::buffer::create_device_local_buffer;
use crate::descriptor_device::VulkanDescriptorDevice;
use crate::frame_context::{global_set_bindings, instance_set_bindings};
use crate::gpu_context::GpuContext;
use crate::image::{create_default_sampler, create_texture_2d, GpuImage, TextureCreateInfo};
use crate::material::{build_pipeline, Material, MaterialRegistry};
use crate::mesh::{GpuMesh, MeshData};
use crate::shader::{load_shader_module, ShaderStage};

/// Name of the built-in 1x1 white texture bound to image slots until a real
/// texture is assigned
pub const WHITE_TEXTURE: &str = "__white";

/// A named sampled texture
pub struct Texture2D {
    pub image: GpuImage,
}

/// Central owner of named render resources and the shared descriptor
/// allocator/cache pair
pub struct RenderResourceStore {
    ctx: Arc<EngineContext>,
    gpu: Arc<GpuContext>,

    descriptor_device: VulkanDescriptorDevice,
    descriptor_allocator: DescriptorAllocator<VulkanDescriptorDevice>,
    layout_cache: DescriptorLayoutCache<VulkanDescriptorDevice>,
    registry: MaterialRegistry,

    textures: FxHashMap<String, Texture2D>,
    meshes: FxHashMap<String, GpuMesh>,
    materials: FxHashMap<String, Material>,
    /// Keyed `<name>.<stage suffix>`
    shader_modules: FxHashMap<String, vk::ShaderModule>,

    default_sampler: vk::Sampler,
    /// Device-lifetime cleanup, flushed once at finalize
    device_scope: DestructionQueue,
    shader_dir: PathBuf,
}

impl RenderResourceStore {
    /// Create the store with its default sampler and white texture
    pub fn new(
        ctx: Arc<EngineContext>,
        gpu: Arc<GpuContext>,
        shader_dir: PathBuf,
    ) -> Result<Self> {
        let default_sampler = create_default_sampler(&ctx, &gpu)?;

        let mut store = Self {
            descriptor_device: VulkanDescriptorDevice::new(gpu.device.clone()),
            descriptor_allocator: DescriptorAllocator::new(),
            layout_cache: DescriptorLayoutCache::new(),
            registry: MaterialRegistry::with_builtin_kinds(),
            textures: FxHashMap::default(),
            meshes: FxHashMap::default(),
            materials: FxHashMap::default(),
            shader_modules: FxHashMap::default(),
            default_sampler,
            device_scope: DestructionQueue::new(),
            shader_dir,
            ctx,
            gpu,
        };

        {
            let device = store.gpu.device.clone();
            let sampler = store.default_sampler;
            store.device_scope.push(move || unsafe {
                device.destroy_sampler(sampler, None);
            });
        }

        store.create_texture_2d(
            WHITE_TEXTURE,
            &TextureCreateInfo {
                width: 1,
                height: 1,
                format: vk::Format::R8G8B8A8_UNORM,
            },
            &[255, 255, 255, 255],
        )?;

        Ok(store)
    }

    /// Register a custom material kind
    pub fn register_material_kind(&mut self, kind: Box<dyn crate::material::MaterialKind>) {
        self.registry.register(kind);
    }

    // ===== CREATION (idempotent by name) =====

    /// Create a sampled 2D texture from raw pixel bytes.
    ///
    /// A second call under the same name warns and keeps the existing
    /// texture.
    pub fn create_texture_2d(
        &mut self,
        name: &str,
        info: &TextureCreateInfo,
        pixels: &[u8],
    ) -> Result<&Texture2D> {
        if self.textures.contains_key(name) {
            engine_warn!(
                self.ctx,
                "nebula3d::ResourceStore",
                "Texture '{}' already exists, keeping existing",
                name
            );
            return Ok(&self.textures[name]);
        }

        let (image, allocation) = create_texture_2d(&self.ctx, &self.gpu, name, info, pixels)?;
        self.register_image_cleanup(image.image, image.view, allocation);
        self.textures.insert(name.to_string(), Texture2D { image });

        engine_debug!(
            self.ctx,
            "nebula3d::ResourceStore",
            "Created texture '{}' ({}x{})",
            name,
            info.width,
            info.height
        );
        Ok(&self.textures[name])
    }

    /// Load a mesh from an OBJ file.
    ///
    /// A second call under the same name warns and keeps the existing mesh.
    pub fn create_mesh_from_file(&mut self, name: &str, path: &Path) -> Result<&GpuMesh> {
        if self.meshes.contains_key(name) {
            engine_warn!(
                self.ctx,
                "nebula3d::ResourceStore",
                "Mesh '{}' already exists, keeping existing",
                name
            );
            return Ok(&self.meshes[name]);
        }
        let data = MeshData::load_obj(&self.ctx, path)?;
        self.upload_mesh(name, &data)
    }

    /// Create a mesh from CPU-side data (procedural geometry, tests)
    pub fn create_mesh_from_data(&mut self, name: &str, data: &MeshData) -> Result<&GpuMesh> {
        if self.meshes.contains_key(name) {
            engine_warn!(
                self.ctx,
                "nebula3d::ResourceStore",
                "Mesh '{}' already exists, keeping existing",
                name
            );
            return Ok(&self.meshes[name]);
        }
        self.upload_mesh(name, data)
    }

    /// Create a material of a registered kind against a render pass and
    /// subpass index.
    ///
    /// A second call under the same name warns, keeps the existing material,
    /// and allocates nothing.
    pub fn create_material(
        &mut self,
        name: &str,
        type_name: &str,
        render_pass: vk::RenderPass,
        subpass_index: u32,
    ) -> Result<&Material> {
        if self.materials.contains_key(name) {
            engine_warn!(
                self.ctx,
                "nebula3d::ResourceStore",
                "Material '{}' already exists, keeping existing",
                name
            );
            return Ok(&self.materials[name]);
        }

        let kind = self.registry.get(type_name).ok_or_else(|| {
            engine_err!(
                self.ctx,
                "nebula3d::ResourceStore",
                "Unknown material kind '{}' for material '{}'",
                type_name,
                name
            )
        })?;
        let spec = kind.pipeline_spec();
        let material_bindings = kind.material_bindings();

        // The three slot layouts. Resolving the global/instance binding
        // lists through the cache returns the exact layout objects the
        // frame contexts' sets were allocated with, which is what keeps
        // every material's pipeline layout compatible with them.
        let global_layout = self
            .layout_cache
            .create_descriptor_layout(&mut self.descriptor_device, &global_set_bindings())?;
        let instance_layout = self
            .layout_cache
            .create_descriptor_layout(&mut self.descriptor_device, &instance_set_bindings())?;

        // Per-material set: image bindings start on the white texture
        let white_view = self
            .textures
            .get(WHITE_TEXTURE)
            .map(|t| t.image.view)
            .ok_or_else(|| Error::InvalidResource("white texture missing".to_string()))?;
        let sampler = self.default_sampler;

        let descriptor_set = if material_bindings.is_empty() {
            let layout = self
                .layout_cache
                .create_descriptor_layout(&mut self.descriptor_device, &[])?;
            let set = self
                .descriptor_allocator
                .allocate(&mut self.descriptor_device, layout)
                .map_err(|e| match e {
                    Error::OutOfPoolMemory => Error::AllocationFailed(
                        "descriptor pool exhausted after retry".to_string(),
                    ),
                    other => other,
                })?;
            DescriptorSet { layout, set }
        } else {
            let mut editor =
                DescriptorEditor::begin(&mut self.descriptor_allocator, &mut self.layout_cache);
            for binding in &material_bindings {
                match binding.descriptor_type {
                    DescriptorType::CombinedImageSampler => {
                        editor = editor.bind_image(
                            binding.binding,
                            binding.descriptor_type,
                            binding.stages,
                            sampler,
                            white_view,
                            ImageAccess::ShaderReadOnly,
                        );
                    }
                    other => {
                        return Err(engine_err!(
                            self.ctx,
                            "nebula3d::ResourceStore",
                            "Material kind '{}' declares unsupported binding type {:?}",
                            type_name,
                            other
                        ));
                    }
                }
            }
            editor.execute(&mut self.descriptor_device)?
        };

        // Shader modules are cached per (name, stage)
        let vert_module = self.get_or_load_shader(&spec.shader, ShaderStage::Vertex)?;
        let frag_module = self.get_or_load_shader(&spec.shader, ShaderStage::Fragment)?;

        let set_layouts = [descriptor_set.layout, global_layout, instance_layout];
        let (pipeline, pipeline_layout) = build_pipeline(
            &self.ctx,
            &self.gpu.device,
            render_pass,
            subpass_index,
            &spec,
            &set_layouts,
            vert_module,
            frag_module,
        )?;

        let device = self.gpu.device.clone();
        self.device_scope.push(move || unsafe {
            device.destroy_pipeline(pipeline, None);
            device.destroy_pipeline_layout(pipeline_layout, None);
        });

        self.materials.insert(
            name.to_string(),
            Material {
                name: name.to_string(),
                type_name: type_name.to_string(),
                pipeline,
                pipeline_layout,
                descriptor_set,
                cull_mode: spec.cull_mode,
            },
        );

        engine_debug!(
            self.ctx,
            "nebula3d::ResourceStore",
            "Created material '{}' of kind '{}'",
            name,
            type_name
        );
        Ok(&self.materials[name])
    }

    /// Swap a texture binding of an existing material (update-only path; no
    /// layout resolution, no set allocation)
    pub fn set_material_texture(
        &mut self,
        material_name: &str,
        binding: u32,
        texture_name: &str,
    ) -> Result<()> {
        let view = self
            .textures
            .get(texture_name)
            .map(|t| t.image.view)
            .ok_or_else(|| {
                engine_err!(
                    self.ctx,
                    "nebula3d::ResourceStore",
                    "Texture '{}' not found",
                    texture_name
                )
            })?;
        let target = self
            .materials
            .get(material_name)
            .map(|m| m.descriptor_set)
            .ok_or_else(|| {
                engine_err!(
                    self.ctx,
                    "nebula3d::ResourceStore",
                    "Material '{}' not found",
                    material_name
                )
            })?;

        let sampler = self.default_sampler;
        DescriptorEditor::begin(&mut self.descriptor_allocator, &mut self.layout_cache)
            .bind_image(
                binding,
                DescriptorType::CombinedImageSampler,
                nebula_3d_engine::descriptor::ShaderStageFlags::FRAGMENT,
                sampler,
                view,
                ImageAccess::ShaderReadOnly,
            )
            .execute_update(&mut self.descriptor_device, target);
        Ok(())
    }

    // ===== LOOKUP =====

    pub fn texture(&self, name: &str) -> Option<&Texture2D> {
        self.textures.get(name)
    }

    pub fn mesh(&self, name: &str) -> Option<&GpuMesh> {
        self.meshes.get(name)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Distinct descriptor layouts currently cached
    pub fn layout_cache_len(&self) -> usize {
        self.layout_cache.len()
    }

    /// Pending device-lifetime cleanup entries
    pub fn device_scope_len(&self) -> usize {
        self.device_scope.len()
    }

    // ===== SHARED DESCRIPTOR MACHINERY =====

    /// Split borrow of the descriptor device/allocator/cache plus the
    /// device-lifetime queue, for frame-context initialization
    pub fn frame_init_parts(
        &mut self,
    ) -> (
        &mut VulkanDescriptorDevice,
        &mut DescriptorAllocator<VulkanDescriptorDevice>,
        &mut DescriptorLayoutCache<VulkanDescriptorDevice>,
        &mut DestructionQueue,
    ) {
        (
            &mut self.descriptor_device,
            &mut self.descriptor_allocator,
            &mut self.layout_cache,
            &mut self.device_scope,
        )
    }

    // ===== TEARDOWN =====

    /// Flush the device-lifetime queue and destroy the descriptor machinery.
    ///
    /// The caller must have waited for device idle.
    pub fn finalize(&mut self) {
        // LIFO flush destroys pipelines before the buffers/images/sampler
        // they were registered after
        self.device_scope.flush();
        self.materials.clear();
        self.meshes.clear();
        self.textures.clear();

        unsafe {
            for (_, module) in self.shader_modules.drain() {
                self.gpu.device.destroy_shader_module(module, None);
            }
        }

        self.descriptor_allocator.finalize(&mut self.descriptor_device);
        self.layout_cache.finalize(&mut self.descriptor_device);
    }

    // ===== INTERNAL =====

    fn upload_mesh(&mut self, name: &str, data: &MeshData) -> Result<&GpuMesh> {
        let (vertex_buffer, vertex_allocation) = create_device_local_buffer(
            &self.ctx,
            &self.gpu,
            &format!("{}_vertices", name),
            bytemuck::cast_slice(&data.vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;
        let (index_buffer, index_allocation) = create_device_local_buffer(
            &self.ctx,
            &self.gpu,
            &format!("{}_indices", name),
            bytemuck::cast_slice(&data.indices),
            vk::BufferUsageFlags::INDEX_BUFFER,
        )?;

        let device = self.gpu.device.clone();
        let allocator = Arc::clone(&*self.gpu.allocator);
        let (vertex_vk, index_vk) = (vertex_buffer.buffer, index_buffer.buffer);
        self.device_scope.push(move || unsafe {
            if let Ok(mut a) = allocator.lock() {
                a.free(vertex_allocation).ok();
                a.free(index_allocation).ok();
            }
            device.destroy_buffer(vertex_vk, None);
            device.destroy_buffer(index_vk, None);
        });

        self.meshes.insert(
            name.to_string(),
            GpuMesh {
                vertex_buffer: vertex_buffer.buffer,
                index_buffer: index_buffer.buffer,
                index_count: data.indices.len() as u32,
            },
        );

        engine_debug!(
            self.ctx,
            "nebula3d::ResourceStore",
            "Created mesh '{}' ({} vertices, {} indices)",
            name,
            data.vertices.len(),
            data.indices.len()
        );
        Ok(&self.meshes[name])
    }

    fn register_image_cleanup(
        &mut self,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
    ) {
        let device = self.gpu.device.clone();
        let allocator = Arc::clone(&*self.gpu.allocator);
        self.device_scope.push(move || unsafe {
            device.destroy_image_view(view, None);
            if let Ok(mut a) = allocator.lock() {
                a.free(allocation).ok();
            }
            device.destroy_image(image, None);
        });
    }

    fn get_or_load_shader(&mut self, name: &str, stage: ShaderStage) -> Result<vk::ShaderModule> {
        let key = format!("{}.{}", name, stage.suffix());
        if let Some(&module) = self.shader_modules.get(&key) {
            return Ok(module);
        }
        let module =
            load_shader_module(&self.ctx, &self.gpu.device, &self.shader_dir, name, stage)?;
        self.shader_modules.insert(key, module);
        Ok(module)
    }
}
