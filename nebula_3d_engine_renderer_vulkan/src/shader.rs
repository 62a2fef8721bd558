/// SPIR-V shader module loading
///
/// Compiled shader binaries are read from disk at material-creation time
/// using the `<shader_dir>/<name>.<stage>.spv` convention.

use ash::vk;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Result};
use std::path::Path;

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// File-name suffix for this stage (`vert` / `frag`)
    pub fn suffix(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
        }
    }

    /// Vulkan stage flag for pipeline creation
    pub fn to_vk(&self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }
}

/// Path of a compiled shader: `<shader_dir>/<name>.<stage>.spv`
pub fn shader_path(shader_dir: &Path, name: &str, stage: ShaderStage) -> std::path::PathBuf {
    shader_dir.join(format!("{}.{}.spv", name, stage.suffix()))
}

/// Load a SPIR-V binary from disk and create a shader module.
///
/// A missing or malformed binary is a fatal configuration error; there is no
/// fallback shader.
pub fn load_shader_module(
    ctx: &EngineContext,
    device: &ash::Device,
    shader_dir: &Path,
    name: &str,
    stage: ShaderStage,
) -> Result<vk::ShaderModule> {
    let path = shader_path(shader_dir, name, stage);

    let bytes = std::fs::read(&path).map_err(|e| {
        engine_err!(
            ctx,
            "nebula3d::vulkan",
            "Failed to read shader binary '{}': {}",
            path.display(),
            e
        )
    })?;

    let words = ash::util::read_spv(&mut std::io::Cursor::new(&bytes)).map_err(|e| {
        engine_err!(
            ctx,
            "nebula3d::vulkan",
            "Invalid SPIR-V in '{}': {}",
            path.display(),
            e
        )
    })?;

    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

    unsafe {
        device.create_shader_module(&create_info, None).map_err(|e| {
            engine_err!(
                ctx,
                "nebula3d::vulkan",
                "Failed to create shader module from '{}': {:?}",
                path.display(),
                e
            )
        })
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
