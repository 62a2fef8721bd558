/// Mesh data, vertex layout, and OBJ-subset loading
///
/// CPU-side mesh data is indexed triangles with position/normal/uv vertices.
/// The loader handles the OBJ subset real asset exports use (v/vn/vt/f with
/// triangulated or quad faces); anything richer belongs to an asset
/// pipeline, not the render core.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, Result};
use std::path::Path;

/// Vertex layout shared by all meshes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Vertex input binding description (one interleaved buffer)
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Vertex attribute descriptions (position, normal, uv)
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

/// CPU-side indexed mesh
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Parse the OBJ subset: `v`, `vn`, `vt`, and `f` with 3 or 4 corners.
    ///
    /// Faces reference `v/vt/vn` triples; missing normals/uvs default to
    /// zero. Quads are triangulated as a fan.
    pub fn parse_obj(ctx: &EngineContext, source: &str, origin: &str) -> Result<Self> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        let parse_f32 = |ctx: &EngineContext, token: &str, line_no: usize| -> Result<f32> {
            token.parse::<f32>().map_err(|_| {
                engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Malformed number '{}' in '{}' line {}",
                    token,
                    origin,
                    line_no
                )
            })
        };

        for (line_no, line) in source.lines().enumerate() {
            let line_no = line_no + 1;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let x = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    let y = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    let z = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    positions.push([x, y, z]);
                }
                Some("vn") => {
                    let x = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    let y = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    let z = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    normals.push([x, y, z]);
                }
                Some("vt") => {
                    let u = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    let v = parse_f32(ctx, tokens.next().unwrap_or(""), line_no)?;
                    uvs.push([u, v]);
                }
                Some("f") => {
                    let corners: Vec<&str> = tokens.collect();
                    if corners.len() < 3 || corners.len() > 4 {
                        return Err(engine_err!(
                            ctx,
                            "nebula3d::vulkan",
                            "Face with {} corners in '{}' line {} (3 or 4 supported)",
                            corners.len(),
                            origin,
                            line_no
                        ));
                    }

                    let mut face_indices = Vec::with_capacity(corners.len());
                    for corner in &corners {
                        let vertex =
                            parse_obj_corner(ctx, corner, &positions, &normals, &uvs, origin, line_no)?;
                        face_indices.push(vertices.len() as u32);
                        vertices.push(vertex);
                    }

                    // Triangle, or quad triangulated as a fan
                    indices.extend_from_slice(&[face_indices[0], face_indices[1], face_indices[2]]);
                    if face_indices.len() == 4 {
                        indices.extend_from_slice(&[
                            face_indices[0],
                            face_indices[2],
                            face_indices[3],
                        ]);
                    }
                }
                _ => {} // comments, object names, materials: ignored
            }
        }

        if vertices.is_empty() {
            return Err(engine_err!(
                ctx,
                "nebula3d::vulkan",
                "No faces found in '{}'",
                origin
            ));
        }

        Ok(Self { vertices, indices })
    }

    /// Load and parse an OBJ file from disk
    pub fn load_obj(ctx: &EngineContext, path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            engine_err!(
                ctx,
                "nebula3d::vulkan",
                "Failed to read mesh file '{}': {}",
                path.display(),
                e
            )
        })?;
        Self::parse_obj(ctx, &source, &path.display().to_string())
    }
}

/// Resolve one `f` corner (`v`, `v/vt`, `v//vn`, or `v/vt/vn`) into a vertex
fn parse_obj_corner(
    ctx: &EngineContext,
    corner: &str,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
    origin: &str,
    line_no: usize,
) -> Result<Vertex> {
    let mut parts = corner.split('/');

    let resolve = |list_len: usize, token: Option<&str>| -> Result<Option<usize>> {
        match token {
            None | Some("") => Ok(None),
            Some(t) => {
                let raw: i64 = t.parse().map_err(|_| {
                    engine_err!(
                        ctx,
                        "nebula3d::vulkan",
                        "Malformed face index '{}' in '{}' line {}",
                        corner,
                        origin,
                        line_no
                    )
                })?;
                // OBJ indices are 1-based; negatives count from the end
                let index = if raw > 0 {
                    (raw - 1) as usize
                } else {
                    (list_len as i64 + raw) as usize
                };
                if index >= list_len {
                    return Err(engine_err!(
                        ctx,
                        "nebula3d::vulkan",
                        "Face index {} out of range in '{}' line {}",
                        raw,
                        origin,
                        line_no
                    ));
                }
                Ok(Some(index))
            }
        }
    };

    let position_index = resolve(positions.len(), parts.next())?.ok_or_else(|| {
        engine_err!(
            ctx,
            "nebula3d::vulkan",
            "Face corner '{}' missing position index in '{}' line {}",
            corner,
            origin,
            line_no
        )
    })?;
    let uv_index = resolve(uvs.len(), parts.next())?;
    let normal_index = resolve(normals.len(), parts.next())?;

    Ok(Vertex {
        position: positions[position_index],
        normal: normal_index.map(|i| normals[i]).unwrap_or([0.0, 0.0, 0.0]),
        uv: uv_index.map(|i| uvs[i]).unwrap_or([0.0, 0.0]),
    })
}

/// GPU-resident mesh: device-local vertex and index buffers
pub struct GpuMesh {
    pub vertex_buffer: vk::Buffer,
    pub index_buffer: vk::Buffer,
    pub index_count: u32,
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
