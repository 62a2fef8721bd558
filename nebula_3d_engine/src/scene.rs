//! Minimal scene representation consumed by the frame submission loop
//!
//! The render core does not own scene management; it only needs a flat list
//! of instances (mesh name, material name, transform) and a batching order
//! that minimizes redundant pipeline and vertex-buffer binds.

use glam::Mat4;

use crate::gpu_data::CameraData;

/// One drawable: a mesh rendered with a material at a transform
#[derive(Debug, Clone)]
pub struct RenderInstance {
    /// Mesh name in the render resource store
    pub mesh: String,
    /// Material name in the render resource store
    pub material: String,
    /// World transform
    pub transform: Mat4,
}

impl RenderInstance {
    pub fn new(mesh: impl Into<String>, material: impl Into<String>, transform: Mat4) -> Self {
        Self {
            mesh: mesh.into(),
            material: material.into(),
            transform,
        }
    }
}

/// A group of instances sharing one (material, mesh) pair.
///
/// The submission loop binds the material's pipeline and the mesh's buffers
/// once per batch, then issues one indexed draw per instance with that
/// instance's dynamic offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch<'s> {
    pub material: &'s str,
    pub mesh: &'s str,
    /// Indices into the scene's instance list
    pub instances: Vec<usize>,
}

/// Flat instance list (plus the active camera) handed to `render()` each
/// frame
#[derive(Debug, Clone, Default)]
pub struct RenderScene {
    camera: CameraData,
    instances: Vec<RenderInstance>,
}

impl RenderScene {
    /// Create an empty scene with an identity camera
    pub fn new() -> Self {
        Self {
            camera: CameraData::default(),
            instances: Vec::new(),
        }
    }

    /// Set the camera block uploaded for this scene's frames
    pub fn set_camera(&mut self, camera: CameraData) {
        self.camera = camera;
    }

    /// The active camera block
    pub fn camera(&self) -> &CameraData {
        &self.camera
    }

    /// Add an instance; returns its index
    pub fn add_instance(&mut self, instance: RenderInstance) -> usize {
        self.instances.push(instance);
        self.instances.len() - 1
    }

    /// All instances in insertion order
    pub fn instances(&self) -> &[RenderInstance] {
        &self.instances
    }

    /// Mutable access for per-frame transform updates
    pub fn instances_mut(&mut self) -> &mut [RenderInstance] {
        &mut self.instances
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the scene holds no instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Remove all instances
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Group instances by (material, mesh) for recording.
    ///
    /// Batches are ordered by material name first so pipeline binds change
    /// least often, then by mesh name so vertex/index buffer binds change
    /// least often within a material.
    pub fn batches(&self) -> Vec<DrawBatch<'_>> {
        let mut order: Vec<usize> = (0..self.instances.len()).collect();
        order.sort_by(|&a, &b| {
            let ia = &self.instances[a];
            let ib = &self.instances[b];
            ia.material
                .cmp(&ib.material)
                .then_with(|| ia.mesh.cmp(&ib.mesh))
        });

        let mut batches: Vec<DrawBatch<'_>> = Vec::new();
        for idx in order {
            let instance = &self.instances[idx];
            match batches.last_mut() {
                Some(batch)
                    if batch.material == instance.material && batch.mesh == instance.mesh =>
                {
                    batch.instances.push(idx);
                }
                _ => batches.push(DrawBatch {
                    material: &instance.material,
                    mesh: &instance.mesh,
                    instances: vec![idx],
                }),
            }
        }
        batches
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
