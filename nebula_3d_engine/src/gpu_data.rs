//! Per-frame GPU buffer layouts
//!
//! POD structs uploaded into the frame contexts' ring buffers each frame.
//! Layouts are `repr(C)` and padded to std140-compatible 16-byte boundaries;
//! the shader side declares matching uniform blocks.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Camera block, bound at the global-per-frame descriptor slot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraData {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    /// World-space camera position (w unused)
    pub position: Vec4,
}

impl CameraData {
    /// Build the block from view/projection matrices and camera position
    pub fn new(view: Mat4, proj: Mat4, position: Vec3) -> Self {
        Self {
            view,
            proj,
            view_proj: proj * view,
            position: position.extend(1.0),
        }
    }
}

impl Default for CameraData {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO)
    }
}

/// Environment block (ambient light, sun), bound alongside the camera
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EnvironmentData {
    /// RGB ambient color, A unused
    pub ambient_color: Vec4,
    /// Normalized world-space direction towards the sun (w unused)
    pub sun_direction: Vec4,
    /// RGB sun color, A = intensity
    pub sun_color: Vec4,
}

impl Default for EnvironmentData {
    fn default() -> Self {
        Self {
            ambient_color: Vec4::new(0.08, 0.08, 0.08, 0.0),
            sun_direction: Vec4::new(0.0, -1.0, 0.3, 0.0).normalize(),
            sun_color: Vec4::new(1.0, 0.96, 0.9, 1.0),
        }
    }
}

/// Per-instance block, indexed with a dynamic offset per draw
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: Mat4,
    /// Inverse-transpose of `model` for normal transformation
    pub normal: Mat4,
}

impl InstanceData {
    /// Build the block from a model matrix
    pub fn new(model: Mat4) -> Self {
        Self {
            model,
            normal: model.inverse().transpose(),
        }
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[cfg(test)]
#[path = "gpu_data_tests.rs"]
mod tests;
