//! Unit tests for gpu_data.rs

use super::*;
use glam::{Mat4, Vec3};

#[test]
fn test_camera_data_view_proj_is_product() {
    let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
    let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);
    let camera = CameraData::new(view, proj, Vec3::new(0.0, 0.0, 5.0));

    assert_eq!(camera.view_proj, proj * view);
    assert_eq!(camera.position.w, 1.0);
}

#[test]
fn test_instance_data_normal_matrix() {
    // For a pure rotation the normal matrix equals the model matrix
    let model = Mat4::from_rotation_y(0.7);
    let instance = InstanceData::new(model);

    let diff = (instance.normal - model).abs();
    assert!(diff.to_cols_array().iter().all(|v| *v < 1e-5));
}

#[test]
fn test_pod_sizes_are_16_byte_aligned() {
    // std140 uniform blocks require 16-byte multiples
    assert_eq!(std::mem::size_of::<CameraData>() % 16, 0);
    assert_eq!(std::mem::size_of::<EnvironmentData>() % 16, 0);
    assert_eq!(std::mem::size_of::<InstanceData>() % 16, 0);
}

#[test]
fn test_pod_cast_roundtrip() {
    let camera = CameraData::default();
    let bytes: &[u8] = bytemuck::bytes_of(&camera);
    assert_eq!(bytes.len(), std::mem::size_of::<CameraData>());

    let back: &CameraData = bytemuck::from_bytes(bytes);
    assert_eq!(*back, camera);
}

#[test]
fn test_environment_default_sun_is_normalized() {
    let env = EnvironmentData::default();
    let len = env.sun_direction.truncate().length();
    assert!((len - 1.0).abs() < 1e-5);
}
