//! Unit tests for scene.rs

use super::*;
use glam::Mat4;

fn scene_with(pairs: &[(&str, &str)]) -> RenderScene {
    let mut scene = RenderScene::new();
    for (mesh, material) in pairs {
        scene.add_instance(RenderInstance::new(*mesh, *material, Mat4::IDENTITY));
    }
    scene
}

// ============================================================================
// Basic scene tests
// ============================================================================

#[test]
fn test_new_scene_is_empty() {
    let scene = RenderScene::new();
    assert!(scene.is_empty());
    assert_eq!(scene.len(), 0);
    assert!(scene.batches().is_empty());
}

#[test]
fn test_add_instance_returns_index() {
    let mut scene = RenderScene::new();
    let a = scene.add_instance(RenderInstance::new("cube", "stone", Mat4::IDENTITY));
    let b = scene.add_instance(RenderInstance::new("cube", "stone", Mat4::IDENTITY));
    assert_eq!(a, 0);
    assert_eq!(b, 1);
    assert_eq!(scene.len(), 2);
}

#[test]
fn test_clear_removes_instances() {
    let mut scene = scene_with(&[("cube", "stone")]);
    scene.clear();
    assert!(scene.is_empty());
}

#[test]
fn test_camera_roundtrip() {
    use crate::gpu_data::CameraData;
    use glam::Vec3;

    let mut scene = RenderScene::new();
    let camera = CameraData::new(
        Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        Mat4::perspective_rh(1.2, 1.5, 0.1, 50.0),
        Vec3::new(0.0, 0.0, 3.0),
    );
    scene.set_camera(camera);
    assert_eq!(*scene.camera(), camera);
}

// ============================================================================
// Batching tests
// ============================================================================

#[test]
fn test_batches_group_same_material_and_mesh() {
    let scene = scene_with(&[
        ("cube", "stone"),
        ("cube", "stone"),
        ("cube", "stone"),
    ]);

    let batches = scene.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].material, "stone");
    assert_eq!(batches[0].mesh, "cube");
    assert_eq!(batches[0].instances, vec![0, 1, 2]);
}

#[test]
fn test_batches_order_by_material_then_mesh() {
    let scene = scene_with(&[
        ("sphere", "wood"),
        ("cube", "stone"),
        ("sphere", "stone"),
        ("cube", "wood"),
    ]);

    let batches = scene.batches();
    let keys: Vec<(&str, &str)> = batches.iter().map(|b| (b.material, b.mesh)).collect();
    assert_eq!(
        keys,
        vec![
            ("stone", "cube"),
            ("stone", "sphere"),
            ("wood", "cube"),
            ("wood", "sphere"),
        ]
    );
}

#[test]
fn test_batches_interleaved_instances_coalesce() {
    // Instances added in an interleaved order still coalesce into one batch
    // per (material, mesh) pair.
    let scene = scene_with(&[
        ("cube", "stone"),   // 0
        ("sphere", "stone"), // 1
        ("cube", "stone"),   // 2
        ("sphere", "stone"), // 3
    ]);

    let batches = scene.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].instances, vec![0, 2]);
    assert_eq!(batches[1].instances, vec![1, 3]);
}

#[test]
fn test_batch_indices_cover_all_instances() {
    let scene = scene_with(&[
        ("a", "m1"),
        ("b", "m2"),
        ("a", "m2"),
        ("b", "m1"),
        ("a", "m1"),
    ]);

    let batches = scene.batches();
    let mut covered: Vec<usize> = batches.iter().flat_map(|b| b.instances.clone()).collect();
    covered.sort_unstable();
    assert_eq!(covered, vec![0, 1, 2, 3, 4]);
}
