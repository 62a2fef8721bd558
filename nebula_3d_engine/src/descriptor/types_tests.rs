//! Unit tests for descriptor/types.rs

use super::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(info: &DescriptorLayoutInfo) -> u64 {
    let mut hasher = DefaultHasher::new();
    info.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Normalization tests
// ============================================================================

#[test]
fn test_from_bindings_sorts_by_index() {
    let info = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::combined_image_sampler(2, ShaderStageFlags::FRAGMENT),
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
        LayoutBinding::storage_buffer(1, ShaderStageFlags::VERTEX),
    ]);

    let indices: Vec<u32> = info.bindings().iter().map(|b| b.binding).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

// ============================================================================
// Equality / hash tests (dedup key correctness)
// ============================================================================

#[test]
fn test_permutations_are_equal_and_hash_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
        LayoutBinding::combined_image_sampler(1, ShaderStageFlags::FRAGMENT),
    ]);
    let b = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::combined_image_sampler(1, ShaderStageFlags::FRAGMENT),
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
    ]);

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_different_binding_index_not_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    let b = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        1,
        ShaderStageFlags::VERTEX,
    )]);
    assert_ne!(a, b);
}

#[test]
fn test_different_type_not_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    let b = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::storage_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    assert_ne!(a, b);
}

#[test]
fn test_different_stages_not_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    let b = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
    )]);
    assert_ne!(a, b);
}

#[test]
fn test_different_count_not_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::combined_image_sampler(0, ShaderStageFlags::FRAGMENT),
    ]);
    let b = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::combined_image_sampler(0, ShaderStageFlags::FRAGMENT).with_count(4),
    ]);
    assert_ne!(a, b);
}

#[test]
fn test_different_length_not_equal() {
    let a = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    let b = DescriptorLayoutInfo::from_bindings(vec![
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
        LayoutBinding::uniform_buffer(1, ShaderStageFlags::VERTEX),
    ]);
    assert_ne!(a, b);
}

// ============================================================================
// DescriptorType helper tests
// ============================================================================

#[test]
fn test_type_classification() {
    assert!(DescriptorType::UniformBuffer.is_buffer());
    assert!(DescriptorType::UniformBufferDynamic.is_buffer());
    assert!(DescriptorType::StorageBuffer.is_buffer());
    assert!(!DescriptorType::CombinedImageSampler.is_buffer());

    assert!(DescriptorType::CombinedImageSampler.is_image());
    assert!(DescriptorType::InputAttachment.is_image());
    assert!(!DescriptorType::UniformBuffer.is_image());

    assert!(DescriptorType::UniformBufferDynamic.is_dynamic());
    assert!(!DescriptorType::UniformBuffer.is_dynamic());
}
