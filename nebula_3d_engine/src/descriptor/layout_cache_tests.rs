//! Unit tests for descriptor/layout_cache.rs

use super::*;
use crate::descriptor::mock_device::MockDescriptorDevice;
use crate::descriptor::types::ShaderStageFlags;

// ============================================================================
// Deduplication tests
// ============================================================================

#[test]
fn test_identical_bindings_share_one_layout() {
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    let bindings = [
        LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
        LayoutBinding::combined_image_sampler(1, ShaderStageFlags::FRAGMENT),
    ];

    let first = cache.create_descriptor_layout(&mut device, &bindings).unwrap();
    let second = cache.create_descriptor_layout(&mut device, &bindings).unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    // The cache hit made no device call
    assert_eq!(device.created_layouts.len(), 1);
}

#[test]
fn test_permuted_bindings_share_one_layout() {
    // Same content, different call order: the dedup key is order-independent
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    let a = cache
        .create_descriptor_layout(
            &mut device,
            &[
                LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
                LayoutBinding::combined_image_sampler(1, ShaderStageFlags::FRAGMENT),
            ],
        )
        .unwrap();
    let b = cache
        .create_descriptor_layout(
            &mut device,
            &[
                LayoutBinding::combined_image_sampler(1, ShaderStageFlags::FRAGMENT),
                LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX),
            ],
        )
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_differing_stages_create_distinct_layouts() {
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    let a = cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX)],
        )
        .unwrap();
    let b = cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::uniform_buffer(
                0,
                ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
            )],
        )
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(cache.len(), 2);
    assert_eq!(device.created_layouts.len(), 2);
}

#[test]
fn test_differing_type_creates_distinct_layouts() {
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    let a = cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX)],
        )
        .unwrap();
    let b = cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::storage_buffer(0, ShaderStageFlags::VERTEX)],
        )
        .unwrap();

    assert_ne!(a, b);
}

// ============================================================================
// Finalize tests
// ============================================================================

#[test]
fn test_finalize_destroys_every_cached_layout() {
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::uniform_buffer(0, ShaderStageFlags::VERTEX)],
        )
        .unwrap();
    cache
        .create_descriptor_layout(
            &mut device,
            &[LayoutBinding::combined_image_sampler(0, ShaderStageFlags::FRAGMENT)],
        )
        .unwrap();
    assert_eq!(cache.len(), 2);

    cache.finalize(&mut device);

    assert!(cache.is_empty());
    assert_eq!(device.destroyed_layouts.len(), 2);
}

#[test]
fn test_cache_stores_sorted_canonical_info() {
    let mut device = MockDescriptorDevice::new(8);
    let mut cache = DescriptorLayoutCache::new();

    cache
        .create_descriptor_layout(
            &mut device,
            &[
                LayoutBinding::combined_image_sampler(3, ShaderStageFlags::FRAGMENT),
                LayoutBinding::uniform_buffer(1, ShaderStageFlags::VERTEX),
            ],
        )
        .unwrap();

    let info = &device.created_layouts[0];
    let indices: Vec<u32> = info.bindings().iter().map(|b| b.binding).collect();
    assert_eq!(indices, vec![1, 3]);
}
