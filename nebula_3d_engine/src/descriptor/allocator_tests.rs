//! Unit tests for descriptor/allocator.rs

use super::*;
use crate::descriptor::mock_device::MockDescriptorDevice;
use crate::descriptor::types::{LayoutBinding, ShaderStageFlags};
use crate::descriptor::types::DescriptorLayoutInfo;

fn any_layout(device: &mut MockDescriptorDevice) -> u32 {
    let info = DescriptorLayoutInfo::from_bindings(vec![LayoutBinding::uniform_buffer(
        0,
        ShaderStageFlags::VERTEX,
    )]);
    device.create_layout(&info).unwrap()
}

// ============================================================================
// Lazy pool creation and basic allocation
// ============================================================================

#[test]
fn test_first_allocation_creates_pool_lazily() {
    let mut device = MockDescriptorDevice::new(4);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    assert!(!allocator.has_current_pool());
    assert_eq!(device.pools_created, 0);

    allocator.allocate(&mut device, layout).unwrap();

    assert!(allocator.has_current_pool());
    assert_eq!(device.pools_created, 1);
}

#[test]
fn test_allocations_share_current_pool() {
    let mut device = MockDescriptorDevice::new(8);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    for _ in 0..8 {
        allocator.allocate(&mut device, layout).unwrap();
    }

    assert_eq!(device.pools_created, 1);
    assert_eq!(allocator.used_pool_count(), 0);
}

// ============================================================================
// Retry-once behavior
// ============================================================================

#[test]
fn test_exhausted_pool_retires_and_retries_once() {
    let mut device = MockDescriptorDevice::new(2);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    // Fill the first pool, then one more allocation forces a fresh pool
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();

    assert_eq!(device.pools_created, 2);
    assert_eq!(allocator.used_pool_count(), 1);
    assert!(allocator.has_current_pool());
}

#[test]
fn test_fragmentation_also_triggers_retry() {
    let mut device = MockDescriptorDevice::new(16);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    allocator.allocate(&mut device, layout).unwrap();

    device.fail_next_with_fragmentation = true;
    allocator.allocate(&mut device, layout).unwrap();

    // The fragmented pool was retired; a second pool serves the retry
    assert_eq!(device.pools_created, 2);
    assert_eq!(allocator.used_pool_count(), 1);
}

#[test]
fn test_double_failure_is_out_of_pool_memory() {
    // Zero-capacity pools: the original attempt and the fresh-pool retry
    // both fail, surfacing Error::OutOfPoolMemory
    let mut device = MockDescriptorDevice::new(0);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    let result = allocator.allocate(&mut device, layout);
    assert!(matches!(result, Err(Error::OutOfPoolMemory)));
}

#[test]
fn test_pool_creation_failure_propagates() {
    let mut device = MockDescriptorDevice::new(4);
    device.fail_pool_creation = true;
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    let result = allocator.allocate(&mut device, layout);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// Pool lifecycle (reset / recycle)
// ============================================================================

#[test]
fn test_reset_pools_moves_everything_to_free() {
    let mut device = MockDescriptorDevice::new(1);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    // Three allocations across three one-set pools
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();
    assert_eq!(allocator.used_pool_count(), 2);

    allocator.reset_pools(&mut device).unwrap();

    assert_eq!(allocator.used_pool_count(), 0);
    assert_eq!(allocator.free_pool_count(), 3);
    assert!(!allocator.has_current_pool());
}

#[test]
fn test_allocation_after_reset_reuses_free_pool() {
    let mut device = MockDescriptorDevice::new(4);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    allocator.allocate(&mut device, layout).unwrap();
    allocator.reset_pools(&mut device).unwrap();
    let created_before = device.pools_created;

    allocator.allocate(&mut device, layout).unwrap();

    // The free pool was recycled; no new pool was created
    assert_eq!(device.pools_created, created_before);
    assert_eq!(allocator.free_pool_count(), 0);
    assert!(allocator.has_current_pool());
}

// ============================================================================
// Finalize
// ============================================================================

#[test]
fn test_finalize_destroys_all_pools() {
    let mut device = MockDescriptorDevice::new(1);
    let mut allocator = DescriptorAllocator::new();
    let layout = any_layout(&mut device);

    // Two used pools plus one current
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();
    allocator.allocate(&mut device, layout).unwrap();

    // And one free pool via reset of a separate allocator cycle
    allocator.reset_pools(&mut device).unwrap();
    allocator.allocate(&mut device, layout).unwrap();

    allocator.finalize(&mut device);

    assert_eq!(device.live_pool_count(), 0);
    assert_eq!(device.destroyed_pools.len(), device.pools_created as usize);
    assert!(!allocator.has_current_pool());
    assert_eq!(allocator.used_pool_count(), 0);
    assert_eq!(allocator.free_pool_count(), 0);
}
