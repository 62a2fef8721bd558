//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("Vulkan initialization failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("Vulkan initialization failed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    let display = format!("{}", err);
    assert_eq!(display, "Out of GPU memory");
}

#[test]
fn test_out_of_pool_memory_display() {
    let err = Error::OutOfPoolMemory;
    let display = format!("{}", err);
    assert!(display.contains("pool"));
    assert!(display.contains("retry"));
}

#[test]
fn test_allocation_failed_display() {
    let err = Error::AllocationFailed("descriptor set".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Allocation failed"));
    assert!(display.contains("descriptor set"));
}

#[test]
fn test_swapchain_out_of_date_display() {
    let err = Error::SwapchainOutOfDate;
    let display = format!("{}", err);
    assert!(display.contains("Swapchain out of date"));
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Texture not found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Texture not found"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Window creation failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Window creation failed"));
}

// ============================================================================
// RECOVERABILITY CLASSIFICATION
// ============================================================================

#[test]
fn test_swapchain_out_of_date_is_recoverable() {
    assert!(Error::SwapchainOutOfDate.is_swapchain_out_of_date());
}

#[test]
fn test_other_errors_are_not_the_resize_signal() {
    assert!(!Error::OutOfMemory.is_swapchain_out_of_date());
    assert!(!Error::OutOfPoolMemory.is_swapchain_out_of_date());
    assert!(!Error::BackendError("x".to_string()).is_swapchain_out_of_date());
    assert!(!Error::AllocationFailed("x".to_string()).is_swapchain_out_of_date());
    assert!(!Error::InitializationFailed("x".to_string()).is_swapchain_out_of_date());
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    // Verify Error implements std::error::Error trait
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let err1 = Error::BackendError("test".to_string());
    assert!(format!("{:?}", err1).contains("BackendError"));

    let err2 = Error::OutOfPoolMemory;
    assert!(format!("{:?}", err2).contains("OutOfPoolMemory"));

    let err3 = Error::SwapchainOutOfDate;
    assert!(format!("{:?}", err3).contains("SwapchainOutOfDate"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::AllocationFailed("test".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));

    let err3 = Error::SwapchainOutOfDate;
    let err4 = err3.clone();
    assert_eq!(format!("{}", err3), format!("{}", err4));
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::OutOfPoolMemory)
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    let result = outer();
    assert!(result.is_err());
}
