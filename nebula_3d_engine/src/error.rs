//! Error types for the Nebula3D engine
//!
//! This module defines the error types used throughout the engine,
//! including rendering, initialization, and resource management.

use std::fmt;

/// Result type for Nebula3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nebula3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Descriptor pool exhausted even after a fresh-pool retry
    OutOfPoolMemory,

    /// Descriptor set allocation failed (layout resolution or pool allocation)
    AllocationFailed(String),

    /// Invalid resource (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, renderer, subsystems)
    InitializationFailed(String),

    /// Swapchain is out of date and must be recreated before the next frame
    SwapchainOutOfDate,
}

impl Error {
    /// Whether this error is the recoverable resize signal.
    ///
    /// Out-of-date swapchains are expected during window resizes; the
    /// submission loop recreates swapchain-scoped resources and drops the
    /// current frame instead of failing.
    pub fn is_swapchain_out_of_date(&self) -> bool {
        matches!(self, Error::SwapchainOutOfDate)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::OutOfPoolMemory => write!(f, "Descriptor pool exhausted after retry"),
            Error::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
