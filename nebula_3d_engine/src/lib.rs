/*!
# Nebula 3D Engine

Render-resource and frame-synchronization core for the Nebula 3D rendering
engine.

This crate provides the platform-agnostic half of the renderer: GPU resource
lifetime management (destruction queues), descriptor-set pooling and layout
deduplication, frame-in-flight slot arithmetic, and the scene/batching types
the submission loop consumes. Backend implementations (Vulkan) build on the
seams defined here.

## Architecture

- **DestructionQueue**: deferred LIFO cleanup per lifetime scope
- **DescriptorAllocator / DescriptorLayoutCache / DescriptorEditor**:
  pooled set allocation, structural layout dedup, fluent set building
- **FrameRing / RingBufferLayout**: frame-in-flight slot and write-region math
- **EngineContext**: explicit logging + cvar context (no global singletons)
- **RenderScene**: flat instance list with (material, mesh) draw batching
*/

// Internal modules
mod error;
pub mod context;
pub mod cvar;
pub mod descriptor;
pub mod destruction_queue;
pub mod frame;
pub mod gpu_data;
pub mod log;
pub mod scene;

// Main nebula3d namespace module
pub mod nebula3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Explicit engine context (replaces global singletons)
    pub use crate::context::EngineContext;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Console variables
    pub mod cvar {
        pub use crate::cvar::{CvarStore, CvarValue};
    }

    // Descriptor subsystem
    pub mod descriptor {
        pub use crate::descriptor::*;
    }

    // Frame synchronization helpers
    pub mod frame {
        pub use crate::frame::*;
    }

    // Per-frame GPU data blocks
    pub mod gpu_data {
        pub use crate::gpu_data::*;
    }

    // Deferred destruction
    pub use crate::destruction_queue::DestructionQueue;

    // Scene types
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export error types at crate root for `use nebula_3d_engine::{Error, Result}`
pub use error::{Error, Result};

// Re-export math library at crate root
pub use glam;
