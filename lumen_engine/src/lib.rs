/*!
# Lumen Engine

Runtime core of a real-time 3D renderer: a scene graph of transforms and
lifecycle-driven components, a ring of per-frame GPU resources paced by a
completion fence, and a fixed render pass graph (shadow, G-buffer, ambient
occlusion, lighting, forward, post chain, presentation).

## Architecture

- **SceneGraph**: arena of scene objects and components with lazy world
  matrices and deferred, fence-guarded destruction
- **FrameResourceRing**: per-frame command lists and constant buffers
- **RenderQueueBuilder**: per-frame buckets of draws keyed by pipeline state
- **RenderPassGraph**: compiled pass sequence with derived state transitions
- **FrameLoop**: drives one frame from slot acquisition to present
- **GraphicsDevice**: backend traits; `graphics_device::headless` records
  commands in memory

Backends implement the `graphics_device` traits; the core never names a
graphics API.
*/

// Internal modules
mod error;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod frame;
pub mod resource;
pub mod camera;
pub mod scene;
pub mod services;
pub mod render_graph;
mod frame_loop;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{abort_on_fatal, Error, Result};

    // Configuration
    pub use crate::config::{AoConfig, EngineConfig, PassConfig, PostEffects, ShadowConfig};

    // Frame loop
    pub use crate::frame_loop::FrameLoop;

    // Logging sub-module (types and logger slot, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger, set_min_severity, min_severity};
    }

    // Graphics device sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Frame pacing sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Render graph sub-module
    pub mod render {
        pub use crate::render_graph::*;
    }

    // Collaborator interfaces
    pub mod services {
        pub use crate::services::*;
    }
}

// Re-export math library at crate root
pub use glam;
