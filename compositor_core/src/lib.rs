/*!
# Compositor Core

Render-target and multi-pass compositing core of a real-time 3D renderer.

The crate never talks to a graphics API directly: everything goes through the
object-safe `GraphicsDevice` trait, implemented by the platform backend (and by
`MockGraphicsDevice` for tests, behind the `mock-device` feature).

## Architecture

- **RenderTarget**: off-screen framebuffer + attachments, fully valid or fully torn down
- **Effect**: one post-processing stage (bloom, fog, invert, ...)
- **EffectStack**: ordered effect registry and the per-frame ping-pong chain
- **ShadowPass**: one depth map per active light, rendered before the opaque pass
- **FramePipeline**: shadows, light upload, opaque pass, then the effect stack

Data flows one way per frame: shadow maps feed the opaque pass, the opaque
pass fills the scene target, and the effect stack turns the scene target into
the caller's destination target.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod device;
pub mod target;
pub mod postfx;
pub mod shadow;
pub mod scene;

// Main compositor namespace module
pub mod compositor {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logger + device)
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{CompositorConfig, ShadowSettings};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics device seam
    pub mod device {
        pub use crate::device::*;
    }

    // Render targets
    pub mod target {
        pub use crate::target::*;
    }

    // Post-processing
    pub mod postfx {
        pub use crate::postfx::*;
    }

    // Shadow mapping
    pub mod shadow {
        pub use crate::shadow::*;
    }

    // Drawables, opaque pass and frame pipeline
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
