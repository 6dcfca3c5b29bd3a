//! Scene-side passes
//!
//! The scene graph is an external collaborator: each frame it hands over
//! `Drawable`s and `LightSnapshot`s. `FramePipeline` turns those into the
//! final composited image.

mod material;
mod drawable;
mod opaque_pass;
mod frame_pipeline;

pub use material::{Material, MaterialTexture};
pub use drawable::Drawable;
pub use opaque_pass::{OpaquePass, OpaqueStats, SHADOW_MAP_UNIT_BASE};
pub use frame_pipeline::{FrameInputs, FramePipeline, FrameStats};
