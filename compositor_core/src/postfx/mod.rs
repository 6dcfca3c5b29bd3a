//! Post-processing
//!
//! Effects are chained by the `EffectStack`, which routes each effect's
//! input and output through two ping-pong scratch targets and writes the
//! final image to the caller's destination.

mod effect;
mod parameter_ui;
mod fullscreen_quad;
mod effect_stack;
mod bloom;
mod fog;
mod invert;

pub use effect::{Effect, ApplyContext, SharedParameters};
pub use parameter_ui::ParameterUi;
#[cfg(any(test, feature = "mock-device"))]
pub use parameter_ui::{RecordingUi, UiEdit};
pub use fullscreen_quad::FullscreenQuad;
pub use effect_stack::{EffectStack, EffectId, ProcessStats};
pub use bloom::{BloomEffect, BloomDebugMode};
pub use fog::{FogEffect, FogMode, FogDebugMode};
pub use invert::InvertEffect;
