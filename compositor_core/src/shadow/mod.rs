//! Shadow mapping
//!
//! `ShadowPass` renders one depth map per active light (up to `MAX_LIGHTS`)
//! before the opaque pass; `LightUniformBuffer` carries the packed light
//! array the opaque shaders read.

mod light;
mod shadow_pass;

pub use light::{
    light_space_matrix, LightBuffer, LightSnapshot, LightType, LightUniformBuffer, LIGHT_UBO_BINDING, MAX_LIGHTS,
};
pub use shadow_pass::ShadowPass;
