/// Opaque pass - draws every enabled drawable into the bound scene target
/// with its material, the camera matrices and the shadow maps

use glam::Mat4;
use crate::device::{GraphicsDevice, ShaderHandle, UniformValue};
use crate::postfx::SharedParameters;
use crate::scene::Drawable;
use crate::shadow::ShadowPass;
use crate::{engine_debug, engine_trace};

/// Texture unit of shadow map 0; map `i` is bound at `SHADOW_MAP_UNIT_BASE + i`
/// (units below are left to material textures)
pub const SHADOW_MAP_UNIT_BASE: u32 = 3;

/// Counters for one `OpaquePass::render`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpaqueStats {
    /// Drawables submitted
    pub drawn: u32,
    /// Enabled drawables skipped for lack of a material or program
    pub skipped: u32,
    /// Mesh draw calls issued
    pub meshes: u32,
}

#[derive(Debug, Default)]
pub struct OpaquePass;

impl OpaquePass {
    pub fn new() -> Self {
        Self
    }

    /// Draw `drawables` into whatever target is bound
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        view: Mat4,
        projection: Mat4,
        drawables: &[Drawable],
        shadow: &ShadowPass,
        shared: &SharedParameters,
    ) -> OpaqueStats {
        let mut stats = OpaqueStats::default();
        let view_projection = projection * view;

        for drawable in drawables.iter().filter(|d| d.enabled) {
            let Some(shader) = drawable.material.as_ref().and_then(|m| m.apply(device)) else {
                engine_debug!(
                    "compositor::OpaquePass",
                    "Skipping '{}': no material or shader",
                    drawable.name
                );
                stats.skipped += 1;
                continue;
            };

            device.set_uniform(shader, "mvpMatrix", (view_projection * drawable.world_transform).into());
            device.set_uniform(shader, "modelMatrix", drawable.world_transform.into());
            for (name, value) in shared {
                device.set_uniform(shader, name, *value);
            }

            // After the material so its own texture bindings cannot shadow these
            Self::bind_shadow_maps(device, shader, shadow);

            for mesh in &drawable.meshes {
                device.draw_mesh(*mesh);
                stats.meshes += 1;
            }
            stats.drawn += 1;
        }

        stats
    }

    /// Lights from the first missing map onward are not advertised
    fn bind_shadow_maps(device: &mut dyn GraphicsDevice, shader: ShaderHandle, shadow: &ShadowPass) {
        let count = shadow.usable_count();
        if count < shadow.active_count() {
            engine_trace!(
                "compositor::OpaquePass",
                "Shadow map {} missing, shadowing {} of {} lights",
                count,
                count,
                shadow.active_count()
            );
        }
        for index in 0..count {
            let unit = SHADOW_MAP_UNIT_BASE + index as u32;
            device.bind_texture(unit, shadow.shadow_map(index));
            device.set_uniform(shader, &format!("shadowMaps[{}]", index), UniformValue::Int(unit as i32));
            if let Some(matrix) = shadow.light_space_matrix(index) {
                device.set_uniform(shader, &format!("lightSpaceMatrices[{}]", index), matrix.into());
            }
        }

        if count > 0 {
            device.set_uniform(shader, "shadowMap", UniformValue::Int(SHADOW_MAP_UNIT_BASE as i32));
            if let Some(matrix) = shadow.light_space_matrix(0) {
                device.set_uniform(shader, "lightSpaceMatrix", matrix.into());
            }
        }
        device.set_uniform(shader, "numShadowMaps", UniformValue::Int(count as i32));
    }
}

#[cfg(test)]
#[path = "opaque_pass_tests.rs"]
mod tests;
