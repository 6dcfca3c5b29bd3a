/// Compositor configuration

use crate::device::TextureFormat;

/// Shadow map settings
///
/// The defaults reproduce the fixed values the shadow pass has always used:
/// a 1024x1024 depth map, a 1..25 depth range, a ±10 orthographic box for
/// directional lights placed 10 units behind the origin, and a 90° frustum
/// for point and spot lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of each shadow map
    pub resolution: u32,
    /// Near plane of the light frustum
    pub near: f32,
    /// Far plane of the light frustum
    pub far: f32,
    /// Half extent of the orthographic box used for directional lights
    pub ortho_extent: f32,
    /// Distance the directional light eye is pulled back along its direction
    pub directional_distance: f32,
    /// Vertical field of view for point and spot lights, in degrees
    pub fov_degrees: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            near: 1.0,
            far: 25.0,
            ortho_extent: 10.0,
            directional_distance: 10.0,
            fov_degrees: 90.0,
        }
    }
}

/// Compositor configuration
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Shadow map settings
    pub shadow: ShadowSettings,
    /// Format of the effect stack scratch targets
    pub scratch_color_format: TextureFormat,
    /// Clear color used by the device when a target is cleared
    pub clear_color: [f32; 4],
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            shadow: ShadowSettings::default(),
            scratch_color_format: TextureFormat::R16G16B16A16_SFLOAT,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
