/// Per-frame light data: snapshots, the packed uniform block and the
/// light-space transform used to render and sample shadow maps

use std::fmt;
use bytemuck::{Pod, Zeroable};
use glam::{IVec4, Mat4, Vec3, Vec4};
use crate::config::ShadowSettings;
use crate::device::{BufferDesc, BufferHandle, BufferUsage, GraphicsDevice};
use crate::error::Result;
use crate::engine_trace;

/// Maximum number of lights packed into the uniform block (and shadowed)
pub const MAX_LIGHTS: usize = 4;

/// Uniform block binding point of the light buffer
pub const LIGHT_UBO_BINDING: u32 = 0;

// ===== LIGHT TYPE =====

/// Light kind; the discriminant is the value shaders receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    #[default]
    Point = 0,
    Directional = 1,
    Spot = 2,
}

impl LightType {
    pub const ALL: [LightType; 3] = [LightType::Point, LightType::Directional, LightType::Spot];

    /// Next type, wrapping around
    pub fn next(self) -> Self {
        match self {
            LightType::Point => LightType::Directional,
            LightType::Directional => LightType::Spot,
            LightType::Spot => LightType::Point,
        }
    }

    /// Previous type, wrapping around
    pub fn prev(self) -> Self {
        match self {
            LightType::Point => LightType::Spot,
            LightType::Directional => LightType::Point,
            LightType::Spot => LightType::Directional,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightType::Point => "Point",
            LightType::Directional => "Directional",
            LightType::Spot => "Spot",
        };
        f.write_str(name)
    }
}

// ===== SNAPSHOT =====

/// One active light as seen by the renderer this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSnapshot {
    /// World position
    pub position: Vec3,
    /// World forward direction
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub light_type: LightType,
}

impl Default for LightSnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            color: Vec3::ONE,
            intensity: 1.0,
            light_type: LightType::Point,
        }
    }
}

impl LightSnapshot {
    pub fn point(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn directional(direction: Vec3) -> Self {
        Self { direction, light_type: LightType::Directional, ..Default::default() }
    }

    pub fn spot(position: Vec3, direction: Vec3) -> Self {
        Self { position, direction, light_type: LightType::Spot, ..Default::default() }
    }
}

// ===== UNIFORM BLOCK =====

/// std140 light uniform block (272 bytes)
///
/// Slots past `num_lights` are zeroed; shaders clamp their loops to it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBuffer {
    /// xyz = position, w = 1
    pub positions: [Vec4; MAX_LIGHTS],
    /// xyz = forward direction, w = 0
    pub directions: [Vec4; MAX_LIGHTS],
    /// rgb = color, a = intensity
    pub colors: [Vec4; MAX_LIGHTS],
    /// x = `LightType`
    pub light_types: [IVec4; MAX_LIGHTS],
    pub num_lights: i32,
    pub _pad: [i32; 3],
}

impl LightBuffer {
    pub const SIZE: usize = std::mem::size_of::<LightBuffer>();

    /// Pack the first `MAX_LIGHTS` lights
    pub fn pack(lights: &[LightSnapshot]) -> Self {
        let mut buffer = Self::zeroed();
        let count = lights.len().min(MAX_LIGHTS);
        for (i, light) in lights.iter().take(count).enumerate() {
            buffer.positions[i] = light.position.extend(1.0);
            buffer.directions[i] = light.direction.extend(0.0);
            buffer.colors[i] = light.color.extend(light.intensity);
            buffer.light_types[i] = IVec4::new(light.light_type.as_i32(), 0, 0, 0);
        }
        buffer.num_lights = count as i32;
        buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// GPU uniform buffer holding the `LightBuffer`, bound at `LIGHT_UBO_BINDING`
#[derive(Debug)]
pub struct LightUniformBuffer {
    buffer: BufferHandle,
}

impl LightUniformBuffer {
    pub fn new(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let buffer = device.create_buffer(&BufferDesc {
            size: LightBuffer::SIZE as u64,
            usage: BufferUsage::Uniform,
        })?;
        device.bind_uniform_buffer(LIGHT_UBO_BINDING, buffer);
        Ok(Self { buffer })
    }

    /// Upload this frame's light data
    pub fn upload(&self, device: &mut dyn GraphicsDevice, data: &LightBuffer) -> Result<()> {
        device.update_buffer(self.buffer, 0, data.as_bytes())?;
        device.bind_uniform_buffer(LIGHT_UBO_BINDING, self.buffer);
        engine_trace!("compositor::LightUniformBuffer", "Uploaded {} lights", data.num_lights);
        Ok(())
    }

    pub fn handle(&self) -> BufferHandle {
        self.buffer
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_buffer(self.buffer);
    }
}

// ===== LIGHT-SPACE TRANSFORM =====

/// View-projection used to render and sample the shadow map of `light`
///
/// Directional lights use an orthographic box centered on the origin, seen
/// from `directional_distance` units behind it along the light direction.
/// Point and spot lights use a square perspective frustum at the light
/// position. Both look along the light direction with +Y up (+Z when the
/// light points straight up or down).
pub fn light_space_matrix(light: &LightSnapshot, settings: &ShadowSettings) -> Mat4 {
    let direction = light.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let up = if direction.dot(Vec3::Y).abs() > 0.999 { Vec3::Z } else { Vec3::Y };

    let (projection, view) = match light.light_type {
        LightType::Directional => {
            let extent = settings.ortho_extent;
            let eye = -direction * settings.directional_distance;
            (
                Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, settings.near, settings.far),
                Mat4::look_at_rh(eye, eye + direction, up),
            )
        }
        LightType::Point | LightType::Spot => (
            Mat4::perspective_rh_gl(settings.fov_degrees.to_radians(), 1.0, settings.near, settings.far),
            Mat4::look_at_rh(light.position, light.position + direction, up),
        ),
    };

    projection * view
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
