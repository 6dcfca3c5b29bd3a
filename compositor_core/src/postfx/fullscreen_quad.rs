/// Full-screen quad shared by every post-processing pass

use crate::device::{GraphicsDevice, VertexArrayHandle, VertexLayout};
use crate::error::Result;

/// Two triangles covering clip space: position.xy, uv
const QUAD_VERTICES: [f32; 24] = [
    -1.0,  1.0,  0.0, 1.0,
    -1.0, -1.0,  0.0, 0.0,
     1.0, -1.0,  1.0, 0.0,
    -1.0,  1.0,  0.0, 1.0,
     1.0, -1.0,  1.0, 0.0,
     1.0,  1.0,  1.0, 1.0,
];

const QUAD_VERTEX_COUNT: u32 = 6;

/// GPU vertex array for the full-screen quad
///
/// Created once when the effect stack is built and released explicitly
/// with `destroy`.
#[derive(Debug)]
pub struct FullscreenQuad {
    vertex_array: VertexArrayHandle,
}

impl FullscreenQuad {
    pub fn new(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let vertex_array = device.create_vertex_array(&QUAD_VERTICES, &VertexLayout::new(&[2, 2]))?;
        crate::engine_debug!("compositor::FullscreenQuad", "Created quad vertex array {}", vertex_array.raw());
        Ok(Self { vertex_array })
    }

    /// Issue one draw of the quad into the bound framebuffer
    pub fn draw(&self, device: &mut dyn GraphicsDevice) {
        device.draw_arrays(self.vertex_array, 0, QUAD_VERTEX_COUNT);
    }

    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_vertex_array(self.vertex_array);
    }
}
