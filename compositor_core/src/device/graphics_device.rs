/// GraphicsDevice trait - the immediate-mode GPU seam of the compositor

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::device::{
    AttachmentPoint, BufferDesc, ClearFlags, CullFace, Filter, FramebufferStatus,
    FramebufferTarget, Rect2D, RenderbufferDesc, TextureDesc, VertexLayout, Viewport,
};
use crate::error::Result;

// ============================================================================
// Handles
// ============================================================================

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wrap a raw native handle (`None` for 0)
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            /// Raw native handle
            pub fn raw(&self) -> u32 {
                self.0.get()
            }
        }
    };
}

device_handle!(
    /// Texture object
    TextureHandle
);
device_handle!(
    /// Renderbuffer object
    RenderbufferHandle
);
device_handle!(
    /// Framebuffer object (the default framebuffer has no handle)
    FramebufferHandle
);
device_handle!(
    /// Buffer object
    BufferHandle
);
device_handle!(
    /// Vertex array object
    VertexArrayHandle
);
device_handle!(
    /// Linked shader program, supplied by the shader subsystem
    ShaderHandle
);
device_handle!(
    /// Uploaded mesh, supplied by the asset subsystem
    MeshHandle
);

// ============================================================================
// Uniform values
// ============================================================================

/// Value for the key/value uniform interface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Bool(bool),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<u32> for UniformValue {
    fn from(value: u32) -> Self {
        UniformValue::UInt(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Bool(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Immediate-mode graphics device
///
/// Implemented by the platform backend (an OpenGL context in the editor) and
/// by `MockGraphicsDevice` in tests. All calls are issued from the render
/// thread in program order; binding state is global to the device.
pub trait GraphicsDevice: Send + Sync {
    // ===== RESOURCES =====

    /// Create a 2D texture with undefined contents
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Create a renderbuffer with undefined contents
    fn create_renderbuffer(&mut self, desc: &RenderbufferDesc) -> Result<RenderbufferHandle>;

    fn destroy_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle>;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Upload `data` at `offset` bytes into `buffer`
    fn update_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<()>;

    /// Create a vertex array over interleaved float vertices
    fn create_vertex_array(&mut self, vertices: &[f32], layout: &VertexLayout) -> Result<VertexArrayHandle>;

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    // ===== FRAMEBUFFERS =====

    fn attach_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        texture: TextureHandle,
    ) -> Result<()>;

    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        renderbuffer: RenderbufferHandle,
    ) -> Result<()>;

    /// Declare color attachments `0..count` as draw outputs
    ///
    /// `count == 0` declares a depth-only framebuffer.
    fn set_draw_buffers(&mut self, framebuffer: FramebufferHandle, count: u32) -> Result<()>;

    fn check_framebuffer_status(&mut self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    /// Bind a framebuffer (`None` selects the default framebuffer)
    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>);

    /// Currently bound framebuffer (`Both` reports the draw binding)
    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferHandle>;

    /// Select the color attachment the bound read framebuffer reads from
    fn set_read_buffer(&mut self, attachment: u32);

    /// Restrict drawing on the bound draw framebuffer to one color
    /// attachment, or restore its declared outputs with `None`
    fn set_draw_buffer(&mut self, attachment: Option<u32>);

    /// Copy from the bound read framebuffer to the bound draw framebuffer
    fn blit_framebuffer(&mut self, src: Rect2D, dst: Rect2D, mask: ClearFlags, filter: Filter);

    // ===== RENDER STATE =====

    fn set_viewport(&mut self, viewport: Viewport);

    fn viewport(&self) -> Viewport;

    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear the selected buffers of the bound draw framebuffer
    fn clear(&mut self, flags: ClearFlags);

    fn set_cull_face(&mut self, face: CullFace);

    // ===== PROGRAMS =====

    fn use_program(&mut self, shader: ShaderHandle);

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue);

    /// Bind a texture to a sampler unit (`None` unbinds)
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);

    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferHandle);

    // ===== DRAWING =====

    fn draw_arrays(&mut self, vertex_array: VertexArrayHandle, first: u32, count: u32);

    fn draw_mesh(&mut self, mesh: MeshHandle);
}

/// Device shared between the pipeline stages and the render targets
pub type SharedDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Lock the shared device, mapping a poisoned lock to `Error::BackendError`
pub fn lock_device(device: &SharedDevice) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| crate::engine_err!("compositor::GraphicsDevice", "Graphics device lock poisoned"))
}
