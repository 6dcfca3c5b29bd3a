//! Graphics device seam
//!
//! The compositor never talks to a graphics API directly. Everything goes
//! through the object-safe `GraphicsDevice` trait, shared between pipeline
//! stages as a `SharedDevice`.

mod graphics_device;
mod texture;
mod framebuffer;
mod buffer;

#[cfg(any(test, feature = "mock-device"))]
pub mod mock_device;

pub use graphics_device::{
    GraphicsDevice, SharedDevice, lock_device, UniformValue,
    TextureHandle, RenderbufferHandle, FramebufferHandle, BufferHandle,
    VertexArrayHandle, ShaderHandle, MeshHandle,
};
pub use texture::{TextureFormat, TextureDesc, RenderbufferDesc, Filter, WrapMode};
pub use framebuffer::{
    AttachmentPoint, FramebufferTarget, FramebufferStatus, ClearFlags, CullFace, Viewport, Rect2D,
};
pub use buffer::{BufferUsage, BufferDesc, VertexLayout};
