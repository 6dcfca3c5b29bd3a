/// Off-screen render target
///
/// A `RenderTarget` owns a framebuffer object and its attachments. It is
/// either fully valid (framebuffer present, completeness check passed, every
/// requested attachment allocated) or fully torn down; creation and resize
/// never leave a partially built target behind.
///
/// All operations take the device explicitly. The target also keeps a clone
/// of the shared device so that dropping it releases its GPU handles.

use std::sync::TryLockError;
use crate::device::{
    AttachmentPoint, ClearFlags, Filter, FramebufferHandle, FramebufferStatus,
    FramebufferTarget, GraphicsDevice, Rect2D, RenderbufferDesc, RenderbufferHandle, SharedDevice,
    TextureDesc, TextureFormat, TextureHandle, Viewport,
};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

/// Maximum number of color attachments a target may declare
pub const MAX_COLOR_ATTACHMENTS: u32 = 8;

/// Which attachments a render target allocates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// Color textures only
    ColorOnly,
    /// Color textures + depth renderbuffer (texture with `sampleable_depth`)
    ColorDepth,
    /// Color textures + packed depth-stencil renderbuffer
    ColorDepthStencil,
    /// A single sampleable depth texture, no color output
    DepthStencilTextureOnly,
}

impl AttachmentKind {
    pub fn has_color(&self) -> bool {
        !matches!(self, AttachmentKind::DepthStencilTextureOnly)
    }
}

/// Render target creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetSpec {
    pub width: u32,
    pub height: u32,
    pub attachment_kind: AttachmentKind,
    /// Number of color textures (MRT), 1..=8
    pub color_attachment_count: u32,
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
    /// Store depth in a texture instead of a renderbuffer so later passes
    /// can sample it (ColorDepth / ColorDepthStencil)
    pub sampleable_depth: bool,
}

impl Default for RenderTargetSpec {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            attachment_kind: AttachmentKind::ColorDepth,
            color_attachment_count: 1,
            color_format: TextureFormat::R8G8B8A8_UNORM,
            depth_format: TextureFormat::D24_UNORM,
            sampleable_depth: false,
        }
    }
}

impl RenderTargetSpec {
    /// Both dimensions are positive
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn color_only(width: u32, height: u32, color_format: TextureFormat) -> Self {
        Self {
            width,
            height,
            attachment_kind: AttachmentKind::ColorOnly,
            color_format,
            ..Default::default()
        }
    }

    pub fn color_depth(width: u32, height: u32) -> Self {
        Self { width, height, ..Default::default() }
    }

    /// Depth-only target whose depth buffer can be sampled later
    pub fn depth_texture(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            attachment_kind: AttachmentKind::DepthStencilTextureOnly,
            ..Default::default()
        }
    }

    pub fn with_color_attachments(mut self, count: u32) -> Self {
        self.color_attachment_count = count;
        self
    }

    pub fn with_sampleable_depth(mut self) -> Self {
        self.sampleable_depth = true;
        self
    }

    pub fn with_formats(mut self, color_format: TextureFormat, depth_format: TextureFormat) -> Self {
        self.color_format = color_format;
        self.depth_format = depth_format;
        self
    }
}

/// Off-screen render target (framebuffer + attachments)
pub struct RenderTarget {
    device: SharedDevice,
    name: String,
    spec: RenderTargetSpec,
    framebuffer: Option<FramebufferHandle>,
    color_attachments: Vec<TextureHandle>,
    depth_texture: Option<TextureHandle>,
    depth_renderbuffer: Option<RenderbufferHandle>,
    valid: bool,
}

impl RenderTarget {
    /// Create a render target
    ///
    /// A spec with a zero dimension produces an invalid target without
    /// touching the device; the first positive `resize` creates it.
    /// Creation failures are logged and leave the target invalid.
    ///
    /// When the device is already locked (for instance from inside
    /// `Effect::apply`) creation is deferred as for a 0x0 spec; use
    /// [`RenderTarget::with_device`] there instead.
    pub fn new(device: &SharedDevice, name: impl Into<String>, spec: RenderTargetSpec) -> Self {
        let mut target = Self::unallocated(device, name.into(), spec);
        if !target.spec.has_area() {
            target.log_deferred();
            return target;
        }

        match device.try_lock() {
            Ok(mut guard) => target.create(&mut *guard),
            Err(TryLockError::Poisoned(poisoned)) => {
                let mut guard = poisoned.into_inner();
                target.create(&mut *guard);
            }
            Err(TryLockError::WouldBlock) => {
                engine_warn!(
                    "compositor::RenderTarget",
                    "Device busy while creating '{}', deferred until first resize",
                    target.name
                );
                target.spec.width = 0;
                target.spec.height = 0;
            }
        }
        target
    }

    /// Create a render target on a device the caller has already locked
    ///
    /// `shared` must be the device `device` was locked from; the target keeps
    /// it for `Drop`.
    pub fn with_device(
        shared: &SharedDevice,
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        spec: RenderTargetSpec,
    ) -> Self {
        let mut target = Self::unallocated(shared, name.into(), spec);
        if target.spec.has_area() {
            target.create(device);
        } else {
            target.log_deferred();
        }
        target
    }

    fn unallocated(device: &SharedDevice, name: String, spec: RenderTargetSpec) -> Self {
        let mut spec = spec;
        if spec.attachment_kind.has_color()
            && !(1..=MAX_COLOR_ATTACHMENTS).contains(&spec.color_attachment_count)
        {
            let clamped = spec.color_attachment_count.clamp(1, MAX_COLOR_ATTACHMENTS);
            engine_warn!(
                "compositor::RenderTarget",
                "'{}' requested {} color attachments, using {}",
                name,
                spec.color_attachment_count,
                clamped
            );
            spec.color_attachment_count = clamped;
        }

        Self {
            device: device.clone(),
            name,
            spec,
            framebuffer: None,
            color_attachments: Vec::new(),
            depth_texture: None,
            depth_renderbuffer: None,
            valid: false,
        }
    }

    fn log_deferred(&self) {
        engine_trace!(
            "compositor::RenderTarget",
            "'{}' deferred until first resize ({}x{})",
            self.name,
            self.spec.width,
            self.spec.height
        );
    }

    /// Resize the target, recreating every attachment
    ///
    /// No-op for a zero dimension or unchanged size. Attachment handles
    /// obtained before a resize are dangling afterwards.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        if width == 0 || height == 0 || (self.spec.width == width && self.spec.height == height) {
            return;
        }

        engine_debug!(
            "compositor::RenderTarget",
            "Resizing '{}' {}x{} -> {}x{}",
            self.name,
            self.spec.width,
            self.spec.height,
            width,
            height
        );

        self.spec.width = width;
        self.spec.height = height;
        self.destroy(device);
        self.create(device);
    }

    /// Tear down and rebuild every attachment at the current size
    ///
    /// Retries a creation that failed earlier. No-op for a 0x0 target.
    pub fn recreate(&mut self, device: &mut dyn GraphicsDevice) {
        if !self.spec.has_area() {
            return;
        }
        self.destroy(device);
        self.create(device);
    }

    /// Release every GPU handle now (the target becomes invalid)
    ///
    /// Use this instead of dropping when the caller already holds the device lock.
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        self.destroy(device);
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) {
        let previous_read = device.bound_framebuffer(FramebufferTarget::Read);
        let previous_draw = device.bound_framebuffer(FramebufferTarget::Draw);

        match self.allocate(device) {
            Ok(()) => {
                self.valid = true;
                engine_debug!(
                    "compositor::RenderTarget",
                    "Created '{}' ({}x{}, {:?}, {} color)",
                    self.name,
                    self.spec.width,
                    self.spec.height,
                    self.spec.attachment_kind,
                    self.color_attachments.len()
                );
            }
            Err(err) => {
                engine_error!("compositor::RenderTarget", "{}", err);
                self.destroy(device);
            }
        }

        if previous_read == previous_draw {
            device.bind_framebuffer(FramebufferTarget::Both, previous_draw);
        } else {
            device.bind_framebuffer(FramebufferTarget::Read, previous_read);
            device.bind_framebuffer(FramebufferTarget::Draw, previous_draw);
        }
    }

    fn allocate(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let (width, height) = (self.spec.width, self.spec.height);

        let framebuffer = device.create_framebuffer()?;
        self.framebuffer = Some(framebuffer);
        device.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));

        match self.spec.attachment_kind {
            AttachmentKind::ColorOnly => {
                self.attach_colors(device, framebuffer)?;
            }
            AttachmentKind::ColorDepth => {
                self.attach_colors(device, framebuffer)?;
                let point = if self.spec.depth_format.has_stencil() {
                    AttachmentPoint::DepthStencil
                } else {
                    AttachmentPoint::Depth
                };
                self.attach_depth(device, framebuffer, self.spec.depth_format, point)?;
            }
            AttachmentKind::ColorDepthStencil => {
                self.attach_colors(device, framebuffer)?;
                self.attach_depth(
                    device,
                    framebuffer,
                    TextureFormat::D24_UNORM_S8_UINT,
                    AttachmentPoint::DepthStencil,
                )?;
            }
            AttachmentKind::DepthStencilTextureOnly => {
                let desc = TextureDesc::depth_attachment(width, height, self.spec.depth_format);
                let texture = device.create_texture(&desc)?;
                self.depth_texture = Some(texture);
                let point = if self.spec.depth_format.has_stencil() {
                    AttachmentPoint::DepthStencil
                } else {
                    AttachmentPoint::Depth
                };
                device.attach_texture(framebuffer, point, texture)?;
                device.set_draw_buffers(framebuffer, 0)?;
            }
        }

        match device.check_framebuffer_status(framebuffer) {
            FramebufferStatus::Complete => Ok(()),
            FramebufferStatus::Incomplete(status) => Err(Error::IncompleteTarget {
                name: self.name.clone(),
                status,
            }),
        }
    }

    fn attach_colors(&mut self, device: &mut dyn GraphicsDevice, framebuffer: FramebufferHandle) -> Result<()> {
        let desc = TextureDesc::color_attachment(self.spec.width, self.spec.height, self.spec.color_format);
        for index in 0..self.spec.color_attachment_count {
            let texture = device.create_texture(&desc)?;
            self.color_attachments.push(texture);
            device.attach_texture(framebuffer, AttachmentPoint::Color(index), texture)?;
        }
        device.set_draw_buffers(framebuffer, self.spec.color_attachment_count)
    }

    fn attach_depth(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferHandle,
        format: TextureFormat,
        point: AttachmentPoint,
    ) -> Result<()> {
        if self.spec.sampleable_depth {
            let desc = TextureDesc::depth_attachment(self.spec.width, self.spec.height, format);
            let texture = device.create_texture(&desc)?;
            self.depth_texture = Some(texture);
            return device.attach_texture(framebuffer, point, texture);
        }

        let renderbuffer = device.create_renderbuffer(&RenderbufferDesc {
            width: self.spec.width,
            height: self.spec.height,
            format,
        })?;
        self.depth_renderbuffer = Some(renderbuffer);
        device.attach_renderbuffer(framebuffer, point, renderbuffer)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for texture in self.color_attachments.drain(..) {
            device.destroy_texture(texture);
        }
        if let Some(texture) = self.depth_texture.take() {
            device.destroy_texture(texture);
        }
        if let Some(renderbuffer) = self.depth_renderbuffer.take() {
            device.destroy_renderbuffer(renderbuffer);
        }
        if let Some(framebuffer) = self.framebuffer.take() {
            device.destroy_framebuffer(framebuffer);
        }
        self.valid = false;
    }

    fn has_resources(&self) -> bool {
        self.framebuffer.is_some()
            || !self.color_attachments.is_empty()
            || self.depth_texture.is_some()
            || self.depth_renderbuffer.is_some()
    }

    // ===== BINDING =====

    fn bindable(&self) -> Option<FramebufferHandle> {
        match (self.valid, self.framebuffer) {
            (true, Some(framebuffer)) => Some(framebuffer),
            _ => {
                engine_error!(
                    "compositor::RenderTarget",
                    "Attempting to bind invalid render target '{}' (handle: {}, valid: {})",
                    self.name,
                    self.framebuffer.map_or(0, |fb| fb.raw()),
                    self.valid
                );
                None
            }
        }
    }

    /// Bind for reading and drawing; logged no-op when invalid
    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> bool {
        let Some(framebuffer) = self.bindable() else {
            return false;
        };
        device.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));
        true
    }

    pub fn bind_read(&self, device: &mut dyn GraphicsDevice) -> bool {
        let Some(framebuffer) = self.bindable() else {
            return false;
        };
        device.bind_framebuffer(FramebufferTarget::Read, Some(framebuffer));
        true
    }

    pub fn bind_draw(&self, device: &mut dyn GraphicsDevice) -> bool {
        let Some(framebuffer) = self.bindable() else {
            return false;
        };
        device.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
        true
    }

    /// Restore the default framebuffer
    pub fn unbind(&self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Both, None);
    }

    /// Bind, clear color and depth, then set the viewport to `width` x `height`
    pub fn bind_and_clear(&self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> bool {
        if !self.bind(device) {
            return false;
        }
        device.clear(ClearFlags::COLOR_DEPTH);
        device.set_viewport(Viewport::sized(width, height));
        true
    }

    /// Clear whatever is bound and set the viewport
    pub fn clear_bound(device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        device.clear(ClearFlags::COLOR_DEPTH);
        device.set_viewport(Viewport::sized(width, height));
        engine_trace!(
            "compositor::RenderTarget",
            "Cleared bound target to w: {:4}, h: {:4}",
            width,
            height
        );
    }

    /// Copy color attachment `src_attachment` into `dst`'s principal color
    /// attachment, nearest-neighbor, no format conversion
    ///
    /// Leaves `self` bound for reading and `dst` bound for drawing.
    pub fn blit_to(
        &self,
        device: &mut dyn GraphicsDevice,
        dst: &RenderTarget,
        src_attachment: u32,
        width: u32,
        height: u32,
    ) -> bool {
        if src_attachment as usize >= self.color_attachments.len() {
            engine_error!(
                "compositor::RenderTarget",
                "Cannot blit attachment {} of '{}' ({} color attachments)",
                src_attachment,
                self.name,
                self.color_attachments.len()
            );
            return false;
        }
        if !dst.spec.attachment_kind.has_color() {
            engine_error!("compositor::RenderTarget", "Cannot blit color into depth-only target '{}'", dst.name);
            return false;
        }
        if !self.bind_read(device) || !dst.bind_draw(device) {
            return false;
        }

        let rect = Rect2D::sized(width, height);
        device.set_read_buffer(src_attachment);
        device.set_draw_buffer(Some(0));
        device.blit_framebuffer(rect, rect, ClearFlags::COLOR, Filter::Nearest);
        device.set_read_buffer(0);
        device.set_draw_buffer(None);
        true
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &RenderTargetSpec {
        &self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn handle(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    /// Color attachment by index (0 is the principal output)
    pub fn color_attachment(&self, index: usize) -> Option<TextureHandle> {
        self.color_attachments.get(index).copied()
    }

    pub fn color_attachments(&self) -> &[TextureHandle] {
        &self.color_attachments
    }

    /// Sampleable depth texture (`DepthStencilTextureOnly` targets and
    /// targets created with `sampleable_depth`)
    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.depth_texture
    }

    /// Depth renderbuffer (`ColorDepth` / `ColorDepthStencil` targets)
    pub fn depth_renderbuffer(&self) -> Option<RenderbufferHandle> {
        self.depth_renderbuffer
    }
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("framebuffer", &self.framebuffer)
            .field("color_attachments", &self.color_attachments)
            .field("depth_texture", &self.depth_texture)
            .field("depth_renderbuffer", &self.depth_renderbuffer)
            .field("valid", &self.valid)
            .finish()
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        if !self.has_resources() {
            return;
        }
        let device = self.device.clone();
        match device.try_lock() {
            Ok(mut guard) => self.destroy(&mut *guard),
            Err(TryLockError::Poisoned(poisoned)) => {
                let mut guard = poisoned.into_inner();
                self.destroy(&mut *guard);
            }
            Err(TryLockError::WouldBlock) => {
                engine_error!(
                    "compositor::RenderTarget",
                    "Device locked while dropping '{}'; call release() first. GPU handles leaked",
                    self.name
                );
            }
        };
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
