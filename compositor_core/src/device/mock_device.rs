/// Mock graphics device for tests (no GPU required)
///
/// Handles come from a single monotonically increasing counter and are never
/// reused, so tests can tell a recreated resource from the one it replaced.
/// Attachment contents are modeled as 64-bit pixel signatures:
/// - a clear writes 0
/// - a draw writes a hash of the program, its uniforms and the signatures of
///   the bound textures
/// - a nearest same-size blit copies the source signature unchanged; any
///   other blit writes a hash derived from it

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHasher};

use crate::device::{
    AttachmentPoint, BufferDesc, BufferHandle, ClearFlags, CullFace, Filter, FramebufferHandle,
    FramebufferStatus, FramebufferTarget, GraphicsDevice, MeshHandle, Rect2D, RenderbufferDesc,
    RenderbufferHandle, ShaderHandle, SharedDevice, TextureDesc, TextureHandle, UniformValue,
    VertexArrayHandle, VertexLayout, Viewport,
};
use crate::error::{Error, Result};
use crate::engine_bail;

/// GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT
pub const STATUS_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
/// GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
pub const STATUS_MISSING_ATTACHMENT: u32 = 0x8CD7;
/// GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS
pub const STATUS_INCOMPLETE_DIMENSIONS: u32 = 0x8CD9;
/// GL_FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER
pub const STATUS_INCOMPLETE_DRAW_BUFFER: u32 = 0x8CDB;

// ============================================================================
// Recorded commands
// ============================================================================

/// Every call made on the mock, in order
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateTexture { texture: TextureHandle, desc: TextureDesc },
    DestroyTexture(TextureHandle),
    CreateRenderbuffer { renderbuffer: RenderbufferHandle, desc: RenderbufferDesc },
    DestroyRenderbuffer(RenderbufferHandle),
    CreateFramebuffer(FramebufferHandle),
    DestroyFramebuffer(FramebufferHandle),
    AttachTexture { framebuffer: FramebufferHandle, point: AttachmentPoint, texture: TextureHandle },
    AttachRenderbuffer { framebuffer: FramebufferHandle, point: AttachmentPoint, renderbuffer: RenderbufferHandle },
    SetDrawBuffers { framebuffer: FramebufferHandle, count: u32 },
    CheckStatus { framebuffer: FramebufferHandle, status: FramebufferStatus },
    BindFramebuffer { target: FramebufferTarget, framebuffer: Option<FramebufferHandle> },
    SetReadBuffer(u32),
    SetDrawBuffer(Option<u32>),
    Blit {
        read: Option<FramebufferHandle>,
        draw: Option<FramebufferHandle>,
        src: Rect2D,
        dst: Rect2D,
        mask: ClearFlags,
        filter: Filter,
    },
    SetViewport(Viewport),
    SetClearColor([f32; 4]),
    Clear { framebuffer: Option<FramebufferHandle>, flags: ClearFlags },
    SetCullFace(CullFace),
    UseProgram(ShaderHandle),
    SetUniform { shader: ShaderHandle, name: String, value: UniformValue },
    BindTexture { unit: u32, texture: Option<TextureHandle> },
    CreateBuffer { buffer: BufferHandle, desc: BufferDesc },
    DestroyBuffer(BufferHandle),
    UpdateBuffer { buffer: BufferHandle, offset: u64, len: usize },
    BindUniformBuffer { binding: u32, buffer: BufferHandle },
    CreateVertexArray { vertex_array: VertexArrayHandle, vertex_count: u32 },
    DestroyVertexArray(VertexArrayHandle),
    DrawArrays {
        vertex_array: VertexArrayHandle,
        first: u32,
        count: u32,
        framebuffer: Option<FramebufferHandle>,
        program: Option<ShaderHandle>,
    },
    DrawMesh {
        mesh: MeshHandle,
        framebuffer: Option<FramebufferHandle>,
        program: Option<ShaderHandle>,
    },
}

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockAttachment {
    Texture(TextureHandle),
    Renderbuffer(RenderbufferHandle),
}

#[derive(Debug)]
struct MockTexture {
    desc: TextureDesc,
    signature: u64,
}

#[derive(Debug)]
struct MockRenderbuffer {
    desc: RenderbufferDesc,
    signature: u64,
}

#[derive(Debug, Default)]
struct MockFramebuffer {
    colors: BTreeMap<u32, MockAttachment>,
    depth: Option<MockAttachment>,
    draw_buffer_count: u32,
    read_buffer: u32,
    draw_buffer_override: Option<u32>,
}

#[derive(Debug)]
struct MockBuffer {
    desc: BufferDesc,
    data: Vec<u8>,
}

// ============================================================================
// MockGraphicsDevice
// ============================================================================

/// In-memory `GraphicsDevice`
#[derive(Debug)]
pub struct MockGraphicsDevice {
    next_handle: u32,
    textures: FxHashMap<TextureHandle, MockTexture>,
    renderbuffers: FxHashMap<RenderbufferHandle, MockRenderbuffer>,
    framebuffers: FxHashMap<FramebufferHandle, MockFramebuffer>,
    buffers: FxHashMap<BufferHandle, MockBuffer>,
    vertex_arrays: FxHashMap<VertexArrayHandle, u32>,
    read_binding: Option<FramebufferHandle>,
    draw_binding: Option<FramebufferHandle>,
    default_signature: u64,
    viewport: Viewport,
    clear_color: [f32; 4],
    cull_face: CullFace,
    program: Option<ShaderHandle>,
    uniforms: FxHashMap<(ShaderHandle, String), UniformValue>,
    texture_units: BTreeMap<u32, TextureHandle>,
    uniform_bindings: BTreeMap<u32, BufferHandle>,
    forced_incomplete: Option<u32>,
    fail_texture_creation: bool,
    commands: Vec<DeviceCommand>,
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            textures: FxHashMap::default(),
            renderbuffers: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            buffers: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            read_binding: None,
            draw_binding: None,
            default_signature: 0,
            viewport: Viewport::sized(0, 0),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            cull_face: CullFace::Back,
            program: None,
            uniforms: FxHashMap::default(),
            texture_units: BTreeMap::new(),
            uniform_bindings: BTreeMap::new(),
            forced_incomplete: None,
            fail_texture_creation: false,
            commands: Vec::new(),
        }
    }

    /// New mock wrapped for sharing, plus the same device as a `SharedDevice`
    pub fn new_shared() -> (Arc<Mutex<MockGraphicsDevice>>, SharedDevice) {
        let mock = Arc::new(Mutex::new(Self::new()));
        let shared: SharedDevice = mock.clone();
        (mock, shared)
    }

    fn allocate(&mut self) -> u32 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    // ===== FAILURE INJECTION =====

    /// Make every completeness check report `status` (or stop with `None`)
    pub fn force_incomplete(&mut self, status: Option<u32>) {
        self.forced_incomplete = status;
    }

    /// Make texture creation fail with `Error::OutOfMemory`
    pub fn fail_texture_creation(&mut self, fail: bool) {
        self.fail_texture_creation = fail;
    }

    // ===== INSPECTION =====

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of draw calls recorded since the last `clear_commands`
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DrawArrays { .. } | DeviceCommand::DrawMesh { .. }))
            .count()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_renderbuffers(&self) -> usize {
        self.renderbuffers.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn texture_exists(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture)
    }

    pub fn texture_desc(&self, texture: TextureHandle) -> Option<TextureDesc> {
        self.textures.get(&texture).map(|t| t.desc)
    }

    pub fn renderbuffer_desc(&self, renderbuffer: RenderbufferHandle) -> Option<RenderbufferDesc> {
        self.renderbuffers.get(&renderbuffer).map(|r| r.desc)
    }

    pub fn texture_signature(&self, texture: TextureHandle) -> Option<u64> {
        self.textures.get(&texture).map(|t| t.signature)
    }

    /// Seed a texture's contents (e.g. to stand in for a rendered scene)
    pub fn set_texture_signature(&mut self, texture: TextureHandle, signature: u64) {
        if let Some(t) = self.textures.get_mut(&texture) {
            t.signature = signature;
        }
    }

    pub fn default_framebuffer_signature(&self) -> u64 {
        self.default_signature
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    pub fn current_program(&self) -> Option<ShaderHandle> {
        self.program
    }

    /// Last value set for `name` on `shader`
    pub fn uniform(&self, shader: ShaderHandle, name: &str) -> Option<UniformValue> {
        self.uniforms.get(&(shader, name.to_string())).copied()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.texture_units.get(&unit).copied()
    }

    pub fn uniform_buffer_binding(&self, binding: u32) -> Option<BufferHandle> {
        self.uniform_bindings.get(&binding).copied()
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.data.as_slice())
    }

    // ===== SIGNATURE MODEL =====

    fn attachment_signature(&self, attachment: MockAttachment) -> u64 {
        match attachment {
            MockAttachment::Texture(t) => self.textures.get(&t).map_or(0, |t| t.signature),
            MockAttachment::Renderbuffer(r) => self.renderbuffers.get(&r).map_or(0, |r| r.signature),
        }
    }

    fn write_attachment(&mut self, attachment: MockAttachment, signature: u64) {
        match attachment {
            MockAttachment::Texture(t) => {
                if let Some(t) = self.textures.get_mut(&t) {
                    t.signature = signature;
                }
            }
            MockAttachment::Renderbuffer(r) => {
                if let Some(r) = self.renderbuffers.get_mut(&r) {
                    r.signature = signature;
                }
            }
        }
    }

    /// Color attachments currently written by the bound draw framebuffer
    fn draw_color_targets(&self, framebuffer: FramebufferHandle) -> Vec<MockAttachment> {
        let Some(fb) = self.framebuffers.get(&framebuffer) else {
            return Vec::new();
        };
        match fb.draw_buffer_override {
            Some(index) => fb.colors.get(&index).copied().into_iter().collect(),
            None => (0..fb.draw_buffer_count)
                .filter_map(|index| fb.colors.get(&index).copied())
                .collect(),
        }
    }

    fn draw_signature(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.program.map(|p| p.raw()).hash(&mut hasher);

        let mut uniforms: Vec<_> = self
            .uniforms
            .iter()
            .filter(|((shader, _), _)| Some(*shader) == self.program)
            .map(|((_, name), value)| (name.clone(), format!("{:?}", value)))
            .collect();
        uniforms.sort();
        uniforms.hash(&mut hasher);

        for (unit, texture) in &self.texture_units {
            unit.hash(&mut hasher);
            self.texture_signature(*texture).unwrap_or(0).hash(&mut hasher);
        }
        hasher.finish().max(1)
    }

    fn record_draw(&mut self) {
        let signature = self.draw_signature();
        match self.draw_binding {
            None => self.default_signature = signature,
            Some(fb) => {
                let colors = self.draw_color_targets(fb);
                if colors.is_empty() {
                    if let Some(depth) = self.framebuffers.get(&fb).and_then(|f| f.depth) {
                        self.write_attachment(depth, signature);
                    }
                } else {
                    for attachment in colors {
                        self.write_attachment(attachment, signature);
                    }
                }
            }
        }
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    // ===== RESOURCES =====

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        if self.fail_texture_creation {
            return Err(Error::OutOfMemory);
        }
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("compositor::MockGraphicsDevice", "Cannot create a {}x{} texture", desc.width, desc.height);
        }
        let texture = TextureHandle::new(self.allocate())
            .ok_or_else(|| Error::BackendError("Handle counter overflow".to_string()))?;
        self.textures.insert(texture, MockTexture { desc: *desc, signature: 0 });
        self.commands.push(DeviceCommand::CreateTexture { texture, desc: *desc });
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.texture_units.retain(|_, t| *t != texture);
        self.commands.push(DeviceCommand::DestroyTexture(texture));
    }

    fn create_renderbuffer(&mut self, desc: &RenderbufferDesc) -> Result<RenderbufferHandle> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("compositor::MockGraphicsDevice", "Cannot create a {}x{} renderbuffer", desc.width, desc.height);
        }
        let renderbuffer = RenderbufferHandle::new(self.allocate())
            .ok_or_else(|| Error::BackendError("Handle counter overflow".to_string()))?;
        self.renderbuffers.insert(renderbuffer, MockRenderbuffer { desc: *desc, signature: 0 });
        self.commands.push(DeviceCommand::CreateRenderbuffer { renderbuffer, desc: *desc });
        Ok(renderbuffer)
    }

    fn destroy_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.renderbuffers.remove(&renderbuffer);
        self.commands.push(DeviceCommand::DestroyRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let framebuffer = FramebufferHandle::new(self.allocate())
            .ok_or_else(|| Error::BackendError("Handle counter overflow".to_string()))?;
        self.framebuffers.insert(
            framebuffer,
            MockFramebuffer { draw_buffer_count: 1, ..Default::default() },
        );
        self.commands.push(DeviceCommand::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffers.remove(&framebuffer);
        // Deleting a bound framebuffer reverts the binding to the default one
        if self.read_binding == Some(framebuffer) {
            self.read_binding = None;
        }
        if self.draw_binding == Some(framebuffer) {
            self.draw_binding = None;
        }
        self.commands.push(DeviceCommand::DestroyFramebuffer(framebuffer));
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle> {
        let buffer = BufferHandle::new(self.allocate())
            .ok_or_else(|| Error::BackendError("Handle counter overflow".to_string()))?;
        self.buffers.insert(buffer, MockBuffer { desc: *desc, data: vec![0; desc.size as usize] });
        self.commands.push(DeviceCommand::CreateBuffer { buffer, desc: *desc });
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.uniform_bindings.retain(|_, b| *b != buffer);
        self.commands.push(DeviceCommand::DestroyBuffer(buffer));
    }

    fn update_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<()> {
        let Some(target) = self.buffers.get_mut(&buffer) else {
            return Err(Error::InvalidResource(format!("Unknown buffer {}", buffer.raw())));
        };
        let start = offset as usize;
        let end = start + data.len();
        if end as u64 > target.desc.size {
            engine_bail!(
                "compositor::MockGraphicsDevice",
                "Buffer update out of bounds: {}..{} > {}",
                start,
                end,
                target.desc.size
            );
        }
        target.data[start..end].copy_from_slice(data);
        self.commands.push(DeviceCommand::UpdateBuffer { buffer, offset, len: data.len() });
        Ok(())
    }

    fn create_vertex_array(&mut self, vertices: &[f32], layout: &VertexLayout) -> Result<VertexArrayHandle> {
        let stride = layout.stride_floats();
        if stride == 0 || vertices.len() % stride as usize != 0 {
            engine_bail!(
                "compositor::MockGraphicsDevice",
                "Vertex data ({} floats) does not match stride {}",
                vertices.len(),
                stride
            );
        }
        let vertex_array = VertexArrayHandle::new(self.allocate())
            .ok_or_else(|| Error::BackendError("Handle counter overflow".to_string()))?;
        let vertex_count = (vertices.len() / stride as usize) as u32;
        self.vertex_arrays.insert(vertex_array, vertex_count);
        self.commands.push(DeviceCommand::CreateVertexArray { vertex_array, vertex_count });
        Ok(vertex_array)
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.vertex_arrays.remove(&vertex_array);
        self.commands.push(DeviceCommand::DestroyVertexArray(vertex_array));
    }

    // ===== FRAMEBUFFERS =====

    fn attach_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        texture: TextureHandle,
    ) -> Result<()> {
        if !self.textures.contains_key(&texture) {
            return Err(Error::InvalidResource(format!("Unknown texture {}", texture.raw())));
        }
        let Some(fb) = self.framebuffers.get_mut(&framebuffer) else {
            return Err(Error::InvalidResource(format!("Unknown framebuffer {}", framebuffer.raw())));
        };
        match point {
            AttachmentPoint::Color(index) => {
                fb.colors.insert(index, MockAttachment::Texture(texture));
            }
            AttachmentPoint::Depth | AttachmentPoint::DepthStencil => {
                fb.depth = Some(MockAttachment::Texture(texture));
            }
        }
        self.commands.push(DeviceCommand::AttachTexture { framebuffer, point, texture });
        Ok(())
    }

    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        renderbuffer: RenderbufferHandle,
    ) -> Result<()> {
        if !self.renderbuffers.contains_key(&renderbuffer) {
            return Err(Error::InvalidResource(format!("Unknown renderbuffer {}", renderbuffer.raw())));
        }
        let Some(fb) = self.framebuffers.get_mut(&framebuffer) else {
            return Err(Error::InvalidResource(format!("Unknown framebuffer {}", framebuffer.raw())));
        };
        match point {
            AttachmentPoint::Color(index) => {
                fb.colors.insert(index, MockAttachment::Renderbuffer(renderbuffer));
            }
            AttachmentPoint::Depth | AttachmentPoint::DepthStencil => {
                fb.depth = Some(MockAttachment::Renderbuffer(renderbuffer));
            }
        }
        self.commands.push(DeviceCommand::AttachRenderbuffer { framebuffer, point, renderbuffer });
        Ok(())
    }

    fn set_draw_buffers(&mut self, framebuffer: FramebufferHandle, count: u32) -> Result<()> {
        let Some(fb) = self.framebuffers.get_mut(&framebuffer) else {
            return Err(Error::InvalidResource(format!("Unknown framebuffer {}", framebuffer.raw())));
        };
        fb.draw_buffer_count = count;
        fb.draw_buffer_override = None;
        self.commands.push(DeviceCommand::SetDrawBuffers { framebuffer, count });
        Ok(())
    }

    fn check_framebuffer_status(&mut self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let status = match (self.forced_incomplete, self.framebuffers.get(&framebuffer)) {
            (Some(code), _) => FramebufferStatus::Incomplete(code),
            (None, None) => FramebufferStatus::Incomplete(STATUS_INCOMPLETE_ATTACHMENT),
            (None, Some(fb)) => {
                let attachments: Vec<MockAttachment> =
                    fb.colors.values().copied().chain(fb.depth).collect();
                let sizes: Option<Vec<(u32, u32)>> = attachments
                    .iter()
                    .map(|a| match a {
                        MockAttachment::Texture(t) => self.textures.get(t).map(|t| (t.desc.width, t.desc.height)),
                        MockAttachment::Renderbuffer(r) => {
                            self.renderbuffers.get(r).map(|r| (r.desc.width, r.desc.height))
                        }
                    })
                    .collect();

                match sizes {
                    None => FramebufferStatus::Incomplete(STATUS_INCOMPLETE_ATTACHMENT),
                    Some(sizes) if sizes.is_empty() => FramebufferStatus::Incomplete(STATUS_MISSING_ATTACHMENT),
                    Some(sizes) if sizes.windows(2).any(|w| w[0] != w[1]) => {
                        FramebufferStatus::Incomplete(STATUS_INCOMPLETE_DIMENSIONS)
                    }
                    Some(_) if (0..fb.draw_buffer_count).any(|i| !fb.colors.contains_key(&i)) => {
                        FramebufferStatus::Incomplete(STATUS_INCOMPLETE_DRAW_BUFFER)
                    }
                    Some(_) => FramebufferStatus::Complete,
                }
            }
        };
        self.commands.push(DeviceCommand::CheckStatus { framebuffer, status });
        status
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        match target {
            FramebufferTarget::Both => {
                self.read_binding = framebuffer;
                self.draw_binding = framebuffer;
            }
            FramebufferTarget::Read => self.read_binding = framebuffer,
            FramebufferTarget::Draw => self.draw_binding = framebuffer,
        }
        self.commands.push(DeviceCommand::BindFramebuffer { target, framebuffer });
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferHandle> {
        match target {
            FramebufferTarget::Read => self.read_binding,
            FramebufferTarget::Both | FramebufferTarget::Draw => self.draw_binding,
        }
    }

    fn set_read_buffer(&mut self, attachment: u32) {
        if let Some(fb) = self.read_binding.and_then(|fb| self.framebuffers.get_mut(&fb)) {
            fb.read_buffer = attachment;
        }
        self.commands.push(DeviceCommand::SetReadBuffer(attachment));
    }

    fn set_draw_buffer(&mut self, attachment: Option<u32>) {
        if let Some(fb) = self.draw_binding.and_then(|fb| self.framebuffers.get_mut(&fb)) {
            fb.draw_buffer_override = attachment;
        }
        self.commands.push(DeviceCommand::SetDrawBuffer(attachment));
    }

    fn blit_framebuffer(&mut self, src: Rect2D, dst: Rect2D, mask: ClearFlags, filter: Filter) {
        self.commands.push(DeviceCommand::Blit {
            read: self.read_binding,
            draw: self.draw_binding,
            src,
            dst,
            mask,
            filter,
        });

        let exact = filter == Filter::Nearest && src.width == dst.width && src.height == dst.height;
        let transform = |signature: u64| -> u64 {
            if exact {
                signature
            } else {
                let mut hasher = FxHasher::default();
                (signature, dst.width, dst.height, filter).hash(&mut hasher);
                hasher.finish()
            }
        };

        if mask.contains(ClearFlags::COLOR) {
            let source = match self.read_binding {
                None => Some(self.default_signature),
                Some(fb) => self.framebuffers.get(&fb).and_then(|f| {
                    f.colors.get(&f.read_buffer).map(|a| self.attachment_signature(*a))
                }),
            };
            if let Some(source) = source {
                let signature = transform(source);
                match self.draw_binding {
                    None => self.default_signature = signature,
                    Some(fb) => {
                        for attachment in self.draw_color_targets(fb) {
                            self.write_attachment(attachment, signature);
                        }
                    }
                }
            }
        }

        if mask.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
            let source = self
                .read_binding
                .and_then(|fb| self.framebuffers.get(&fb))
                .and_then(|f| f.depth)
                .map(|a| self.attachment_signature(a));
            let dest = self
                .draw_binding
                .and_then(|fb| self.framebuffers.get(&fb))
                .and_then(|f| f.depth);
            if let (Some(source), Some(dest)) = (source, dest) {
                self.write_attachment(dest, transform(source));
            }
        }
    }

    // ===== RENDER STATE =====

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(DeviceCommand::SetViewport(viewport));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.commands.push(DeviceCommand::SetClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(DeviceCommand::Clear { framebuffer: self.draw_binding, flags });
        match self.draw_binding {
            None => {
                if flags.contains(ClearFlags::COLOR) {
                    self.default_signature = 0;
                }
            }
            Some(fb) => {
                if flags.contains(ClearFlags::COLOR) {
                    for attachment in self.draw_color_targets(fb) {
                        self.write_attachment(attachment, 0);
                    }
                }
                if flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
                    if let Some(depth) = self.framebuffers.get(&fb).and_then(|f| f.depth) {
                        self.write_attachment(depth, 0);
                    }
                }
            }
        }
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
        self.commands.push(DeviceCommand::SetCullFace(face));
    }

    // ===== PROGRAMS =====

    fn use_program(&mut self, shader: ShaderHandle) {
        self.program = Some(shader);
        self.commands.push(DeviceCommand::UseProgram(shader));
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue) {
        self.uniforms.insert((shader, name.to_string()), value);
        self.commands.push(DeviceCommand::SetUniform { shader, name: name.to_string(), value });
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(texture) => {
                self.texture_units.insert(unit, texture);
            }
            None => {
                self.texture_units.remove(&unit);
            }
        }
        self.commands.push(DeviceCommand::BindTexture { unit, texture });
    }

    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        self.uniform_bindings.insert(binding, buffer);
        self.commands.push(DeviceCommand::BindUniformBuffer { binding, buffer });
    }

    // ===== DRAWING =====

    fn draw_arrays(&mut self, vertex_array: VertexArrayHandle, first: u32, count: u32) {
        self.commands.push(DeviceCommand::DrawArrays {
            vertex_array,
            first,
            count,
            framebuffer: self.draw_binding,
            program: self.program,
        });
        self.record_draw();
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.commands.push(DeviceCommand::DrawMesh {
            mesh,
            framebuffer: self.draw_binding,
            program: self.program,
        });
        self.record_draw();
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
