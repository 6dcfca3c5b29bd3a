/// Texture and renderbuffer descriptors

/// Texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    // Color formats
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Depth formats
    D16_UNORM,
    D24_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// True for depth and depth-stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D24_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
        )
    }

    /// True for packed depth-stencil formats
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }
}

/// Sampling filter (also used for framebuffer blits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Texture addressing mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WrapMode {
    ClampToEdge,
    /// Clamp to a constant border color (RGBA)
    ClampToBorder([f32; 4]),
    Repeat,
}

/// Descriptor for a 2D texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap: WrapMode,
}

impl TextureDesc {
    /// Color attachment texture: linear filtering, clamp-to-edge
    pub fn color_attachment(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap: WrapMode::ClampToEdge,
        }
    }

    /// Sampleable depth texture: nearest filtering, white border so
    /// lookups outside the map read as "fully lit"
    pub fn depth_attachment(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            wrap: WrapMode::ClampToBorder([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

/// Descriptor for a renderbuffer (non-sampleable attachment storage)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderbufferDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}
