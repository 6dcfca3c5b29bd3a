/// Buffer and vertex layout descriptors

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Uniform buffer
    Uniform,
}

/// Buffer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
}

/// Interleaved float vertex layout
///
/// Each entry of `attributes` is the component count of one attribute,
/// bound to successive attribute locations starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: Vec<u32>,
}

impl VertexLayout {
    pub fn new(attributes: &[u32]) -> Self {
        Self { attributes: attributes.to_vec() }
    }

    /// Floats per vertex
    pub fn stride_floats(&self) -> u32 {
        self.attributes.iter().sum()
    }
}
