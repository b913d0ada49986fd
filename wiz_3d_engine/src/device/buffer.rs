/// Buffer trait and buffer descriptor

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer (input assembly)
    Vertex,
    /// Index buffer (input assembly)
    Index,
    /// Uniform/constant buffer
    Uniform,
}

/// Index element format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum IndexFormat {
    /// 32-bit unsigned indices
    R32_UINT,
}

impl IndexFormat {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexFormat::R32_UINT => 4,
        }
    }
}

/// Descriptor for creating a buffer
///
/// Buffers are created with default (GPU-only) usage: the CPU never maps
/// them. Uniform buffers are refreshed through `DeviceContext::update_buffer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Debug label (block name for uniform buffers)
    pub label: String,
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types.
/// The buffer is destroyed when the last reference is dropped.
pub trait Buffer: Send + Sync {
    /// The descriptor this buffer was created from
    fn desc(&self) -> &BufferDesc;
}
