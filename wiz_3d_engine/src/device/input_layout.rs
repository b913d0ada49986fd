/// Vertex attribute layout and input layout trait

/// Component format of one vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum AttributeFormat {
    R32G32_FLOAT,       // float2 (8 bytes)
    R32G32B32_FLOAT,    // float3 (12 bytes)
    R32G32B32A32_FLOAT, // float4 (16 bytes)
}

impl AttributeFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            AttributeFormat::R32G32_FLOAT => 8,
            AttributeFormat::R32G32B32_FLOAT => 12,
            AttributeFormat::R32G32B32A32_FLOAT => 16,
        }
    }
}

/// One per-vertex field of the input layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Semantic name without its index (e.g. "TEXCOORD")
    pub semantic: String,
    /// Semantic index (numeric suffix of the semantic, 0 when absent)
    pub semantic_index: u32,
    /// Format of the attribute
    pub format: AttributeFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Input layout trait
///
/// Created from a compiled vertex shader and the reflected attribute list.
pub trait InputLayout: Send + Sync {
    /// Attributes this layout was created from
    fn attributes(&self) -> &[VertexAttribute];
}
