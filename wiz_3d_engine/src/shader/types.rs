/// Fixed table of shader value types the reflector understands

use crate::device::AttributeFormat;

/// A shader value type with a known byte size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderType {
    Float2,
    Float3,
    Float4,
    Float4x4,
}

impl ShaderType {
    /// Look up a type by its source name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "float2" => Some(ShaderType::Float2),
            "float3" => Some(ShaderType::Float3),
            "float4" => Some(ShaderType::Float4),
            "float4x4" => Some(ShaderType::Float4x4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShaderType::Float2 => "float2",
            ShaderType::Float3 => "float3",
            ShaderType::Float4 => "float4",
            ShaderType::Float4x4 => "float4x4",
        }
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            ShaderType::Float2 => 8,
            ShaderType::Float3 => 12,
            ShaderType::Float4 => 16,
            ShaderType::Float4x4 => 64,
        }
    }

    /// Vertex attribute format, for the types valid as vertex inputs
    pub fn attribute_format(&self) -> Option<AttributeFormat> {
        match self {
            ShaderType::Float2 => Some(AttributeFormat::R32G32_FLOAT),
            ShaderType::Float3 => Some(AttributeFormat::R32G32B32_FLOAT),
            ShaderType::Float4 => Some(AttributeFormat::R32G32B32A32_FLOAT),
            ShaderType::Float4x4 => None,
        }
    }
}
