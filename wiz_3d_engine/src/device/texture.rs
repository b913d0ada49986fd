/// Texture trait, texture descriptor, sampler trait and sampler descriptor

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    B8G8R8A8_UNORM,
}

impl TextureFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_UNORM | TextureFormat::B8G8R8A8_UNORM => 4,
        }
    }
}

/// Descriptor for creating a sampled 2D texture
#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
    /// Debug label
    pub label: &'a str,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Initial pixel data (row-major, tightly packed)
    pub data: &'a [u8],
}

/// Read-only properties of a created texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types. A texture is bound to
/// a pixel-stage resource slot through its shader resource view, which the
/// backend owns alongside the texture.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;
}

// ===== SAMPLER =====

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Nearest texel, no interpolation
    Point,
    /// Linear min/mag/mip filtering
    Linear,
}

/// Texture addressing mode outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Wrap,
    Clamp,
    Mirror,
}

/// Descriptor for creating a sampler state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: Filter::Linear,
            address_u: AddressMode::Wrap,
            address_v: AddressMode::Wrap,
            address_w: AddressMode::Wrap,
            mip_lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: f32::MAX,
        }
    }
}

/// Sampler state trait
pub trait Sampler: Send + Sync {}
