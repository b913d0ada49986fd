/// Shader trait and shader descriptor

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Pixel (fragment) shader
    Pixel,
}

impl ShaderStage {
    /// Both stages, in the order bindings are applied and searched
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Pixel];

    /// Compiler target profile for this stage
    pub fn profile(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }
}

/// Descriptor for compiling a shader stage
///
/// The backend owns the compiler: the engine only hands it stage text.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// Stage source text
    pub source: &'a str,
    /// Shader stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: &'a str,
    /// Compiler target profile (e.g. "vs_5_0")
    pub profile: &'a str,
    /// Debug label (program name)
    pub label: &'a str,
}

/// Compiled shader stage trait
///
/// Implemented by backend-specific shader types.
pub trait Shader: Send + Sync {
    /// Stage this shader was compiled for
    fn stage(&self) -> ShaderStage;
}
