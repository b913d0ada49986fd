/// GraphicsDevice trait - resource factory and shader compiler

use std::sync::Arc;
use crate::error::Result;
use crate::device::{
    Buffer, BufferDesc, DepthFormat, DepthStencilTarget, DeviceContext, InputLayout,
    Sampler, SamplerDesc, Shader, ShaderDesc, Swapchain, Texture, TextureDesc,
    VertexAttribute,
};

/// Main device trait
///
/// This is the central factory interface for creating GPU resources.
/// Implemented by backend-specific devices. All created resources are
/// immutable after creation unless stated otherwise.
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor
    /// * `data` - Initial contents (`desc.size` bytes), or `None` for zeroed memory
    fn create_buffer(&self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>>;

    /// Create a sampled texture with its shader resource view
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Compile one shader stage from source text
    ///
    /// Compilation errors are reported as `Error::BackendError` carrying
    /// the compiler output.
    fn compile_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create an input layout matching a compiled vertex shader's signature
    fn create_input_layout(
        &self,
        vertex_shader: &Arc<dyn Shader>,
        attributes: &[VertexAttribute],
    ) -> Result<Arc<dyn InputLayout>>;

    /// Create a depth-stencil target of the given size
    fn create_depth_stencil(&self, width: u32, height: u32, format: DepthFormat) -> Result<Arc<dyn DepthStencilTarget>>;

    /// Create a sampler state
    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>>;
}

/// The device/surface chain supplied by the windowing layer
///
/// Owned by the `Renderer`. Dropping it releases the device.
pub struct DeviceChain {
    /// Resource factory
    pub device: Box<dyn GraphicsDevice>,
    /// Immediate command context
    pub context: Box<dyn DeviceContext>,
    /// Presentable back-buffers of the window surface
    pub swapchain: Box<dyn Swapchain>,
}
