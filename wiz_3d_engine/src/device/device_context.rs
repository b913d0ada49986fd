/// DeviceContext trait - the immediate command context of a device

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;
use crate::device::{
    Buffer, DepthStencilTarget, IndexFormat, InputLayout, RenderTarget,
    Sampler, Shader, ShaderStage, Texture,
};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-surface viewport with the [0, 1] depth range
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

bitflags! {
    /// Which planes of a depth-stencil target to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const DEPTH = 0x1;
        const STENCIL = 0x2;
    }
}

/// Immediate command context
///
/// Commands execute in call order. Setting state does not draw; only
/// `draw_indexed` issues work that reads the bound state.
pub trait DeviceContext: Send + Sync {
    /// Set the primitive topology for subsequent draws
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()>;

    /// Bind the input layout used by the input assembler
    fn set_input_layout(&mut self, layout: &Arc<dyn InputLayout>) -> Result<()>;

    /// Activate a compiled shader on its stage
    fn set_shader(&mut self, shader: &Arc<dyn Shader>) -> Result<()>;

    /// Attach a uniform buffer to `slot` of `stage`
    fn set_uniform_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: &Arc<dyn Buffer>) -> Result<()>;

    /// Attach a texture (or nothing) to resource `slot` of `stage`
    fn set_shader_resource(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        texture: Option<&Arc<dyn Texture>>,
    ) -> Result<()>;

    /// Attach a sampler to `slot` of `stage`
    fn set_sampler(&mut self, stage: ShaderStage, slot: u32, sampler: &Arc<dyn Sampler>) -> Result<()>;

    /// Bind a vertex buffer into the input assembler
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, stride: u32, offset: u32) -> Result<()>;

    /// Bind an index buffer into the input assembler
    fn set_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, format: IndexFormat, offset: u32) -> Result<()>;

    /// Replace the full contents of a default-usage buffer
    fn update_buffer(&mut self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()>;

    /// Draw indexed primitives
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Location of the first index read
    /// * `base_vertex` - Value added to each index before reading a vertex
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) -> Result<()>;

    /// Bind the colour and depth-stencil targets of the output merger
    fn set_render_targets(
        &mut self,
        color: &Arc<dyn RenderTarget>,
        depth_stencil: &Arc<dyn DepthStencilTarget>,
    ) -> Result<()>;

    /// Clear a colour target
    fn clear_render_target(&mut self, target: &Arc<dyn RenderTarget>, color: [f32; 4]) -> Result<()>;

    /// Clear selected planes of a depth-stencil target
    fn clear_depth_stencil(
        &mut self,
        target: &Arc<dyn DepthStencilTarget>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()>;

    /// Set the rasterizer viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Unbind all state
    fn clear_state(&mut self) -> Result<()>;

    /// Submit any buffered commands to the GPU
    fn flush(&mut self) -> Result<()>;
}
