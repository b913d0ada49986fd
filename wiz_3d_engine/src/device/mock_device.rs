/// Mock device chain for unit tests (no GPU required)
///
/// Every context command is recorded into a shared `MockState` so tests
/// can assert what was bound, uploaded and drawn, and in which order.

use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::device::{
    Buffer, BufferDesc, ClearFlags, DepthFormat, DepthStencilTarget, DeviceChain,
    DeviceContext, GraphicsDevice, IndexFormat, InputLayout, PrimitiveTopology,
    RenderTarget, Sampler, SamplerDesc, Shader, ShaderDesc, ShaderStage, Swapchain,
    Texture, TextureDesc, TextureInfo, VertexAttribute, Viewport,
};

// ============================================================================
// Recorded state
// ============================================================================

/// One recorded context command
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    SetPrimitiveTopology(PrimitiveTopology),
    SetInputLayout { attribute_count: usize },
    SetShader(ShaderStage),
    SetUniformBuffer { stage: ShaderStage, slot: u32, label: String },
    SetShaderResource { stage: ShaderStage, slot: u32, label: Option<String> },
    SetSampler { stage: ShaderStage, slot: u32 },
    SetVertexBuffer { slot: u32, label: String, stride: u32, offset: u32 },
    SetIndexBuffer { label: String, format: IndexFormat, offset: u32 },
    UpdateBuffer { label: String, data: Vec<u8> },
    DrawIndexed { index_count: u32, first_index: u32, base_vertex: i32 },
    SetRenderTargets { width: u32, height: u32, back_buffer_index: u32 },
    ClearRenderTarget { color: [f32; 4] },
    ClearDepthStencil { flags: ClearFlags, depth: f32, stencil: u8 },
    SetViewport(Viewport),
    ClearState,
    Flush,
}

/// Everything the mock chain has observed
#[derive(Debug, Default)]
pub struct MockState {
    pub commands: Vec<MockCommand>,
    pub buffers_created: Vec<BufferDesc>,
    pub textures_created: Vec<String>,
    pub shaders_compiled: Vec<(ShaderStage, String)>,
    pub input_layouts_created: usize,
    pub samplers_created: usize,
    pub render_targets_created: Vec<u32>,
    pub depth_targets_created: Vec<(u32, u32)>,
    pub swapchain_resizes: Vec<(u32, u32)>,
    pub presents: Vec<u32>,
    /// Make `compile_shader` fail for this stage
    pub fail_compile: Option<ShaderStage>,
    /// Make `draw_indexed` fail
    pub fail_draw: bool,
}

impl MockState {
    /// Draw calls recorded so far
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, MockCommand::DrawIndexed { .. }))
            .count()
    }

    /// Uploads recorded for a buffer label, in order
    pub fn uploads_to(&self, label: &str) -> Vec<Vec<u8>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                MockCommand::UpdateBuffer { label: l, data } if l == label => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

pub type SharedMockState = Arc<Mutex<MockState>>;

fn record(state: &SharedMockState, command: MockCommand) {
    if let Ok(mut s) = state.lock() {
        s.commands.push(command);
    }
}

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub desc: BufferDesc,
}

impl Buffer for MockBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
}

impl MockTexture {
    pub fn new(label: &str, width: u32, height: u32) -> Self {
        Self {
            info: TextureInfo {
                label: label.to_string(),
                width,
                height,
                format: crate::device::TextureFormat::R8G8B8A8_UNORM,
            },
        }
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

#[derive(Debug)]
pub struct MockShader {
    pub stage: ShaderStage,
    pub label: String,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

#[derive(Debug)]
pub struct MockInputLayout {
    pub attributes: Vec<VertexAttribute>,
}

impl InputLayout for MockInputLayout {
    fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }
}

#[derive(Debug)]
pub struct MockSampler;

impl Sampler for MockSampler {}

/// Back-buffer view; holds a token so the swapchain can see live views
#[derive(Debug)]
pub struct MockRenderTarget {
    pub width: u32,
    pub height: u32,
    pub index: u32,
    _token: Arc<()>,
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
    fn back_buffer_index(&self) -> u32 { self.index }
}

#[derive(Debug)]
pub struct MockDepthStencil {
    pub width: u32,
    pub height: u32,
    pub format: DepthFormat,
}

impl DepthStencilTarget for MockDepthStencil {
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
    fn format(&self) -> DepthFormat { self.format }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockGraphicsDevice {
    pub state: SharedMockState,
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        if let Some(bytes) = data {
            if bytes.len() as u64 != desc.size {
                return Err(Error::BackendError(format!(
                    "initial data is {} bytes, buffer is {}",
                    bytes.len(),
                    desc.size
                )));
            }
        }
        if let Ok(mut s) = self.state.lock() {
            s.buffers_created.push(desc.clone());
        }
        Ok(Arc::new(MockBuffer { desc: desc.clone() }))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if let Ok(mut s) = self.state.lock() {
            s.textures_created.push(desc.label.to_string());
        }
        Ok(Arc::new(MockTexture {
            info: TextureInfo {
                label: desc.label.to_string(),
                width: desc.width,
                height: desc.height,
                format: desc.format,
            },
        }))
    }

    fn compile_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| Error::BackendError("mock state poisoned".to_string()))?;
        if s.fail_compile == Some(desc.stage) {
            return Err(Error::BackendError(format!(
                "{}: error X3000: syntax error",
                desc.label
            )));
        }
        s.shaders_compiled.push((desc.stage, desc.label.to_string()));
        Ok(Arc::new(MockShader {
            stage: desc.stage,
            label: desc.label.to_string(),
        }))
    }

    fn create_input_layout(
        &self,
        vertex_shader: &Arc<dyn Shader>,
        attributes: &[VertexAttribute],
    ) -> Result<Arc<dyn InputLayout>> {
        if vertex_shader.stage() != ShaderStage::Vertex {
            return Err(Error::BackendError("input layout needs a vertex shader".to_string()));
        }
        if let Ok(mut s) = self.state.lock() {
            s.input_layouts_created += 1;
        }
        Ok(Arc::new(MockInputLayout { attributes: attributes.to_vec() }))
    }

    fn create_depth_stencil(&self, width: u32, height: u32, format: DepthFormat) -> Result<Arc<dyn DepthStencilTarget>> {
        if let Ok(mut s) = self.state.lock() {
            s.depth_targets_created.push((width, height));
        }
        Ok(Arc::new(MockDepthStencil { width, height, format }))
    }

    fn create_sampler(&self, _desc: &SamplerDesc) -> Result<Arc<dyn Sampler>> {
        if let Ok(mut s) = self.state.lock() {
            s.samplers_created += 1;
        }
        Ok(Arc::new(MockSampler))
    }
}

// ============================================================================
// Mock context
// ============================================================================

pub struct MockDeviceContext {
    pub state: SharedMockState,
}

impl DeviceContext for MockDeviceContext {
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()> {
        record(&self.state, MockCommand::SetPrimitiveTopology(topology));
        Ok(())
    }

    fn set_input_layout(&mut self, layout: &Arc<dyn InputLayout>) -> Result<()> {
        record(&self.state, MockCommand::SetInputLayout {
            attribute_count: layout.attributes().len(),
        });
        Ok(())
    }

    fn set_shader(&mut self, shader: &Arc<dyn Shader>) -> Result<()> {
        record(&self.state, MockCommand::SetShader(shader.stage()));
        Ok(())
    }

    fn set_uniform_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: &Arc<dyn Buffer>) -> Result<()> {
        record(&self.state, MockCommand::SetUniformBuffer {
            stage,
            slot,
            label: buffer.desc().label.clone(),
        });
        Ok(())
    }

    fn set_shader_resource(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        texture: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        record(&self.state, MockCommand::SetShaderResource {
            stage,
            slot,
            label: texture.map(|t| t.info().label.clone()),
        });
        Ok(())
    }

    fn set_sampler(&mut self, stage: ShaderStage, slot: u32, _sampler: &Arc<dyn Sampler>) -> Result<()> {
        record(&self.state, MockCommand::SetSampler { stage, slot });
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, stride: u32, offset: u32) -> Result<()> {
        record(&self.state, MockCommand::SetVertexBuffer {
            slot,
            label: buffer.desc().label.clone(),
            stride,
            offset,
        });
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, format: IndexFormat, offset: u32) -> Result<()> {
        record(&self.state, MockCommand::SetIndexBuffer {
            label: buffer.desc().label.clone(),
            format,
            offset,
        });
        Ok(())
    }

    fn update_buffer(&mut self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()> {
        if data.len() as u64 > buffer.desc().size {
            return Err(Error::BackendError(format!(
                "update of {} bytes overflows '{}' ({} bytes)",
                data.len(),
                buffer.desc().label,
                buffer.desc().size
            )));
        }
        record(&self.state, MockCommand::UpdateBuffer {
            label: buffer.desc().label.clone(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) -> Result<()> {
        let fail = self.state.lock().map(|s| s.fail_draw).unwrap_or(false);
        if fail {
            return Err(Error::BackendError("device removed".to_string()));
        }
        record(&self.state, MockCommand::DrawIndexed { index_count, first_index, base_vertex });
        Ok(())
    }

    fn set_render_targets(
        &mut self,
        color: &Arc<dyn RenderTarget>,
        _depth_stencil: &Arc<dyn DepthStencilTarget>,
    ) -> Result<()> {
        record(&self.state, MockCommand::SetRenderTargets {
            width: color.width(),
            height: color.height(),
            back_buffer_index: color.back_buffer_index(),
        });
        Ok(())
    }

    fn clear_render_target(&mut self, _target: &Arc<dyn RenderTarget>, color: [f32; 4]) -> Result<()> {
        record(&self.state, MockCommand::ClearRenderTarget { color });
        Ok(())
    }

    fn clear_depth_stencil(
        &mut self,
        _target: &Arc<dyn DepthStencilTarget>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        record(&self.state, MockCommand::ClearDepthStencil { flags, depth, stencil });
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        record(&self.state, MockCommand::SetViewport(viewport));
        Ok(())
    }

    fn clear_state(&mut self) -> Result<()> {
        record(&self.state, MockCommand::ClearState);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        record(&self.state, MockCommand::Flush);
        Ok(())
    }
}

// ============================================================================
// Mock swapchain
// ============================================================================

pub struct MockSwapchain {
    pub state: SharedMockState,
    pub width: u32,
    pub height: u32,
    pub buffer_count: u32,
    views: Arc<()>,
}

impl Swapchain for MockSwapchain {
    fn buffer_count(&self) -> u32 {
        self.buffer_count
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn back_buffer_target(&self, index: u32) -> Result<Arc<dyn RenderTarget>> {
        if index >= self.buffer_count {
            return Err(Error::InvalidResource(format!(
                "back-buffer {} out of range ({} buffers)",
                index, self.buffer_count
            )));
        }
        if let Ok(mut s) = self.state.lock() {
            s.render_targets_created.push(index);
        }
        Ok(Arc::new(MockRenderTarget {
            width: self.width,
            height: self.height,
            index,
            _token: self.views.clone(),
        }))
    }

    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<()> {
        // Same rule as DXGI: no outstanding back-buffer references
        if Arc::strong_count(&self.views) > 1 {
            return Err(Error::BackendError(
                "resize_buffers called while back-buffer views are alive".to_string(),
            ));
        }
        self.width = width;
        self.height = height;
        if let Ok(mut s) = self.state.lock() {
            s.swapchain_resizes.push((width, height));
        }
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        if let Ok(mut s) = self.state.lock() {
            s.presents.push(sync_interval);
        }
        Ok(())
    }
}

/// Build a mock device chain with a swapchain of `width` x `height`
pub fn mock_device_chain(width: u32, height: u32, buffer_count: u32) -> (DeviceChain, SharedMockState) {
    let state: SharedMockState = Arc::new(Mutex::new(MockState::default()));
    let chain = DeviceChain {
        device: Box::new(MockGraphicsDevice { state: state.clone() }),
        context: Box::new(MockDeviceContext { state: state.clone() }),
        swapchain: Box::new(MockSwapchain {
            state: state.clone(),
            width,
            height,
            buffer_count,
            views: Arc::new(()),
        }),
    };
    (chain, state)
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
