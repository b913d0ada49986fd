/// RenderContext - owner of one renderer and its shader library
///
/// Replaces process-wide engine state: everything a frame needs is reached
/// through a context value, and several contexts may coexist. Teardown
/// releases the shader programs first, then the renderer's frame buffer,
/// then flushes the device context and finally drops the device chain.
///
/// # Example
///
/// ```ignore
/// let mut ctx = RenderContext::new(backend_chain, RendererConfig::default())?;
/// ctx.load_shader("Basic", "shaders/basic.hlsl")?;
/// ctx.use_shader("Basic")?;
///
/// let renderer = ctx.renderer_mut();
/// renderer.begin_frame()?;
/// renderer.clear([0.0, 0.0, 0.0, 1.0])?;
/// renderer.begin_draw(&camera)?;
/// renderer.submit(&mesh, transform.matrix())?;
/// renderer.end_draw()?;
///
/// ctx.shutdown()?;
/// ```

use std::path::Path;
use std::sync::Arc;
use crate::device::DeviceChain;
use crate::error::Result;
use crate::render::{Renderer, RendererConfig};
use crate::shader::{ShaderLibrary, ShaderProgram};
use crate::engine_info;

pub struct RenderContext {
    // Dropped before the renderer
    shaders: ShaderLibrary,
    renderer: Renderer,
}

impl RenderContext {
    /// Build the renderer on top of `chain`, with an empty shader library
    pub fn new(chain: DeviceChain, config: RendererConfig) -> Result<Self> {
        let renderer = Renderer::new(chain, config)?;
        engine_info!("wiz3d::RenderContext", "Render context created");
        Ok(Self {
            shaders: ShaderLibrary::new(),
            renderer,
        })
    }

    // ===== SHADERS =====

    /// Load a shader document from disk and register it as `name`
    pub fn load_shader(&mut self, name: &str, path: impl AsRef<Path>) -> Result<Arc<ShaderProgram>> {
        self.shaders.load(self.renderer.device(), name, path)
    }

    /// Register a shader document held in memory as `name`
    pub fn load_shader_source(&mut self, name: &str, source: &str) -> Result<Arc<ShaderProgram>> {
        self.shaders.load_source(self.renderer.device(), name, source)
    }

    pub fn shader(&self, name: &str) -> Result<Arc<ShaderProgram>> {
        self.shaders.get(name)
    }

    /// Make the program registered as `name` the one `begin_draw` binds
    pub fn use_shader(&mut self, name: &str) -> Result<()> {
        let program = self.shaders.get(name)?;
        self.renderer.set_program(program);
        Ok(())
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    // ===== RENDERER =====

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Tear the context down in order
    ///
    /// Library programs, then the frame buffer, then a context flush. The
    /// device chain is dropped when this returns.
    pub fn shutdown(self) -> Result<()> {
        let Self { mut shaders, mut renderer } = self;
        shaders.close();
        drop(shaders);
        renderer.shutdown()?;
        engine_info!("wiz3d::RenderContext", "Render context shut down");
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
