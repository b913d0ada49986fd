/// Renderer - owns the device chain and runs the per-frame draw pipeline
///
/// One frame, strictly in this order on the owning thread:
///
/// 1. `begin_frame` - apply a pending resize
/// 2. `clear` - clear the frame buffer
/// 3. `begin_draw` - bind the active program, upload the camera matrix
/// 4. `submit` - queue draws (zero or more)
/// 5. `end_draw` - draw the queue in submission order, then present

use std::sync::Arc;
use glam::Mat4;
use crate::camera::Camera;
use crate::device::{
    DepthFormat, DeviceChain, DeviceContext, GraphicsDevice, PrimitiveTopology,
    Sampler, SamplerDesc, ShaderStage, Swapchain, Viewport,
};
use crate::error::{Error, Result};
use crate::render::frame_buffer::{BackBufferCounter, FrameBuffer};
use crate::render::resize::{ResizeEvent, ResizeNotifier};
use crate::resource::Mesh;
use crate::shader::ShaderProgram;
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};

// ============================================================================
// Configuration and statistics
// ============================================================================

/// Renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Vertical blanks to wait for at present (0 = immediate)
    pub sync_interval: u32,
    /// Primitive topology set at construction
    pub topology: PrimitiveTopology,
    /// Format of the frame buffer's depth-stencil target
    pub depth_format: DepthFormat,
    /// Sampler bound to pixel slot 0 at construction
    pub sampler: SamplerDesc,
    /// Uniform block receiving the camera view-projection at `begin_draw`
    pub camera_block: String,
    /// Uniform block receiving each draw's world matrix at `end_draw`
    pub object_block: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sync_interval: 1,
            topology: PrimitiveTopology::TriangleList,
            depth_format: DepthFormat::D32_FLOAT_S8X24_UINT,
            sampler: SamplerDesc::default(),
            camera_block: "CameraData".to_string(),
            object_block: "ObjectData".to_string(),
        }
    }
}

/// Statistics of the last presented frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Number of frames presented so far
    pub frame_index: u64,
    /// Number of draw calls issued
    pub draw_calls: u32,
    /// Number of triangles drawn
    pub triangles: u32,
    /// Number of submitted draw commands
    pub submitted: u32,
}

/// One queued draw: the mesh and a snapshot of its world matrix
struct DrawCommand {
    mesh: Arc<Mesh>,
    transform: Mat4,
}

// ============================================================================
// Renderer
// ============================================================================

pub struct Renderer {
    // Dropped before the device chain below
    queue: Vec<DrawCommand>,
    /// Program bound by `begin_draw`; `Some` while a frame is being drawn
    drawing: Option<Arc<ShaderProgram>>,
    program: Option<Arc<ShaderProgram>>,
    frame_buffer: Option<FrameBuffer>,
    sampler: Arc<dyn Sampler>,

    context: Box<dyn DeviceContext>,
    swapchain: Box<dyn Swapchain>,
    device: Box<dyn GraphicsDevice>,

    config: RendererConfig,
    counter: BackBufferCounter,
    resize: ResizeNotifier,
    stats: RendererStats,
    shut_down: bool,
}

fn init_failed(step: &str, error: Error) -> Error {
    engine_error!("wiz3d::Renderer", "Initialization failed while {}: {}", step, error);
    Error::InitializationFailed(format!("{}: {}", step, error))
}

impl Renderer {
    /// Take ownership of a device chain and prepare it for drawing
    ///
    /// Sets the primitive topology, binds the configured sampler to pixel
    /// slot 0, creates a frame buffer at the swapchain size, sets a
    /// full-surface viewport and binds the frame buffer.
    pub fn new(chain: DeviceChain, config: RendererConfig) -> Result<Self> {
        let DeviceChain { device, mut context, swapchain } = chain;

        context
            .set_primitive_topology(config.topology)
            .map_err(|e| init_failed("setting the topology", e))?;

        let sampler = device
            .create_sampler(&config.sampler)
            .map_err(|e| init_failed("creating the sampler", e))?;
        context
            .set_sampler(ShaderStage::Pixel, 0, &sampler)
            .map_err(|e| init_failed("binding the sampler", e))?;

        let (width, height) = (swapchain.width(), swapchain.height());
        let counter = BackBufferCounter::new();
        let frame_buffer = FrameBuffer::new(
            device.as_ref(),
            swapchain.as_ref(),
            counter.clone(),
            width,
            height,
            config.depth_format,
        )
        .map_err(|e| init_failed("creating the frame buffer", e))?;

        context
            .set_viewport(Viewport::from_size(width, height))
            .map_err(|e| init_failed("setting the viewport", e))?;
        frame_buffer
            .bind(context.as_mut())
            .map_err(|e| init_failed("binding the frame buffer", e))?;

        engine_info!(
            "wiz3d::Renderer",
            "Initialized at {}x{} ({} back-buffers)",
            width,
            height,
            swapchain.buffer_count()
        );

        Ok(Self {
            queue: Vec::new(),
            drawing: None,
            program: None,
            frame_buffer: Some(frame_buffer),
            sampler,
            context,
            swapchain,
            device,
            config,
            counter,
            resize: ResizeNotifier::new(),
            stats: RendererStats::default(),
            shut_down: false,
        })
    }

    // ===== RESIZE =====

    /// Handle for the window layer to report resizes from any thread
    pub fn resize_notifier(&self) -> ResizeNotifier {
        self.resize.clone()
    }

    /// Record a resize to apply at the next `begin_frame`
    pub fn notify_resize(&self, event: ResizeEvent) {
        self.resize.notify(event);
    }

    /// Start a frame, applying any pending resize
    ///
    /// A resize that fails is returned as an error and retried by the next
    /// `begin_frame`, unless a newer event replaced it.
    pub fn begin_frame(&mut self) -> Result<()> {
        if self.drawing.is_some() {
            return Err(Error::InvalidResource("begin_frame called before end_draw".to_string()));
        }
        let event = match self.resize.take() {
            Some(event) if !event.is_empty() => event,
            pending => {
                if let Some(event) = pending {
                    engine_debug!("wiz3d::Renderer", "Ignoring {}x{} resize", event.width, event.height);
                }
                match self.frame_buffer.as_ref() {
                    // Left without targets by an earlier failed resize
                    Some(frame_buffer) if !frame_buffer.has_targets() => {
                        ResizeEvent::new(self.swapchain.width(), self.swapchain.height())
                    }
                    _ => return Ok(()),
                }
            }
        };
        // A failed resize leaves the frame buffer without targets: keep the
        // event so the next frame retries it
        if let Err(e) = self.apply_resize(event) {
            if self.resize.restore(event) {
                engine_warn!(
                    "wiz3d::Renderer",
                    "Resize to {}x{} failed, retrying next frame: {}",
                    event.width, event.height, e
                );
            }
            return Err(e);
        }
        Ok(())
    }

    fn apply_resize(&mut self, event: ResizeEvent) -> Result<()> {
        let frame_buffer = self
            .frame_buffer
            .as_mut()
            .ok_or_else(|| Error::InvalidResource("renderer has been shut down".to_string()))?;
        if !frame_buffer.needs_resize(event.width, event.height) {
            engine_trace!("wiz3d::Renderer", "Resize to current size {}x{} skipped", event.width, event.height);
            return Ok(());
        }

        frame_buffer.release_targets();
        self.swapchain.resize_buffers(event.width, event.height)?;
        frame_buffer.resize(
            self.device.as_ref(),
            self.swapchain.as_ref(),
            event.width,
            event.height,
            false,
        )?;
        self.context.set_viewport(Viewport::from_size(event.width, event.height))?;
        frame_buffer.bind(self.context.as_mut())?;

        engine_info!("wiz3d::Renderer", "Resized to {}x{}", event.width, event.height);
        Ok(())
    }

    // ===== FRAME =====

    /// Clear the frame buffer's colour, depth and stencil
    pub fn clear(&mut self, color: [f32; 4]) -> Result<()> {
        let frame_buffer = self
            .frame_buffer
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("renderer has been shut down".to_string()))?;
        frame_buffer.clear(self.context.as_mut(), color)
    }

    /// Bind the active program and upload the camera's view-projection
    ///
    /// The matrix is transposed to the row-major layout the shaders expect.
    pub fn begin_draw(&mut self, camera: &Camera) -> Result<()> {
        if self.drawing.is_some() {
            return Err(Error::InvalidResource("begin_draw called twice without end_draw".to_string()));
        }
        if self.frame_buffer.is_none() {
            return Err(Error::InvalidResource("renderer has been shut down".to_string()));
        }
        let program = self
            .program
            .clone()
            .ok_or_else(|| Error::InvalidResource("no active shader program".to_string()))?;

        program.bind(self.context.as_mut())?;
        program.set_uniform_value(
            self.context.as_mut(),
            &self.config.camera_block,
            &camera.view_projection().transpose(),
        )?;

        self.drawing = Some(program);
        Ok(())
    }

    /// Queue `mesh` to be drawn with world matrix `transform`
    ///
    /// The matrix is copied: later changes to the caller's transform do not
    /// affect this frame.
    pub fn submit(&mut self, mesh: &Arc<Mesh>, transform: Mat4) -> Result<()> {
        if self.drawing.is_none() {
            return Err(Error::InvalidResource("submit called outside begin_draw/end_draw".to_string()));
        }
        self.queue.push(DrawCommand {
            mesh: mesh.clone(),
            transform,
        });
        Ok(())
    }

    /// Draw every queued command in submission order, then present
    ///
    /// The queue is empty afterwards, also when a draw fails.
    pub fn end_draw(&mut self) -> Result<()> {
        let program = self
            .drawing
            .take()
            .ok_or_else(|| Error::InvalidResource("end_draw called without begin_draw".to_string()))?;

        let mut queue = std::mem::take(&mut self.queue);
        let drawn = self.draw_queue(&program, &queue);
        let submitted = queue.len() as u32;
        queue.clear();
        self.queue = queue;

        let (draw_calls, triangles) = drawn?;
        self.swapchain.present(self.config.sync_interval)?;

        self.stats = RendererStats {
            frame_index: self.stats.frame_index + 1,
            draw_calls,
            triangles,
            submitted,
        };
        Ok(())
    }

    fn draw_queue(&mut self, program: &ShaderProgram, queue: &[DrawCommand]) -> Result<(u32, u32)> {
        let mut draw_calls = 0;
        let mut triangles = 0;
        for command in queue {
            program.set_uniform_value(
                self.context.as_mut(),
                &self.config.object_block,
                &command.transform.transpose(),
            )?;
            draw_calls += command.mesh.draw(self.context.as_mut())?;
            triangles += command.mesh.triangle_count();
        }
        Ok((draw_calls, triangles))
    }

    // ===== STATE =====

    /// Program used by the next `begin_draw`
    pub fn set_program(&mut self, program: Arc<ShaderProgram>) {
        engine_debug!("wiz3d::Renderer", "Active program is now '{}'", program.name());
        self.program = Some(program);
    }

    pub fn program(&self) -> Option<&Arc<ShaderProgram>> {
        self.program.as_ref()
    }

    /// Whether a `begin_draw` is waiting for its `end_draw`
    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        self.frame_buffer.as_ref()
    }

    pub fn back_buffer_counter(&self) -> &BackBufferCounter {
        &self.counter
    }

    pub fn sampler(&self) -> &Arc<dyn Sampler> {
        &self.sampler
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn DeviceContext {
        self.context.as_mut()
    }

    pub fn swapchain(&self) -> &dyn Swapchain {
        self.swapchain.as_ref()
    }

    // ===== SHUTDOWN =====

    /// Release the frame buffer, then clear and flush the context
    ///
    /// Calling it again is a logged no-op. The device chain itself is
    /// released when the renderer is dropped.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            engine_warn!("wiz3d::Renderer", "shutdown() called twice");
            return Ok(());
        }

        self.queue.clear();
        self.drawing = None;
        self.program = None;
        self.frame_buffer = None;

        self.context.clear_state()?;
        self.context.flush()?;
        self.shut_down = true;

        engine_info!("wiz3d::Renderer", "Shut down after {} frames", self.stats.frame_index);
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(e) = self.shutdown() {
                engine_warn!("wiz3d::Renderer", "Shutdown during drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
