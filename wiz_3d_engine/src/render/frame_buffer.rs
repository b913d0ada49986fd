/// FrameBuffer - the colour + depth-stencil pair a frame renders into
///
/// The colour target is a view over one of the swapchain's physical
/// back-buffers; the depth-stencil target is allocated at the same size.
/// Both are recreated on resize.
///
/// A `BackBufferCounter` shared between a renderer and its frame buffers
/// tracks how many frame buffers are alive against the number of physical
/// back-buffers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use crate::device::{
    ClearFlags, DepthFormat, DepthStencilTarget, DeviceContext, GraphicsDevice,
    RenderTarget, Swapchain,
};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_error};

// ============================================================================
// BACK-BUFFER COUNTER
// ============================================================================

/// Live frame buffer count; never underflows, never exceeds the physical count
#[derive(Debug, Clone, Default)]
pub struct BackBufferCounter(Arc<AtomicU32>);

impl BackBufferCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a slot and return the back-buffer index it maps to
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` when all `physical` back-buffers are in use.
    pub fn acquire(&self, physical: u32) -> Result<u32> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < physical).then_some(live + 1)
            })
            .map_err(|live| {
                Error::InvalidResource(format!(
                    "all {} back-buffers are in use ({} live frame buffers)",
                    physical, live
                ))
            })
    }

    /// Give a slot back
    ///
    /// Returns `false` (and logs) instead of underflowing.
    pub fn release(&self) -> bool {
        match self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| live.checked_sub(1)) {
            Ok(_) => true,
            Err(_) => {
                engine_error!("wiz3d::FrameBuffer", "Back-buffer counter release without a live frame buffer");
                false
            }
        }
    }

    /// Number of live frame buffers
    pub fn live(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

// ============================================================================
// FRAME BUFFER
// ============================================================================

pub struct FrameBuffer {
    color: Option<Arc<dyn RenderTarget>>,
    depth_stencil: Option<Arc<dyn DepthStencilTarget>>,
    width: u32,
    height: u32,
    back_buffer_index: u32,
    depth_format: DepthFormat,
    counter: BackBufferCounter,
}

type Targets = (Arc<dyn RenderTarget>, Arc<dyn DepthStencilTarget>);

fn allocate_targets(
    device: &dyn GraphicsDevice,
    swapchain: &dyn Swapchain,
    back_buffer_index: u32,
    width: u32,
    height: u32,
    depth_format: DepthFormat,
) -> Result<Targets> {
    let color = swapchain.back_buffer_target(back_buffer_index)?;
    if (color.width(), color.height()) != (width, height) {
        engine_bail!(
            "wiz3d::FrameBuffer",
            "back-buffer {} is {}x{}, frame buffer wants {}x{} (swapchain not resized?)",
            back_buffer_index, color.width(), color.height(), width, height
        );
    }
    let depth_stencil = device.create_depth_stencil(width, height, depth_format)?;
    Ok((color, depth_stencil))
}

impl FrameBuffer {
    /// Allocate targets on the next free back-buffer
    pub fn new(
        device: &dyn GraphicsDevice,
        swapchain: &dyn Swapchain,
        counter: BackBufferCounter,
        width: u32,
        height: u32,
        depth_format: DepthFormat,
    ) -> Result<Self> {
        let back_buffer_index = counter.acquire(swapchain.buffer_count())?;

        let (color, depth_stencil) =
            match allocate_targets(device, swapchain, back_buffer_index, width, height, depth_format) {
                Ok(targets) => targets,
                Err(e) => {
                    counter.release();
                    return Err(e);
                }
            };

        engine_debug!(
            "wiz3d::FrameBuffer",
            "Created {}x{} on back-buffer {}",
            width, height, back_buffer_index
        );

        Ok(Self {
            color: Some(color),
            depth_stencil: Some(depth_stencil),
            width,
            height,
            back_buffer_index,
            depth_format,
            counter,
        })
    }

    /// Whether `resize(width, height, false)` would reallocate
    pub fn needs_resize(&self, width: u32, height: u32) -> bool {
        width != self.width || height != self.height || !self.has_targets()
    }

    /// Reallocate both targets at a new size
    ///
    /// A no-op returning `false` when the size is unchanged and `force` is
    /// not set. Otherwise the old targets are released first and `true` is
    /// returned once the new ones exist.
    pub fn resize(
        &mut self,
        device: &dyn GraphicsDevice,
        swapchain: &dyn Swapchain,
        width: u32,
        height: u32,
        force: bool,
    ) -> Result<bool> {
        if !force && !self.needs_resize(width, height) {
            return Ok(false);
        }

        self.release_targets();
        let (color, depth_stencil) =
            allocate_targets(device, swapchain, self.back_buffer_index, width, height, self.depth_format)?;
        self.color = Some(color);
        self.depth_stencil = Some(depth_stencil);
        self.width = width;
        self.height = height;

        engine_debug!("wiz3d::FrameBuffer", "Resized to {}x{}", width, height);
        Ok(true)
    }

    /// Drop both targets, leaving the frame buffer unusable until `resize`
    ///
    /// The swapchain cannot resize its buffers while a view over them is alive.
    pub fn release_targets(&mut self) {
        self.color = None;
        self.depth_stencil = None;
    }

    fn targets(&self) -> Result<(&Arc<dyn RenderTarget>, &Arc<dyn DepthStencilTarget>)> {
        match (&self.color, &self.depth_stencil) {
            (Some(color), Some(depth_stencil)) => Ok((color, depth_stencil)),
            _ => Err(Error::InvalidResource("frame buffer targets have been released".to_string())),
        }
    }

    /// Bind both targets to the output merger
    pub fn bind(&self, ctx: &mut dyn DeviceContext) -> Result<()> {
        let (color, depth_stencil) = self.targets()?;
        ctx.set_render_targets(color, depth_stencil)
    }

    /// Clear colour to `color`, depth to 1.0 and stencil to 0
    pub fn clear(&self, ctx: &mut dyn DeviceContext, color: [f32; 4]) -> Result<()> {
        let (target, depth_stencil) = self.targets()?;
        ctx.clear_render_target(target, color)?;
        ctx.clear_depth_stencil(depth_stencil, ClearFlags::DEPTH | ClearFlags::STENCIL, 1.0, 0)
    }

    pub fn has_targets(&self) -> bool {
        self.color.is_some() && self.depth_stencil.is_some()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn back_buffer_index(&self) -> u32 {
        self.back_buffer_index
    }

    pub fn color_target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.color.as_ref()
    }

    pub fn depth_stencil_target(&self) -> Option<&Arc<dyn DepthStencilTarget>> {
        self.depth_stencil.as_ref()
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.release_targets();
        self.counter.release();
    }
}

#[cfg(test)]
#[path = "frame_buffer_tests.rs"]
mod tests;
