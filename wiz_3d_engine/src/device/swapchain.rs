/// Swapchain trait and render target traits

use std::sync::Arc;
use crate::error::Result;

/// Depth-stencil target format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum DepthFormat {
    /// 24-bit depth, 8-bit stencil
    D24_UNORM_S8_UINT,
    /// 32-bit float depth, 8-bit stencil (+24 unused bits)
    D32_FLOAT_S8X24_UINT,
}

/// Colour render target view over one swapchain back-buffer
pub trait RenderTarget: Send + Sync {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Physical back-buffer index this view was created from
    fn back_buffer_index(&self) -> u32;
}

/// Depth-stencil target (texture + view)
pub trait DepthStencilTarget: Send + Sync {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Depth-stencil format
    fn format(&self) -> DepthFormat;
}

/// Swapchain for presenting rendered images to a window surface
///
/// Owns the physical back-buffers. Views handed out by
/// `back_buffer_target` must all be dropped before `resize_buffers`.
pub trait Swapchain: Send + Sync {
    /// Number of physical back-buffers
    fn buffer_count(&self) -> u32;

    /// Current width of the back-buffers in pixels
    fn width(&self) -> u32;

    /// Current height of the back-buffers in pixels
    fn height(&self) -> u32;

    /// Create a render target view over back-buffer `index`
    fn back_buffer_target(&self, index: u32) -> Result<Arc<dyn RenderTarget>>;

    /// Resize every back-buffer (e.g. after a window resize)
    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<()>;

    /// Present the current back-buffer to the surface
    ///
    /// # Arguments
    ///
    /// * `sync_interval` - 0 for immediate, N to wait for N vertical blanks
    fn present(&mut self, sync_interval: u32) -> Result<()>;
}
