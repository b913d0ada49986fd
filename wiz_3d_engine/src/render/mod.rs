/// Render module - frame buffer, resize hand-off and the frame pipeline

pub mod frame_buffer;
pub mod resize;
pub mod renderer;

pub use frame_buffer::{BackBufferCounter, FrameBuffer};
pub use resize::{ResizeEvent, ResizeNotifier};
pub use renderer::{Renderer, RendererConfig, RendererStats};
