/// Device module - backend-agnostic GPU traits and descriptors
///
/// A backend crate implements `GraphicsDevice`, `DeviceContext` and
/// `Swapchain` and hands them to the engine as a `DeviceChain`.

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod shader;
pub mod input_layout;
pub mod device_context;
pub mod swapchain;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use shader::*;
pub use input_layout::*;
pub use device_context::*;
pub use swapchain::*;

// Mock device chain for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
