/*!
# Wiz 3D Engine

Rendering core of the Wiz3D engine.

Shader documents carrying both stages are split, reflected (vertex layout,
uniform blocks, texture slots) and compiled into `ShaderProgram`s. A
`Renderer` drives the frame: resize handling, clear, camera upload, a FIFO
draw queue and present. Backends plug in through the `device` traits and
hand the engine a `DeviceChain`.

## Architecture

- **RenderContext**: owns one renderer and one shader library
- **Renderer**: frame lifecycle and draw queue
- **ShaderLibrary / ShaderProgram**: named, reflected shader programs
- **FrameBuffer**: colour and depth-stencil targets on a back-buffer
- **Mesh / VertexBuffer / IndexBuffer**: immutable geometry
- **GraphicsDevice / DeviceContext / Swapchain**: backend traits
*/

pub mod error;
pub mod log;
pub mod device;
pub mod shader;
pub mod resource;
pub mod render;
pub mod camera;
pub mod context;
pub mod utils;

// Main wiz3d namespace module
pub mod wiz3d {
    // Error types
    pub use crate::error::{Error, Result, SlotKind};

    // Context owning the renderer and the shader library
    pub use crate::context::RenderContext;

    // Logging sub-module (types and sink only; engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    pub mod device {
        pub use crate::device::*;
    }

    pub mod shader {
        pub use crate::shader::*;
    }

    pub mod render {
        pub use crate::render::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }
}

// Re-export math library at crate root
pub use glam;
