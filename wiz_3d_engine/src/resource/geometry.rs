//! Immutable vertex and index buffers created from host arrays
//!
//! Both buffers use default (GPU-only) usage and have no update API: to
//! change geometry, create new buffers.

use std::sync::Arc;
use bytemuck::Pod;
use crate::device::{Buffer, BufferDesc, BufferUsage, DeviceContext, GraphicsDevice, IndexFormat};
use crate::error::{Error, Result};
use crate::engine_error;

// ============================================================================
// VERTEX BUFFER
// ============================================================================

pub struct VertexBuffer {
    buffer: Arc<dyn Buffer>,
    /// Bytes per vertex (`size_of::<T>()` of the creating array)
    stride: u32,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Create a vertex buffer holding `vertices`
    pub fn create<T: Pod>(device: &dyn GraphicsDevice, vertices: &[T]) -> Result<Self> {
        Self::create_labeled(device, "VertexBuffer", vertices)
    }

    /// Create a vertex buffer with a debug label
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` for an empty array or a zero-sized vertex type.
    pub fn create_labeled<T: Pod>(device: &dyn GraphicsDevice, label: &str, vertices: &[T]) -> Result<Self> {
        let stride = std::mem::size_of::<T>();
        if vertices.is_empty() || stride == 0 {
            engine_error!("wiz3d::VertexBuffer", "'{}': cannot create a buffer from no vertex data", label);
            return Err(Error::InvalidResource(format!("vertex buffer '{}' has no data", label)));
        }

        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = device.create_buffer(
            &BufferDesc {
                label: label.to_string(),
                size: bytes.len() as u64,
                usage: BufferUsage::Vertex,
            },
            Some(bytes),
        )?;

        Ok(Self {
            buffer,
            stride: stride as u32,
            vertex_count: vertices.len() as u32,
        })
    }

    /// Bind into input-assembler slot `slot` at offset 0
    pub fn bind(&self, ctx: &mut dyn DeviceContext, slot: u32) -> Result<()> {
        ctx.set_vertex_buffer(slot, &self.buffer, self.stride, 0)
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }
}

// ============================================================================
// INDEX BUFFER
// ============================================================================

pub struct IndexBuffer {
    buffer: Arc<dyn Buffer>,
    index_count: u32,
}

impl IndexBuffer {
    /// Create a 32-bit index buffer holding `indices`
    pub fn create(device: &dyn GraphicsDevice, indices: &[u32]) -> Result<Self> {
        Self::create_labeled(device, "IndexBuffer", indices)
    }

    /// Create an index buffer with a debug label
    pub fn create_labeled(device: &dyn GraphicsDevice, label: &str, indices: &[u32]) -> Result<Self> {
        if indices.is_empty() {
            engine_error!("wiz3d::IndexBuffer", "'{}': cannot create a buffer from no index data", label);
            return Err(Error::InvalidResource(format!("index buffer '{}' has no data", label)));
        }

        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = device.create_buffer(
            &BufferDesc {
                label: label.to_string(),
                size: bytes.len() as u64,
                usage: BufferUsage::Index,
            },
            Some(bytes),
        )?;

        Ok(Self {
            buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Bind into the input assembler as `R32_UINT` at offset 0
    pub fn bind(&self, ctx: &mut dyn DeviceContext) -> Result<()> {
        ctx.set_index_buffer(&self.buffer, self.format(), 0)
    }

    pub fn format(&self) -> IndexFormat {
        IndexFormat::R32_UINT
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
