//! Mesh - the geometry handle accepted by `Renderer::submit`
//!
//! A mesh owns one vertex buffer, one 32-bit index buffer and an ordered
//! list of parts. Each part is one indexed draw over a range of the index
//! buffer; all parts share base vertex 0.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use crate::device::{DeviceContext, GraphicsDevice};
use crate::error::{Error, Result};
use crate::resource::geometry::{IndexBuffer, VertexBuffer};
use crate::engine_error;

/// Interleaved position / normal / texture coordinate vertex
///
/// Matches a `float3 POSITION, float3 NORMAL, float2 TEXCOORD0` input struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StandardVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl StandardVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// A range of the index buffer drawn with one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPart {
    pub index_offset: u32,
    pub index_count: u32,
}

pub struct Mesh {
    name: String,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    parts: Vec<MeshPart>,
}

impl Mesh {
    /// Upload importer output as a mesh
    ///
    /// An empty `parts` list means one part covering every index.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` when either array is empty, a part reaches
    /// past the index buffer, or an index names a vertex that does not exist.
    pub fn from_arrays<T: Pod>(
        device: &dyn GraphicsDevice,
        name: &str,
        vertices: &[T],
        indices: &[u32],
        parts: &[MeshPart],
    ) -> Result<Self> {
        let index_count = indices.len() as u64;
        if let Some(part) = parts
            .iter()
            .find(|p| p.index_offset as u64 + p.index_count as u64 > index_count)
        {
            engine_error!(
                "wiz3d::Mesh",
                "'{}': part {:?} exceeds {} indices",
                name, part, index_count
            );
            return Err(Error::InvalidResource(format!("mesh '{}' has a part outside its index range", name)));
        }

        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            engine_error!(
                "wiz3d::Mesh",
                "'{}': index {} out of range ({} vertices)",
                name, bad, vertices.len()
            );
            return Err(Error::InvalidResource(format!("mesh '{}' indexes past its vertices", name)));
        }

        let vertex_buffer = VertexBuffer::create_labeled(device, &format!("{}.vertices", name), vertices)?;
        let index_buffer = IndexBuffer::create_labeled(device, &format!("{}.indices", name), indices)?;

        let parts = if parts.is_empty() {
            vec![MeshPart { index_offset: 0, index_count: indices.len() as u32 }]
        } else {
            parts.to_vec()
        };

        Ok(Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            parts,
        })
    }

    /// Bind the buffers and issue one indexed draw per part
    ///
    /// Returns the number of draw calls issued.
    pub fn draw(&self, ctx: &mut dyn DeviceContext) -> Result<u32> {
        self.vertex_buffer.bind(ctx, 0)?;
        self.index_buffer.bind(ctx)?;
        for part in &self.parts {
            ctx.draw_indexed(part.index_count, part.index_offset, 0)?;
        }
        Ok(self.parts.len() as u32)
    }

    /// Triangles drawn by `draw` under a triangle-list topology
    pub fn triangle_count(&self) -> u32 {
        self.parts.iter().map(|p| p.index_count / 3).sum()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[MeshPart] {
        &self.parts
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("vertex_count", &self.vertex_buffer.vertex_count())
            .field("index_count", &self.index_buffer.index_count())
            .field("parts", &self.parts)
            .finish()
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
