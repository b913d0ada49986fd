/// Resource module - GPU-resident geometry, meshes and textures

pub mod geometry;
pub mod mesh;
pub mod texture;

pub use geometry::{IndexBuffer, VertexBuffer};
pub use mesh::{Mesh, MeshPart, StandardVertex};
pub use texture::{create_texture, ImageData};
