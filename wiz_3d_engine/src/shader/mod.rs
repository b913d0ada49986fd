/// Shader module - document preprocessing, reflection, programs and the library

pub mod lexer;
pub mod preprocessor;
pub mod types;
pub mod reflection;
pub mod program;
pub mod library;

pub use preprocessor::{preprocess, StageSource, StageSources};
pub use types::ShaderType;
pub use reflection::{
    reflect, reflect_resources, reflect_uniform_blocks, reflect_vertex_layout,
    ResourceBinding, ShaderReflection, SlotBinding, UniformBlock,
    RESOURCE_SLOT_COUNT, UNIFORM_SLOT_COUNT,
};
pub use program::{ShaderProgram, UniformBinding};
pub use library::ShaderLibrary;
