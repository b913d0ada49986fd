//! Error types for the Wiz3D engine
//!
//! This module defines the single error type used throughout the engine:
//! backend failures, shader loading and reflection failures, and
//! registry lookups.

use std::fmt;
use crate::device::ShaderStage;

/// Result type for Wiz3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of binding slot a register annotation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Uniform (constant) buffer slot, `register(bN)`
    UniformBlock,
    /// Texture resource slot, `register(tN)`
    Resource,
}

impl SlotKind {
    /// Register prefix character for this kind
    pub fn prefix(&self) -> char {
        match self {
            SlotKind::UniformBlock => 'b',
            SlotKind::Resource => 't',
        }
    }
}

/// Wiz3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Direct3D, Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or invalid use of a resource
    InvalidResource(String),

    /// Initialization failed (context, renderer, subsystems)
    InitializationFailed(String),

    /// Reading a file failed
    Io { path: String, message: String },

    /// A required stage block is absent from a shader document
    MissingStage(ShaderStage),

    /// A stage marker names a stage keyword we don't know
    UnknownStage(String),

    /// A type token is not in the shader type table
    UnknownType { type_name: String, line: usize },

    /// No uniform block with this name exists in the program
    UnknownBlock(String),

    /// Two uniform blocks with the same name in one stage
    DuplicateBlock { stage: ShaderStage, name: String },

    /// Two declarations claim the same slot in one stage
    DuplicateSlot { stage: ShaderStage, kind: SlotKind, slot: u32 },

    /// No free slot left to assign an unannotated declaration
    SlotsExhausted { stage: ShaderStage, kind: SlotKind },

    /// A `register(...)` annotation could not be parsed
    MalformedSlotAnnotation { name: String, annotation: String, line: usize },

    /// Shader text does not have the shape reflection expects
    ShaderSyntax { line: usize, message: String },

    /// A shader program with this name is already registered
    DuplicateName(String),

    /// No shader program with this name is registered
    NotFound(String),

    /// Loading a named shader failed
    ShaderLoad { name: String, path: String, cause: Box<Error> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::Io { path, message } => write!(f, "Failed to read '{}': {}", path, message),
            Error::MissingStage(stage) => write!(f, "Missing {:?} stage block", stage),
            Error::UnknownStage(keyword) => write!(f, "Unknown stage keyword '{}'", keyword),
            Error::UnknownType { type_name, line } => {
                write!(f, "Unknown type '{}' (line {})", type_name, line)
            }
            Error::UnknownBlock(name) => write!(f, "Unknown uniform block '{}'", name),
            Error::DuplicateBlock { stage, name } => {
                write!(f, "Uniform block '{}' declared twice in {:?} stage", name, stage)
            }
            Error::DuplicateSlot { stage, kind, slot } => {
                write!(f, "Slot {}{} used twice in {:?} stage", kind.prefix(), slot, stage)
            }
            Error::SlotsExhausted { stage, kind } => {
                write!(f, "No free '{}' slot left in {:?} stage", kind.prefix(), stage)
            }
            Error::MalformedSlotAnnotation { name, annotation, line } => write!(
                f,
                "Malformed slot annotation '{}' on '{}' (line {})",
                annotation, name, line
            ),
            Error::ShaderSyntax { line, message } => {
                write!(f, "Shader syntax error (line {}): {}", line, message)
            }
            Error::DuplicateName(name) => {
                write!(f, "A shader named '{}' has already been loaded", name)
            }
            Error::NotFound(name) => write!(f, "No shader named '{}'", name),
            Error::ShaderLoad { name, path, cause } => {
                write!(f, "Failed to load shader '{}' from '{}': {}", name, path, cause)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ShaderLoad { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
