/// ShaderLibrary - registry of loaded shader programs by name
///
/// Entries are created by `load`/`load_source`, never mutated, and only
/// removed all at once by `close`. Programs are handed out as
/// `Arc<ShaderProgram>` and are released when the last handle is dropped.

use std::path::Path;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::device::GraphicsDevice;
use crate::error::{Error, Result};
use crate::shader::program::ShaderProgram;
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Path recorded in errors for programs loaded from memory
const MEMORY_PATH: &str = "<memory>";

pub struct ShaderLibrary {
    programs: FxHashMap<String, Arc<ShaderProgram>>,
    closed: bool,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            programs: FxHashMap::default(),
            closed: false,
        }
    }

    /// Load the shader document at `path` and register it as `name`
    ///
    /// All-or-nothing: on any failure the registry is unchanged.
    ///
    /// # Errors
    ///
    /// `Error::ShaderLoad` wrapping the cause: `DuplicateName` when `name`
    /// is taken (checked before touching the file), `Io` when the file
    /// cannot be read, or any `ShaderProgram::load` error.
    pub fn load(&mut self, device: &dyn GraphicsDevice, name: &str, path: impl AsRef<Path>) -> Result<Arc<ShaderProgram>> {
        let path = path.as_ref();
        let path_text = path.display().to_string();

        let result = self.check_name(name).and_then(|()| {
            std::fs::read_to_string(path).map_err(|e| Error::Io {
                path: path_text.clone(),
                message: e.to_string(),
            })
        });
        let source = match result {
            Ok(source) => source,
            Err(cause) => return Err(Self::load_failed(name, &path_text, cause)),
        };

        self.register(device, name, &path_text, &source)
    }

    /// Register a program built from in-memory document text
    pub fn load_source(&mut self, device: &dyn GraphicsDevice, name: &str, source: &str) -> Result<Arc<ShaderProgram>> {
        if let Err(cause) = self.check_name(name) {
            return Err(Self::load_failed(name, MEMORY_PATH, cause));
        }
        self.register(device, name, MEMORY_PATH, source)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.programs.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn register(&mut self, device: &dyn GraphicsDevice, name: &str, path: &str, source: &str) -> Result<Arc<ShaderProgram>> {
        let program = match ShaderProgram::load(device, name, source) {
            Ok(program) => Arc::new(program),
            Err(cause) => return Err(Self::load_failed(name, path, cause)),
        };

        self.programs.insert(name.to_string(), program.clone());
        self.closed = false;
        engine_info!("wiz3d::ShaderLibrary", "Loaded shader '{}' from '{}'", name, path);
        Ok(program)
    }

    fn load_failed(name: &str, path: &str, cause: Error) -> Error {
        engine_error!("wiz3d::ShaderLibrary", "Failed to load shader '{}' from '{}': {}", name, path, cause);
        Error::ShaderLoad {
            name: name.to_string(),
            path: path.to_string(),
            cause: Box::new(cause),
        }
    }

    /// Program registered as `name`
    pub fn get(&self, name: &str) -> Result<Arc<ShaderProgram>> {
        self.programs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.programs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Drop every program and empty the registry
    ///
    /// Programs still held elsewhere stay alive until their last handle
    /// goes. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            engine_warn!("wiz3d::ShaderLibrary", "close() called on a closed library");
            return;
        }
        let count = self.programs.len();
        self.programs.clear();
        self.closed = true;
        engine_debug!("wiz3d::ShaderLibrary", "Closed, {} program(s) released", count);
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
