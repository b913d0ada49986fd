/// ShaderProgram - a compiled, bindable vertex + pixel program
///
/// Loading runs the whole pipeline: split the document into stages,
/// reflect the interface, compile both stages through the device,
/// create the input layout, then allocate one uniform buffer per block.

use std::sync::{Arc, Mutex};
use bytemuck::Pod;
use crate::device::{
    Buffer, BufferDesc, BufferUsage, DeviceContext, GraphicsDevice, InputLayout,
    Shader, ShaderDesc, ShaderStage, Texture, VertexAttribute,
};
use crate::error::{Error, Result};
use crate::shader::preprocessor::{preprocess, StageSource};
use crate::shader::reflection::{
    reflect, ResourceBinding, ShaderReflection, UniformBlock, ENTRY_POINT,
};
use crate::engine_debug;

/// Uniform buffers are allocated in multiples of this many bytes
pub const UNIFORM_ALIGNMENT: u32 = 16;

/// Allocation size of a uniform buffer holding `size` bytes
pub fn uniform_allocation_size(size: u32) -> u64 {
    let alignment = UNIFORM_ALIGNMENT as u64;
    (size as u64).div_ceil(alignment).max(1) * alignment
}

/// A reflected uniform block and the GPU buffer backing it
pub struct UniformBinding {
    pub block: UniformBlock,
    pub slot: u32,
    pub buffer: Arc<dyn Buffer>,
}

/// Bound texture per reflected resource, parallel to `ShaderReflection::resources`
struct ResourceSlots {
    slots: Vec<u32>,
    textures: Mutex<Vec<Option<Arc<dyn Texture>>>>,
}

pub struct ShaderProgram {
    name: String,
    vertex_shader: Arc<dyn Shader>,
    pixel_shader: Arc<dyn Shader>,
    input_layout: Arc<dyn InputLayout>,
    reflection: ShaderReflection,
    /// Vertex-stage bindings first, then pixel-stage, each in declaration order
    uniforms: Vec<UniformBinding>,
    resources: ResourceSlots,
}

fn resolved_slot(name: &str, index: Option<u32>) -> Result<u32> {
    index.ok_or_else(|| Error::InvalidResource(format!("'{}' has no resolved slot", name)))
}

fn compile_stage(device: &dyn GraphicsDevice, name: &str, stage: &StageSource) -> Result<Arc<dyn Shader>> {
    // Keep compiler diagnostics on document line numbers
    let source = format!("#line {}\n{}", stage.first_line, stage.text);
    device.compile_shader(&ShaderDesc {
        source: &source,
        stage: stage.stage,
        entry_point: ENTRY_POINT,
        profile: stage.stage.profile(),
        label: name,
    })
}

impl ShaderProgram {
    /// Build a program from a shader document
    ///
    /// # Arguments
    ///
    /// * `device` - Device that compiles the stages and allocates buffers
    /// * `name` - Program name (used as the debug label of its shaders)
    /// * `source` - Document text with `#type vertex` and `#type pixel` blocks
    ///
    /// # Errors
    ///
    /// Any preprocessing, reflection, compilation or allocation failure.
    /// Nothing is kept on failure.
    pub fn load(device: &dyn GraphicsDevice, name: &str, source: &str) -> Result<Self> {
        let sources = preprocess(source)?;
        let reflection = reflect(&sources)?;

        let vertex_shader = compile_stage(device, name, &sources.vertex)?;
        let pixel_shader = compile_stage(device, name, &sources.pixel)?;
        let input_layout = device.create_input_layout(&vertex_shader, &reflection.attributes)?;

        let mut uniforms = Vec::with_capacity(reflection.uniform_blocks.len());
        for block in &reflection.uniform_blocks {
            let slot = resolved_slot(&block.name, block.slot.index())?;
            let buffer = device.create_buffer(
                &BufferDesc {
                    label: block.name.clone(),
                    size: uniform_allocation_size(block.size),
                    usage: BufferUsage::Uniform,
                },
                None,
            )?;
            uniforms.push(UniformBinding { block: block.clone(), slot, buffer });
        }

        let slots = reflection
            .resources
            .iter()
            .map(|r| resolved_slot(&r.name, r.slot.index()))
            .collect::<Result<Vec<u32>>>()?;
        let resources = ResourceSlots {
            textures: Mutex::new(vec![None; slots.len()]),
            slots,
        };

        engine_debug!(
            "wiz3d::ShaderProgram",
            "Loaded '{}': {} attributes, {} uniform blocks, {} resources",
            name,
            reflection.attributes.len(),
            uniforms.len(),
            reflection.resources.len()
        );

        Ok(Self {
            name: name.to_string(),
            vertex_shader,
            pixel_shader,
            input_layout,
            reflection,
            uniforms,
            resources,
        })
    }

    /// Make this program current on `ctx`
    ///
    /// Order: input layout, vertex-stage uniform buffers, pixel-stage
    /// uniform buffers, textures, vertex shader, pixel shader.
    pub fn bind(&self, ctx: &mut dyn DeviceContext) -> Result<()> {
        ctx.set_input_layout(&self.input_layout)?;

        for stage in ShaderStage::ALL {
            for uniform in self.uniforms.iter().filter(|u| u.block.stage == stage) {
                ctx.set_uniform_buffer(stage, uniform.slot, &uniform.buffer)?;
            }
        }

        let textures = self
            .resources
            .textures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for ((binding, slot), texture) in self
            .reflection
            .resources
            .iter()
            .zip(&self.resources.slots)
            .zip(textures.iter())
        {
            ctx.set_shader_resource(binding.stage, *slot, texture.as_ref())?;
        }

        ctx.set_shader(&self.vertex_shader)?;
        ctx.set_shader(&self.pixel_shader)?;
        Ok(())
    }

    /// Upload raw bytes into the uniform block called `name`
    ///
    /// Vertex-stage blocks are searched before pixel-stage blocks; the
    /// first match receives the data. Data shorter than the allocation is
    /// zero-padded. The layout of `data` is not checked.
    ///
    /// # Errors
    ///
    /// * `Error::UnknownBlock` - no block has this name
    /// * `Error::InvalidResource` - `data` is larger than the block's buffer
    pub fn set_uniform(&self, ctx: &mut dyn DeviceContext, name: &str, data: &[u8]) -> Result<()> {
        let uniform = self
            .uniform_binding(name)
            .ok_or_else(|| Error::UnknownBlock(name.to_string()))?;

        let capacity = uniform.buffer.desc().size as usize;
        if data.len() > capacity {
            return Err(Error::InvalidResource(format!(
                "{} bytes do not fit uniform block '{}' ({} bytes)",
                data.len(),
                name,
                capacity
            )));
        }

        if data.len() == capacity {
            ctx.update_buffer(&uniform.buffer, data)
        } else {
            let mut padded = vec![0u8; capacity];
            padded[..data.len()].copy_from_slice(data);
            ctx.update_buffer(&uniform.buffer, &padded)
        }
    }

    /// Upload a plain-old-data value into the uniform block called `name`
    pub fn set_uniform_value<T: Pod>(&self, ctx: &mut dyn DeviceContext, name: &str, value: &T) -> Result<()> {
        self.set_uniform(ctx, name, bytemuck::bytes_of(value))
    }

    /// Attach `texture` to every resource binding called `name`
    ///
    /// Returns the number of bindings updated. Takes effect at the next `bind`.
    pub fn set_resource(&self, name: &str, texture: Arc<dyn Texture>) -> usize {
        let mut textures = self
            .resources
            .textures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut updated = 0;
        for (binding, bound) in self.reflection.resources.iter().zip(textures.iter_mut()) {
            if binding.name == name {
                *bound = Some(texture.clone());
                updated += 1;
            }
        }
        updated
    }

    /// First uniform binding called `name`, vertex stage first
    pub fn uniform_binding(&self, name: &str) -> Option<&UniformBinding> {
        self.uniforms.iter().find(|u| u.block.name == name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.reflection.attributes
    }

    pub fn uniform_blocks(&self) -> &[UniformBlock] {
        &self.reflection.uniform_blocks
    }

    pub fn resources(&self) -> &[ResourceBinding] {
        &self.reflection.resources
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub fn vertex_shader(&self) -> &Arc<dyn Shader> {
        &self.vertex_shader
    }

    pub fn pixel_shader(&self) -> &Arc<dyn Shader> {
        &self.pixel_shader
    }

    pub fn input_layout(&self) -> &Arc<dyn InputLayout> {
        &self.input_layout
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("reflection", &self.reflection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
