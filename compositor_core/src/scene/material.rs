/// Surface material: a shader program plus named uniform values and
/// sampler bindings
///
/// Values are applied in insertion order; setting an existing name
/// replaces its value in place.

use rustc_hash::FxHashMap;
use crate::device::{GraphicsDevice, ShaderHandle, TextureHandle, UniformValue};

/// A texture bound to a named sampler at a fixed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialTexture {
    pub unit: u32,
    pub texture: TextureHandle,
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    shader: Option<ShaderHandle>,
    params: Vec<(String, UniformValue)>,
    param_names: FxHashMap<String, usize>,
    textures: Vec<(String, MaterialTexture)>,
    texture_names: FxHashMap<String, usize>,
}

impl Material {
    pub fn new(shader: ShaderHandle) -> Self {
        Self { shader: Some(shader), ..Default::default() }
    }

    /// Material with no program yet (skipped by the opaque pass)
    pub fn without_shader() -> Self {
        Self::default()
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn set_shader(&mut self, shader: Option<ShaderHandle>) {
        self.shader = shader;
    }

    // ===== PARAMETERS =====

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.param_names.get(name) {
            Some(&index) => self.params[index].1 = value,
            None => {
                self.param_names.insert(name.to_string(), self.params.len());
                self.params.push((name.to_string(), value));
            }
        }
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.param_names.get(name).map(|&index| self.params[index].1)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    // ===== TEXTURES =====

    pub fn set_texture(&mut self, name: &str, unit: u32, texture: TextureHandle) {
        let slot = MaterialTexture { unit, texture };
        match self.texture_names.get(name) {
            Some(&index) => self.textures[index].1 = slot,
            None => {
                self.texture_names.insert(name.to_string(), self.textures.len());
                self.textures.push((name.to_string(), slot));
            }
        }
    }

    pub fn texture(&self, name: &str) -> Option<MaterialTexture> {
        self.texture_names.get(name).map(|&index| self.textures[index].1)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== APPLY =====

    /// Select the program and push every value and sampler binding
    ///
    /// Returns the program, or `None` (and touches nothing) without one.
    pub fn apply(&self, device: &mut dyn GraphicsDevice) -> Option<ShaderHandle> {
        let shader = self.shader?;
        device.use_program(shader);
        for (name, value) in &self.params {
            device.set_uniform(shader, name, *value);
        }
        for (name, slot) in &self.textures {
            device.bind_texture(slot.unit, Some(slot.texture));
            device.set_uniform(shader, name, UniformValue::Int(slot.unit as i32));
        }
        Some(shader)
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
