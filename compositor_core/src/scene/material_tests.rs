/// Tests for Material

use glam::{Vec3, Vec4};
use crate::device::mock_device::{DeviceCommand, MockGraphicsDevice};
use crate::device::{GraphicsDevice, ShaderHandle, TextureHandle, UniformValue};
use crate::scene::{Material, MaterialTexture};

fn shader() -> ShaderHandle {
    ShaderHandle::new(40).unwrap()
}

// ============================================================================
// Tests: Parameters
// ============================================================================

#[test]
fn test_new_material_is_empty() {
    let material = Material::new(shader());

    assert_eq!(material.shader(), Some(shader()));
    assert_eq!(material.param_count(), 0);
    assert_eq!(material.texture_count(), 0);
    assert_eq!(Material::without_shader().shader(), None);
}

#[test]
fn test_set_uniform_converts_values() {
    let mut material = Material::new(shader());
    material.set_uniform("roughness", 0.5f32);
    material.set_uniform("albedo", Vec3::new(1.0, 0.5, 0.25));
    material.set_uniform("useNormalMap", true);

    assert_eq!(material.param_count(), 3);
    assert_eq!(material.uniform("roughness"), Some(UniformValue::Float(0.5)));
    assert_eq!(material.uniform("albedo"), Some(UniformValue::Vec3(Vec3::new(1.0, 0.5, 0.25))));
    assert_eq!(material.uniform("useNormalMap"), Some(UniformValue::Bool(true)));
    assert_eq!(material.uniform("metallic"), None);
}

#[test]
fn test_set_uniform_replaces_in_place() {
    let mut material = Material::new(shader());
    material.set_uniform("roughness", 0.5f32);
    material.set_uniform("tint", Vec4::ONE);
    material.set_uniform("roughness", 0.9f32);

    assert_eq!(material.param_count(), 2);
    assert_eq!(material.uniform("roughness"), Some(UniformValue::Float(0.9)));
}

#[test]
fn test_set_texture_replaces_slot() {
    let mut material = Material::new(shader());
    let first = TextureHandle::new(7).unwrap();
    let second = TextureHandle::new(8).unwrap();
    material.set_texture("albedoMap", 0, first);
    material.set_texture("albedoMap", 1, second);

    assert_eq!(material.texture_count(), 1);
    assert_eq!(material.texture("albedoMap"), Some(MaterialTexture { unit: 1, texture: second }));
    assert_eq!(material.texture("normalMap"), None);
}

// ============================================================================
// Tests: Apply
// ============================================================================

#[test]
fn test_apply_pushes_state_in_order() {
    let mut dev = MockGraphicsDevice::new();
    let albedo = TextureHandle::new(7).unwrap();
    let normal = TextureHandle::new(8).unwrap();
    let mut material = Material::new(shader());
    material.set_uniform("roughness", 0.5f32);
    material.set_texture("albedoMap", 0, albedo);
    material.set_uniform("metallic", 1.0f32);
    material.set_texture("normalMap", 1, normal);

    let applied = material.apply(&mut dev);

    assert_eq!(applied, Some(shader()));
    assert_eq!(dev.current_program(), Some(shader()));
    assert_eq!(dev.bound_texture(0), Some(albedo));
    assert_eq!(dev.bound_texture(1), Some(normal));
    assert_eq!(dev.uniform(shader(), "albedoMap"), Some(UniformValue::Int(0)));
    assert_eq!(dev.uniform(shader(), "normalMap"), Some(UniformValue::Int(1)));

    let names: Vec<_> = dev
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::SetUniform { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["roughness", "metallic", "albedoMap", "normalMap"]);
    assert_eq!(dev.commands()[0], DeviceCommand::UseProgram(shader()));
}

#[test]
fn test_apply_without_shader_touches_nothing() {
    let mut dev = MockGraphicsDevice::new();
    let mut material = Material::without_shader();
    material.set_uniform("roughness", 0.5f32);

    assert_eq!(material.apply(&mut dev), None);
    assert!(dev.commands().is_empty());
}

#[test]
fn test_set_shader_switches_program() {
    let mut dev = MockGraphicsDevice::new();
    let other = ShaderHandle::new(41).unwrap();
    let mut material = Material::without_shader();
    material.set_shader(Some(other));

    assert_eq!(material.apply(&mut dev), Some(other));
    dev.use_program(shader());
    material.set_shader(None);
    assert_eq!(material.apply(&mut dev), None);
    assert_eq!(dev.current_program(), Some(shader()));
}
