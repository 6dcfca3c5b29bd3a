/// Tests for FogEffect

use std::sync::{Arc, Mutex};
use glam::Vec3;
use crate::device::mock_device::{DeviceCommand, MockGraphicsDevice};
use crate::device::{ShaderHandle, SharedDevice, TextureFormat, UniformValue};
use crate::error::Result;
use crate::postfx::{
    ApplyContext, Effect, FogDebugMode, FogEffect, FogMode, FullscreenQuad, RecordingUi, UiEdit,
};
use crate::target::{RenderTarget, RenderTargetSpec};

const WIDTH: u32 = 96;
const HEIGHT: u32 = 48;
const CHAIN_COLOR: u64 = 0x3333;

fn fog_shader() -> ShaderHandle {
    ShaderHandle::new(20).unwrap()
}

fn chained_input(shared: &SharedDevice, mock: &Arc<Mutex<MockGraphicsDevice>>) -> RenderTarget {
    let input = RenderTarget::new(
        shared,
        "postfx_scratch_0",
        RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R16G16B16A16_SFLOAT),
    );
    mock.lock()
        .unwrap()
        .set_texture_signature(input.color_attachment(0).unwrap(), CHAIN_COLOR);
    input
}

fn run(
    fog: &mut FogEffect,
    mock: &Arc<Mutex<MockGraphicsDevice>>,
    scene: &RenderTarget,
    input: &RenderTarget,
    output: &RenderTarget,
) -> Result<()> {
    let mut dev = mock.lock().unwrap();
    let quad = FullscreenQuad::new(&mut *dev)?;
    let mut ctx = ApplyContext { device: &mut *dev, quad: &quad, scene, pass_index: 0, pass_count: 1 };
    let result = fog.apply(&mut ctx, input, output, WIDTH, HEIGHT);
    quad.destroy(&mut *dev);
    result
}

// ============================================================================
// Tests: Defaults
// ============================================================================

#[test]
fn test_fog_defaults() {
    let fog = FogEffect::new(fog_shader());

    assert_eq!(fog.name(), "FogEffect");
    assert_eq!(fog.pass_count(), 1);
    assert!(!fog.requires_scene_render());
    assert_eq!(fog.color, Vec3::new(0.5, 0.6, 0.7));
    assert_eq!(fog.density, 0.05);
    assert_eq!((fog.start, fog.end), (10.0, 100.0));
    assert_eq!((fog.near_plane, fog.far_plane), (0.1, 1000.0));
    assert_eq!(fog.mode, FogMode::Linear);
    assert_eq!(fog.debug_mode, FogDebugMode::Normal);
}

// ============================================================================
// Tests: Apply
// ============================================================================

#[test]
fn test_fog_samples_chain_color_and_scene_depth() {
    let (mock, shared) = MockGraphicsDevice::new_shared();
    let scene = RenderTarget::new(&shared, "scene", RenderTargetSpec::color_depth(WIDTH, HEIGHT).with_sampleable_depth());
    let input = chained_input(&shared, &mock);
    let output = RenderTarget::new(&shared, "destination", RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R8G8B8A8_UNORM));
    let mut fog = FogEffect::new(fog_shader());
    mock.lock().unwrap().clear_commands();

    run(&mut fog, &mock, &scene, &input, &output).unwrap();

    let dev = mock.lock().unwrap();
    let shader = fog_shader();
    assert_eq!(dev.draw_call_count(), 1);
    assert_eq!(dev.bound_texture(0), input.color_attachment(0));
    assert_eq!(dev.bound_texture(1), scene.depth_texture());
    assert_eq!(dev.uniform(shader, "inputTexture"), Some(UniformValue::Int(0)));
    assert_eq!(dev.uniform(shader, "depthTexture"), Some(UniformValue::Int(1)));
    assert_eq!(dev.uniform(shader, "fogColor"), Some(UniformValue::Vec3(Vec3::new(0.5, 0.6, 0.7))));
    assert_eq!(dev.uniform(shader, "fogDensity"), Some(UniformValue::Float(0.05)));
    assert_eq!(dev.uniform(shader, "fogStart"), Some(UniformValue::Float(10.0)));
    assert_eq!(dev.uniform(shader, "fogEnd"), Some(UniformValue::Float(100.0)));
    assert_eq!(dev.uniform(shader, "fogMode"), Some(UniformValue::Int(0)));
    assert_eq!(dev.uniform(shader, "debugMode"), Some(UniformValue::Int(0)));
    assert_eq!(dev.uniform(shader, "nearPlane"), Some(UniformValue::Float(0.1)));
    assert_eq!(dev.uniform(shader, "farPlane"), Some(UniformValue::Float(1000.0)));
    assert!(dev.commands().iter().any(|c| matches!(
        c,
        DeviceCommand::DrawArrays { framebuffer, program, .. }
            if *framebuffer == output.handle() && *program == Some(shader)
    )));
}

#[test]
fn test_fog_mode_uniforms_follow_enums() {
    let (mock, shared) = MockGraphicsDevice::new_shared();
    let scene = RenderTarget::new(&shared, "scene", RenderTargetSpec::color_depth(WIDTH, HEIGHT).with_sampleable_depth());
    let input = chained_input(&shared, &mock);
    let output = RenderTarget::new(&shared, "destination", RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R8G8B8A8_UNORM));
    let mut fog = FogEffect::new(fog_shader());
    fog.mode = FogMode::ExponentialSquared;
    fog.debug_mode = FogDebugMode::FogFactor;

    run(&mut fog, &mock, &scene, &input, &output).unwrap();

    let dev = mock.lock().unwrap();
    assert_eq!(dev.uniform(fog_shader(), "fogMode"), Some(UniformValue::Int(2)));
    assert_eq!(dev.uniform(fog_shader(), "debugMode"), Some(UniformValue::Int(3)));
}

#[test]
fn test_fog_without_depth_copies_input() {
    let (mock, shared) = MockGraphicsDevice::new_shared();
    let scene = RenderTarget::new(&shared, "scene", RenderTargetSpec::color_depth(WIDTH, HEIGHT));
    let input = chained_input(&shared, &mock);
    let output = RenderTarget::new(&shared, "destination", RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R8G8B8A8_UNORM));
    let mut fog = FogEffect::new(fog_shader());
    mock.lock().unwrap().clear_commands();

    run(&mut fog, &mock, &scene, &input, &output).unwrap();
    run(&mut fog, &mock, &scene, &input, &output).unwrap();

    let dev = mock.lock().unwrap();
    assert_eq!(dev.draw_call_count(), 0);
    assert_eq!(dev.texture_signature(output.color_attachment(0).unwrap()), Some(CHAIN_COLOR));
}

// ============================================================================
// Tests: Parameter UI
// ============================================================================

#[test]
fn test_fog_ui_linear_mode_widgets() {
    let mut fog = FogEffect::new(fog_shader());
    let mut ui = RecordingUi::new();

    fog.draw_parameter_ui(&mut ui);

    assert_eq!(
        ui.widgets(),
        &["Fog Settings", "Debug Mode", "Fog Mode", "Fog Color", "Fog Start", "Fog End", "Near Plane", "Far Plane"]
    );
    assert!(ui.texts().iter().any(|t| t == "Camera Parameters"));
}

#[test]
fn test_fog_ui_edits() {
    let mut fog = FogEffect::new(fog_shader());
    let mut ui = RecordingUi::new();
    ui.edit("Fog Mode", UiEdit::Index(1));
    ui.edit("Debug Mode", UiEdit::Index(2));
    ui.edit("Fog Density", UiEdit::Float(0.9));
    ui.edit("Fog Color", UiEdit::Color(Vec3::ONE));
    ui.edit("Far Plane", UiEdit::Float(500.0));

    fog.draw_parameter_ui(&mut ui);

    assert_eq!(fog.mode, FogMode::Exponential);
    assert_eq!(fog.debug_mode, FogDebugMode::LinearDepth);
    assert_eq!(fog.density, 0.5);
    assert_eq!(fog.color, Vec3::ONE);
    assert_eq!(fog.far_plane, 500.0);
    assert!(ui.widgets().iter().any(|w| w == "Fog Density"));
    assert!(!ui.widgets().iter().any(|w| w == "Fog Start"));
}
