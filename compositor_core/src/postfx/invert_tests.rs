/// Tests for InvertEffect

use crate::device::mock_device::{DeviceCommand, MockGraphicsDevice};
use crate::device::{ShaderHandle, TextureFormat, UniformValue};
use crate::postfx::{Effect, EffectStack, InvertEffect, RecordingUi};
use crate::target::{RenderTarget, RenderTargetSpec};

#[test]
fn test_invert_single_pass() {
    let effect = InvertEffect::new(ShaderHandle::new(30).unwrap());
    assert_eq!(effect.name(), "InvertEffect");
    assert_eq!(effect.pass_count(), 1);
    assert!(!effect.requires_scene_render());
}

#[test]
fn test_invert_draws_input_into_output() {
    let (mock, shared) = MockGraphicsDevice::new_shared();
    let shader = ShaderHandle::new(30).unwrap();
    let scene = RenderTarget::new(&shared, "scene", RenderTargetSpec::color_depth(32, 32));
    let output = RenderTarget::new(&shared, "destination", RenderTargetSpec::color_only(32, 32, TextureFormat::R8G8B8A8_UNORM));
    let mut stack = EffectStack::new(&shared, TextureFormat::R16G16B16A16_SFLOAT).unwrap();
    stack.add_effect(Box::new(InvertEffect::new(shader)), true);
    mock.lock().unwrap().clear_commands();

    let stats = stack.process_stack(&shared, &scene, &output, 32, 32).unwrap();

    assert_eq!(stats.apply_calls, 1);
    let dev = mock.lock().unwrap();
    assert_eq!(dev.draw_call_count(), 1);
    assert_eq!(dev.uniform(shader, "inputTexture"), Some(UniformValue::Int(0)));
    assert_eq!(dev.bound_texture(0), scene.color_attachment(0));
    assert!(dev.commands().contains(&DeviceCommand::UseProgram(shader)));
    assert_ne!(dev.texture_signature(output.color_attachment(0).unwrap()), Some(0));
}

#[test]
fn test_invert_parameter_ui() {
    let mut effect = InvertEffect::new(ShaderHandle::new(30).unwrap());
    let mut ui = RecordingUi::new();

    effect.draw_parameter_ui(&mut ui);

    assert_eq!(ui.texts(), &["No parameters"]);
    assert!(ui.widgets().is_empty());
}
