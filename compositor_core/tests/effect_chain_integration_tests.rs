//! Integration tests for the effect stack with the built-in effects
//!
//! These tests verify chain routing, failure fallbacks and the parameter UI
//! through the public API. No GPU required.
//!
//! Run with: cargo test --features mock-device --test effect_chain_integration_tests

use std::sync::{Arc, Mutex};
use compositor_core::compositor::device::mock_device::MockGraphicsDevice;
use compositor_core::compositor::device::{ShaderHandle, SharedDevice, TextureFormat, UniformValue};
use compositor_core::compositor::postfx::{
    BloomDebugMode, BloomEffect, EffectStack, FogEffect, InvertEffect, RecordingUi, UiEdit,
};
use compositor_core::compositor::target::{RenderTarget, RenderTargetSpec};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 144;
const SCENE_COLOR: u64 = 0x5EED;
const BRIGHT_PASS: u64 = 0xB417;

// ============================================================================
// HELPERS
// ============================================================================

struct Chain {
    mock: Arc<Mutex<MockGraphicsDevice>>,
    device: SharedDevice,
    scene: RenderTarget,
    output: RenderTarget,
    stack: EffectStack,
}

impl Chain {
    fn new(scene_spec: RenderTargetSpec) -> Self {
        let (mock, device) = MockGraphicsDevice::new_shared();
        let scene = RenderTarget::new(&device, "scene", scene_spec);
        let output = RenderTarget::new(
            &device,
            "viewport",
            RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R8G8B8A8_UNORM),
        );
        {
            let mut dev = mock.lock().unwrap();
            dev.set_texture_signature(scene.color_attachment(0).unwrap(), SCENE_COLOR);
            if let Some(bright) = scene.color_attachment(1) {
                dev.set_texture_signature(bright, BRIGHT_PASS);
            }
        }
        let stack = EffectStack::new(&device, TextureFormat::R16G16B16A16_SFLOAT).unwrap();
        Self { mock, device, scene, output, stack }
    }

    /// Scene with a bright-pass attachment and sampleable depth
    fn with_full_scene() -> Self {
        Self::new(
            RenderTargetSpec::color_depth(WIDTH, HEIGHT)
                .with_color_attachments(2)
                .with_sampleable_depth(),
        )
    }

    fn bloom(&self) -> BloomEffect {
        BloomEffect::new(&self.device, ShaderHandle::new(10).unwrap(), ShaderHandle::new(11).unwrap())
    }

    fn signature(&self, target: &RenderTarget) -> Option<u64> {
        let dev = self.mock.lock().unwrap();
        target.color_attachment(0).and_then(|texture| dev.texture_signature(texture))
    }
}

fn fog_shader() -> ShaderHandle {
    ShaderHandle::new(20).unwrap()
}

fn invert_shader() -> ShaderHandle {
    ShaderHandle::new(30).unwrap()
}

// ============================================================================
// CHAIN TESTS
// ============================================================================

#[test]
fn test_integration_bloom_fog_invert_chain() {
    let mut chain = Chain::with_full_scene();
    let bloom = chain.bloom();
    chain.stack.add_effect(Box::new(bloom), true);
    chain.stack.add_effect(Box::new(FogEffect::new(fog_shader())), true);
    chain.stack.add_effect(Box::new(InvertEffect::new(invert_shader())), true);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    assert_eq!(stats.apply_calls, 10 + 1 + 1);
    assert_eq!(stats.effects_run, 3);
    assert_eq!(stats.failed_effects, 0);
    assert_eq!(chain.signature(&chain.scene), Some(SCENE_COLOR));
    assert_ne!(chain.signature(&chain.output), Some(0));

    let dev = chain.mock.lock().unwrap();
    // Fog sampled the scene depth, not a scratch target
    assert_eq!(dev.uniform(fog_shader(), "depthTexture"), Some(UniformValue::Int(1)));
    assert_eq!(dev.uniform(invert_shader(), "inputTexture"), Some(UniformValue::Int(0)));
}

#[test]
fn test_integration_bloom_reads_scene_after_another_effect() {
    let mut chain = Chain::with_full_scene();
    let bloom = chain.bloom();
    chain.stack.add_effect(Box::new(InvertEffect::new(invert_shader())), true);
    chain.stack.add_effect(Box::new(bloom), true);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    assert_eq!(stats.effects_run, 2);
    assert_eq!(stats.failed_effects, 0);
    let dev = chain.mock.lock().unwrap();
    assert_eq!(dev.uniform(ShaderHandle::new(11).unwrap(), "sceneTexture"), Some(UniformValue::Int(0)));
    assert_eq!(dev.bound_texture(0), chain.scene.color_attachment(0));
}

#[test]
fn test_integration_failed_last_effect_presents_chain_image() {
    let mut chain = Chain::new(RenderTargetSpec::color_depth(WIDTH, HEIGHT));
    let bloom = chain.bloom();
    chain.stack.add_effect(Box::new(InvertEffect::new(invert_shader())), true);
    chain.stack.add_effect(Box::new(bloom), true);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    // No bright-pass attachment: bloom fails and the inverted image is presented
    assert_eq!(stats.failed_effects, 1);
    assert_eq!(stats.effects_run, 1);
    let inverted = chain.signature(&chain.stack.scratch_targets()[0]);
    assert_ne!(inverted, Some(SCENE_COLOR));
    assert_eq!(chain.signature(&chain.output), inverted);
}

#[test]
fn test_integration_fog_without_scene_depth_copies_input() {
    let mut chain = Chain::new(RenderTargetSpec::color_depth(WIDTH, HEIGHT));
    chain.stack.add_effect(Box::new(FogEffect::new(fog_shader())), true);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    assert_eq!(stats.failed_effects, 0);
    assert_eq!(chain.signature(&chain.output), Some(SCENE_COLOR));
    assert_eq!(chain.mock.lock().unwrap().draw_call_count(), 0);
}

#[test]
fn test_integration_threshold_debug_presents_bright_pass() {
    let mut chain = Chain::with_full_scene();
    let mut bloom = chain.bloom();
    bloom.set_debug_mode(BloomDebugMode::ThresholdOnly);
    chain.stack.add_effect(Box::new(bloom), true);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    assert_eq!(stats.apply_calls, 1);
    assert_eq!(chain.signature(&chain.output), Some(BRIGHT_PASS));
}

#[test]
fn test_integration_disabled_effects_bypass() {
    let mut chain = Chain::with_full_scene();
    let id = chain.stack.add_effect(Box::new(InvertEffect::new(invert_shader())), true);
    chain.stack.set_enabled(id, false);

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    assert!(stats.bypassed);
    assert_eq!(chain.signature(&chain.output), Some(SCENE_COLOR));
}

// ============================================================================
// PARAMETER TESTS
// ============================================================================

#[test]
fn test_integration_ui_drives_stack() {
    let mut chain = Chain::with_full_scene();
    let bloom = chain.bloom();
    chain.stack.add_effect(Box::new(bloom), true);
    let invert = chain.stack.add_effect(Box::new(InvertEffect::new(invert_shader())), true);
    assert_eq!(chain.stack.total_pass_count(), 11);

    let mut ui = RecordingUi::new();
    ui.edit("BloomEffect/Blur Passes", UiEdit::UInt(3));
    ui.edit("BloomEffect/Threshold", UiEdit::Float(0.75));
    ui.edit("InvertEffect/InvertEffect", UiEdit::Bool(false));
    chain.stack.draw_parameter_ui(&mut ui);

    assert!(!chain.stack.is_enabled(invert));
    assert_eq!(chain.stack.total_pass_count(), 6);
    assert_eq!(ui.indent_depth(), 0);
    assert_eq!(ui.id_depth(), 0);
    assert_eq!(
        chain.stack.collect_shared_parameters().get("bloomThreshold"),
        Some(&UniformValue::Float(0.75))
    );

    let stats = chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();
    assert_eq!(stats.apply_calls, 6);
}

#[test]
fn test_integration_shutdown_releases_effect_resources() {
    let mut chain = Chain::with_full_scene();
    let bloom = chain.bloom();
    chain.stack.add_effect(Box::new(bloom), true);
    chain
        .stack
        .process_stack(&chain.device, &chain.scene, &chain.output, WIDTH, HEIGHT)
        .unwrap();

    let mut dev = chain.mock.lock().unwrap();
    chain.stack.shutdown(&mut *dev);

    // Scene: 2 colors + depth, output: 1 color
    assert_eq!(dev.live_textures(), 4);
    assert_eq!(dev.live_framebuffers(), 2);
    assert_eq!(dev.live_vertex_arrays(), 0);
    assert!(chain.stack.is_shut_down());
}
