//! Integration tests for the full frame: shadows, opaque pass and the
//! effect stack, driven through the public API on a mock device
//!
//! No GPU required.
//!
//! Run with: cargo test --features mock-device --test frame_integration_tests

use std::sync::{Arc, Mutex};
use compositor_core::compositor::device::mock_device::MockGraphicsDevice;
use compositor_core::compositor::device::{MeshHandle, ShaderHandle, SharedDevice, TextureFormat};
use compositor_core::compositor::log::{LogEntry, LogSeverity, Logger};
use compositor_core::compositor::postfx::{BloomEffect, FogEffect, InvertEffect};
use compositor_core::compositor::scene::{Drawable, FrameInputs, FramePipeline, FrameStats, Material};
use compositor_core::compositor::shadow::LightSnapshot;
use compositor_core::compositor::target::{RenderTarget, RenderTargetSpec};
use compositor_core::compositor::{CompositorConfig, Engine, ShadowSettings};
use compositor_core::glam::{Mat4, Vec3};
use serial_test::serial;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(LogEntry {
            severity: entry.severity,
            timestamp: entry.timestamp,
            source: entry.source.clone(),
            message: entry.message.clone(),
            file: entry.file,
            line: entry.line,
        });
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Register a fresh mock as the engine device
fn setup_device() -> (Arc<Mutex<MockGraphicsDevice>>, SharedDevice) {
    Engine::initialize().unwrap();
    Engine::destroy_device().unwrap();
    let (mock, shared) = MockGraphicsDevice::new_shared();
    Engine::register_device(shared).unwrap();
    (mock, Engine::device().unwrap())
}

fn teardown() {
    Engine::reset_logger();
    Engine::destroy_device().unwrap();
}

fn config() -> CompositorConfig {
    CompositorConfig {
        shadow: ShadowSettings { resolution: 512, ..Default::default() },
        ..Default::default()
    }
}

/// Scene target with the bright-pass attachment and a sampleable depth buffer
fn scene_target(device: &SharedDevice) -> RenderTarget {
    RenderTarget::new(
        device,
        "scene",
        RenderTargetSpec::color_depth(WIDTH, HEIGHT)
            .with_color_attachments(2)
            .with_sampleable_depth(),
    )
}

fn destination(device: &SharedDevice) -> RenderTarget {
    RenderTarget::new(
        device,
        "viewport",
        RenderTargetSpec::color_only(WIDTH, HEIGHT, TextureFormat::R8G8B8A8_UNORM),
    )
}

fn scene_content() -> (Vec<Drawable>, Vec<LightSnapshot>) {
    let lit = ShaderHandle::new(200).unwrap();
    let drawables = vec![
        Drawable::new("ground")
            .with_transform(Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0)))
            .with_material(Material::new(lit))
            .with_mesh(MeshHandle::new(300).unwrap()),
        Drawable::new("cube")
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .with_material(Material::new(lit))
            .with_mesh(MeshHandle::new(301).unwrap()),
    ];
    let lights = vec![
        LightSnapshot::directional(Vec3::new(-0.5, -1.0, -0.3)),
        LightSnapshot::point(Vec3::new(2.0, 4.0, 0.0)),
    ];
    (drawables, lights)
}

fn render(
    pipeline: &mut FramePipeline,
    drawables: &[Drawable],
    lights: &[LightSnapshot],
    scene: &RenderTarget,
    output: &RenderTarget,
    width: u32,
    height: u32,
) -> FrameStats {
    let inputs = FrameInputs {
        view: Mat4::look_at_rh(Vec3::new(0.0, 3.0, 8.0), Vec3::ZERO, Vec3::Y),
        projection: Mat4::perspective_rh_gl(1.0, width as f32 / height as f32, 0.1, 100.0),
        drawables,
        lights,
        width,
        height,
    };
    pipeline.render_frame(&inputs, scene, output)
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_full_frame_with_effect_chain() {
    let (mock, device) = setup_device();
    let scene = scene_target(&device);
    let output = destination(&device);
    let mut pipeline = FramePipeline::new(&device, ShaderHandle::new(100).unwrap(), config()).unwrap();

    let mut bloom = BloomEffect::new(&device, ShaderHandle::new(101).unwrap(), ShaderHandle::new(102).unwrap());
    bloom.set_blur_passes(2);
    let effects = pipeline.effects_mut();
    effects.add_effect(Box::new(bloom), true);
    effects.add_effect(Box::new(FogEffect::new(ShaderHandle::new(103).unwrap())), true);
    effects.add_effect(Box::new(InvertEffect::new(ShaderHandle::new(104).unwrap())), true);

    let (drawables, lights) = scene_content();
    let stats = render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);

    assert_eq!(stats.failed_stages, 0);
    assert_eq!(stats.shadow_maps, 2);
    assert_eq!(stats.opaque.drawn, 2);
    assert_eq!(stats.post.effects_run, 3);
    assert_eq!(stats.post.apply_calls, 4 + 1 + 1);
    assert!(!stats.post.bypassed);

    {
        let dev = mock.lock().unwrap();
        let presented = dev.texture_signature(output.color_attachment(0).unwrap());
        assert_ne!(presented, Some(0));
        assert_ne!(presented, dev.texture_signature(scene.color_attachment(0).unwrap()));
        for scratch in pipeline.effects().scratch_targets() {
            assert_eq!((scratch.width(), scratch.height()), (WIDTH, HEIGHT));
        }
    }

    pipeline.shutdown().unwrap();
    teardown();
}

#[test]
#[serial]
fn test_integration_frames_reuse_resources() {
    let (mock, device) = setup_device();
    let scene = scene_target(&device);
    let output = destination(&device);
    let mut pipeline = FramePipeline::new(&device, ShaderHandle::new(100).unwrap(), config()).unwrap();
    pipeline
        .effects_mut()
        .add_effect(Box::new(InvertEffect::new(ShaderHandle::new(104).unwrap())), true);
    let (drawables, lights) = scene_content();

    let first = render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);
    let (textures, framebuffers) = {
        let dev = mock.lock().unwrap();
        (dev.live_textures(), dev.live_framebuffers())
    };
    let second = render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);

    assert_eq!(first, second);
    let dev = mock.lock().unwrap();
    assert_eq!(dev.live_textures(), textures);
    assert_eq!(dev.live_framebuffers(), framebuffers);
    drop(dev);

    pipeline.shutdown().unwrap();
    teardown();
}

#[test]
#[serial]
fn test_integration_viewport_resize() {
    let (mock, device) = setup_device();
    let mut scene = scene_target(&device);
    let mut output = destination(&device);
    let mut pipeline = FramePipeline::new(&device, ShaderHandle::new(100).unwrap(), config()).unwrap();
    pipeline
        .effects_mut()
        .add_effect(Box::new(InvertEffect::new(ShaderHandle::new(104).unwrap())), true);
    let (drawables, lights) = scene_content();
    render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);

    {
        let mut dev = mock.lock().unwrap();
        scene.resize(&mut *dev, 1280, 720);
        output.resize(&mut *dev, 1280, 720);
    }
    let stats = render(&mut pipeline, &drawables, &lights, &scene, &output, 1280, 720);

    assert_eq!(stats.failed_stages, 0);
    for scratch in pipeline.effects().scratch_targets() {
        assert_eq!((scratch.width(), scratch.height()), (1280, 720));
    }
    let dev = mock.lock().unwrap();
    assert_ne!(dev.texture_signature(output.color_attachment(0).unwrap()), Some(0));
    drop(dev);

    pipeline.shutdown().unwrap();
    teardown();
}

// ============================================================================
// FAILURE TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_stage_failures_are_logged() {
    let (mock, device) = setup_device();
    let scene = scene_target(&device);
    let output = destination(&device);
    let mut pipeline = FramePipeline::new(&device, ShaderHandle::new(100).unwrap(), config()).unwrap();
    let (drawables, lights) = scene_content();

    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);
    mock.lock().unwrap().fail_texture_creation(true);

    let stats = render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);

    assert_eq!(stats.failed_stages, 1);
    assert_eq!(stats.opaque.drawn, 2);
    assert!(stats.post.bypassed);

    let captured = entries.lock().unwrap();
    assert!(captured.iter().any(|e| e.severity == LogSeverity::Error
        && e.source == "compositor::FramePipeline"
        && e.message.starts_with("Shadow pass failed")));
    drop(captured);

    mock.lock().unwrap().fail_texture_creation(false);
    pipeline.shutdown().unwrap();
    teardown();
}

#[test]
#[serial]
fn test_integration_shutdown_releases_gpu_resources() {
    let (mock, device) = setup_device();
    let mut pipeline = FramePipeline::new(&device, ShaderHandle::new(100).unwrap(), config()).unwrap();
    {
        let scene = scene_target(&device);
        let output = destination(&device);
        let bloom = BloomEffect::new(&device, ShaderHandle::new(101).unwrap(), ShaderHandle::new(102).unwrap());
        pipeline.effects_mut().add_effect(Box::new(bloom), true);
        let (drawables, lights) = scene_content();
        render(&mut pipeline, &drawables, &lights, &scene, &output, WIDTH, HEIGHT);
    }

    pipeline.shutdown().unwrap();

    let dev = mock.lock().unwrap();
    assert_eq!(dev.live_textures(), 0);
    assert_eq!(dev.live_renderbuffers(), 0);
    assert_eq!(dev.live_framebuffers(), 0);
    assert_eq!(dev.live_buffers(), 0);
    assert_eq!(dev.live_vertex_arrays(), 0);
    drop(dev);

    teardown();
}
