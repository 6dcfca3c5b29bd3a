/// Frame pipeline - runs the stages of one frame in order:
/// shadow maps, light upload, opaque pass into the scene target, then the
/// effect stack into the destination
///
/// No stage failure escapes `render_frame`: each one is logged and the
/// frame continues with whatever the failed stage left behind (missing
/// shadows, an unprocessed copy of the scene).

use glam::Mat4;
use crate::config::CompositorConfig;
use crate::device::{lock_device, GraphicsDevice, ShaderHandle, SharedDevice};
use crate::error::Result;
use crate::postfx::{EffectStack, ProcessStats};
use crate::scene::{Drawable, OpaquePass, OpaqueStats};
use crate::shadow::{LightBuffer, LightSnapshot, LightUniformBuffer, ShadowPass};
use crate::target::RenderTarget;
use crate::{engine_debug, engine_error, engine_info};

/// Everything the scene supplies for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub drawables: &'a [Drawable],
    pub lights: &'a [LightSnapshot],
    pub width: u32,
    pub height: u32,
}

/// What happened during one `render_frame`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub shadow_maps: usize,
    pub opaque: OpaqueStats,
    pub post: ProcessStats,
    /// Stages that logged an error
    pub failed_stages: u32,
}

pub struct FramePipeline {
    device: SharedDevice,
    config: CompositorConfig,
    shadow: ShadowPass,
    lights: Option<LightUniformBuffer>,
    opaque: OpaquePass,
    effects: EffectStack,
}

impl FramePipeline {
    /// Create the pipeline: effect stack (with its full-screen quad) and the
    /// light uniform buffer
    pub fn new(device: &SharedDevice, depth_shader: ShaderHandle, config: CompositorConfig) -> Result<Self> {
        let effects = EffectStack::new(device, config.scratch_color_format)?;
        let lights = {
            let mut guard = lock_device(device)?;
            guard.set_clear_color(config.clear_color);
            LightUniformBuffer::new(&mut *guard)?
        };

        engine_info!(
            "compositor::FramePipeline",
            "Initialized (shadow maps {}x{})",
            config.shadow.resolution,
            config.shadow.resolution
        );

        Ok(Self {
            device: device.clone(),
            shadow: ShadowPass::new(device, depth_shader, config.shadow),
            config,
            lights: Some(lights),
            opaque: OpaquePass::new(),
            effects,
        })
    }

    /// Render one frame into `destination`
    pub fn render_frame(
        &mut self,
        inputs: &FrameInputs<'_>,
        scene_target: &RenderTarget,
        destination: &RenderTarget,
    ) -> FrameStats {
        let device = self.device.clone();
        let mut guard = match lock_device(&device) {
            Ok(guard) => guard,
            Err(err) => {
                engine_error!("compositor::FramePipeline", "Frame skipped: {}", err);
                return FrameStats { failed_stages: 1, ..Default::default() };
            }
        };
        self.render_frame_with(&mut *guard, inputs, scene_target, destination)
    }

    /// `render_frame` for callers already holding the device lock
    pub fn render_frame_with(
        &mut self,
        device: &mut dyn GraphicsDevice,
        inputs: &FrameInputs<'_>,
        scene_target: &RenderTarget,
        destination: &RenderTarget,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let (width, height) = (inputs.width, inputs.height);

        // 1. Shadow maps
        match self.shadow.render(device, inputs.drawables, inputs.lights) {
            Ok(count) => stats.shadow_maps = count,
            Err(err) => {
                stats.failed_stages += 1;
                engine_error!("compositor::FramePipeline", "Shadow pass failed: {}", err);
            }
        }

        // 2. Light uniform block
        match &self.lights {
            Some(lights) => {
                if let Err(err) = lights.upload(device, &LightBuffer::pack(inputs.lights)) {
                    stats.failed_stages += 1;
                    engine_error!("compositor::FramePipeline", "Light upload failed: {}", err);
                }
            }
            None => {
                stats.failed_stages += 1;
                engine_error!("compositor::FramePipeline", "Light buffer used after shutdown");
            }
        }

        // 3. Opaque pass
        if scene_target.bind_and_clear(device, width, height) {
            let shared = self.effects.collect_shared_parameters();
            stats.opaque = self.opaque.render(
                device,
                inputs.view,
                inputs.projection,
                inputs.drawables,
                &self.shadow,
                &shared,
            );
        } else {
            stats.failed_stages += 1;
            engine_error!(
                "compositor::FramePipeline",
                "Scene target '{}' unavailable, opaque pass skipped",
                scene_target.name()
            );
        }

        // 4. Post-processing
        match self.effects.process_stack_with(device, scene_target, destination, width, height) {
            Ok(post) => stats.post = post,
            Err(err) => {
                stats.failed_stages += 1;
                engine_error!("compositor::FramePipeline", "Effect stack failed: {}", err);
            }
        }

        stats
    }

    // ===== ACCESSORS =====

    pub fn effects(&self) -> &EffectStack {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectStack {
        &mut self.effects
    }

    pub fn shadow_pass(&self) -> &ShadowPass {
        &self.shadow
    }

    pub fn light_buffer(&self) -> Option<&LightUniformBuffer> {
        self.lights.as_ref()
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Release the quad, scratch targets, shadow maps and light buffer
    pub fn shutdown(&mut self) -> Result<()> {
        let device = self.device.clone();
        let mut guard = lock_device(&device)?;
        self.effects.shutdown(&mut *guard);
        self.shadow.release(&mut *guard);
        if let Some(lights) = self.lights.take() {
            lights.destroy(&mut *guard);
        }
        engine_debug!("compositor::FramePipeline", "Shut down");
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_pipeline_tests.rs"]
mod tests;
