/// Depth-based fog

use glam::Vec3;
use crate::device::ShaderHandle;
use crate::error::{Error, Result};
use crate::postfx::{ApplyContext, Effect, ParameterUi};
use crate::target::RenderTarget;
use crate::{engine_debug, engine_warn};

/// Fog falloff curve, passed to the shader as `fogMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogMode {
    #[default]
    Linear = 0,
    Exponential = 1,
    ExponentialSquared = 2,
}

impl FogMode {
    pub const ALL: [FogMode; 3] = [FogMode::Linear, FogMode::Exponential, FogMode::ExponentialSquared];

    pub fn label(&self) -> &'static str {
        match self {
            FogMode::Linear => "Linear",
            FogMode::Exponential => "Exponential",
            FogMode::ExponentialSquared => "Exponential Squared",
        }
    }
}

/// Visualization selector, passed to the shader as `debugMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogDebugMode {
    #[default]
    Normal = 0,
    RawDepth = 1,
    LinearDepth = 2,
    FogFactor = 3,
}

impl FogDebugMode {
    pub const ALL: [FogDebugMode; 4] = [
        FogDebugMode::Normal,
        FogDebugMode::RawDepth,
        FogDebugMode::LinearDepth,
        FogDebugMode::FogFactor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FogDebugMode::Normal => "Normal",
            FogDebugMode::RawDepth => "Raw Depth",
            FogDebugMode::LinearDepth => "Linear Depth",
            FogDebugMode::FogFactor => "Fog Factor",
        }
    }
}

/// Fog effect
///
/// Reads the chained color input and the depth texture of the scene render.
/// Scenes rendered without a sampleable depth texture get a plain copy.
pub struct FogEffect {
    shader: ShaderHandle,
    pub color: Vec3,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    pub mode: FogMode,
    pub debug_mode: FogDebugMode,
    pub near_plane: f32,
    pub far_plane: f32,
    warned_missing_depth: bool,
}

impl FogEffect {
    pub fn new(shader: ShaderHandle) -> Self {
        Self {
            shader,
            color: Vec3::new(0.5, 0.6, 0.7),
            density: 0.05,
            start: 10.0,
            end: 100.0,
            mode: FogMode::Linear,
            debug_mode: FogDebugMode::Normal,
            near_plane: 0.1,
            far_plane: 1000.0,
            warned_missing_depth: false,
        }
    }

    fn passthrough(
        &mut self,
        ctx: &mut ApplyContext<'_>,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if !self.warned_missing_depth {
            engine_warn!(
                "compositor::FogEffect",
                "Scene target '{}' has no depth texture, fog disabled",
                ctx.scene.name()
            );
            self.warned_missing_depth = true;
        }
        if !input.blit_to(ctx.device, output, 0, width, height) {
            return Err(Error::InvalidResource(format!(
                "Fog passthrough from '{}' to '{}' failed",
                input.name(),
                output.name()
            )));
        }
        Ok(())
    }
}

impl Effect for FogEffect {
    fn name(&self) -> &str {
        "FogEffect"
    }

    fn apply(
        &mut self,
        ctx: &mut ApplyContext<'_>,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let Some(depth) = ctx.scene.depth_texture() else {
            return self.passthrough(ctx, input, output, width, height);
        };
        self.warned_missing_depth = false;

        let shader = self.shader;
        ctx.begin_pass(output, shader, width, height)?;
        ctx.bind_sampler(shader, "inputTexture", 0, input.color_attachment(0));
        ctx.bind_sampler(shader, "depthTexture", 1, Some(depth));

        ctx.set_uniform(shader, "fogColor", self.color);
        ctx.set_uniform(shader, "fogDensity", self.density);
        ctx.set_uniform(shader, "fogStart", self.start);
        ctx.set_uniform(shader, "fogEnd", self.end);
        ctx.set_uniform(shader, "fogMode", self.mode as i32);
        ctx.set_uniform(shader, "debugMode", self.debug_mode as i32);
        ctx.set_uniform(shader, "nearPlane", self.near_plane);
        ctx.set_uniform(shader, "farPlane", self.far_plane);

        ctx.draw_quad();
        Ok(())
    }

    fn draw_parameter_ui(&mut self, ui: &mut dyn ParameterUi) {
        if !ui.collapsing_header("Fog Settings", true) {
            return;
        }

        let debug_labels: Vec<&str> = FogDebugMode::ALL.iter().map(|mode| mode.label()).collect();
        let mut debug_index = self.debug_mode as usize;
        if ui.combo("Debug Mode", &mut debug_index, &debug_labels) {
            if let Some(mode) = FogDebugMode::ALL.get(debug_index) {
                self.debug_mode = *mode;
                engine_debug!("compositor::FogEffect", "Debug mode set to {}", mode.label());
            }
        }

        let mode_labels: Vec<&str> = FogMode::ALL.iter().map(|mode| mode.label()).collect();
        let mut mode_index = self.mode as usize;
        if ui.combo("Fog Mode", &mut mode_index, &mode_labels) {
            if let Some(mode) = FogMode::ALL.get(mode_index) {
                self.mode = *mode;
            }
        }

        ui.color_edit3("Fog Color", &mut self.color);

        if self.mode == FogMode::Linear {
            ui.slider_f32("Fog Start", &mut self.start, 0.1, 500.0, "%.1f");
            ui.slider_f32("Fog End", &mut self.end, 1.0, 1000.0, "%.1f");
        } else {
            ui.slider_f32("Fog Density", &mut self.density, 0.001, 0.5, "%.3f");
        }

        ui.separator();
        ui.text("Camera Parameters");
        ui.slider_f32("Near Plane", &mut self.near_plane, 0.01, 10.0, "%.2f");
        ui.slider_f32("Far Plane", &mut self.far_plane, 10.0, 10000.0, "%.0f");
    }
}

#[cfg(test)]
#[path = "fog_tests.rs"]
mod tests;
