/// Bloom effect - separable gaussian blur of the scene's bright-pass output
/// composited back over the scene color
///
/// The scene shader writes pixels above `bloomThreshold` into color
/// attachment 1. Each blur iteration is two passes (horizontal then
/// vertical) ping-ponging between two bloom-owned temp targets; the final
/// pass adds the blurred result to the scene color.

use crate::device::{GraphicsDevice, ShaderHandle, SharedDevice, TextureFormat, UniformValue};
use crate::error::{Error, Result};
use crate::postfx::{ApplyContext, Effect, ParameterUi, SharedParameters};
use crate::target::{RenderTarget, RenderTargetSpec};
use crate::engine_debug;

/// Scene attachment holding the bright-pass output
const BRIGHT_PASS_ATTACHMENT: usize = 1;

pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 20.0);
pub const INTENSITY_RANGE: (f32, f32) = (0.0, 5.0);
pub const BLUR_PASSES_RANGE: (u32, u32) = (1, 10);

/// What the effect writes to its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BloomDebugMode {
    /// Blurred bright pass added over the scene
    #[default]
    None,
    /// Raw bright-pass attachment, no blur
    ThresholdOnly,
    /// Blurred bright pass without the scene
    BlurOnly,
}

impl BloomDebugMode {
    pub const ALL: [BloomDebugMode; 3] = [
        BloomDebugMode::None,
        BloomDebugMode::ThresholdOnly,
        BloomDebugMode::BlurOnly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BloomDebugMode::None => "None (Normal)",
            BloomDebugMode::ThresholdOnly => "Threshold Only",
            BloomDebugMode::BlurOnly => "Blur Only",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|mode| mode == self).unwrap_or(0)
    }
}

pub struct BloomEffect {
    blur_shader: ShaderHandle,
    composite_shader: ShaderHandle,
    temps: [RenderTarget; 2],
    threshold: f32,
    intensity: f32,
    blur_passes: u32,
    debug_mode: BloomDebugMode,
}

impl BloomEffect {
    /// Create the effect; temp targets are sized on the first frame
    pub fn new(device: &SharedDevice, blur_shader: ShaderHandle, composite_shader: ShaderHandle) -> Self {
        let spec = RenderTargetSpec::color_only(0, 0, TextureFormat::R16G16B16A16_SFLOAT);
        Self {
            blur_shader,
            composite_shader,
            temps: [
                RenderTarget::new(device, "bloom_temp_0", spec),
                RenderTarget::new(device, "bloom_temp_1", spec),
            ],
            threshold: 0.2,
            intensity: 1.0,
            blur_passes: 5,
            debug_mode: BloomDebugMode::None,
        }
    }

    // ===== PARAMETERS =====

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(THRESHOLD_RANGE.0, THRESHOLD_RANGE.1);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(INTENSITY_RANGE.0, INTENSITY_RANGE.1);
    }

    pub fn blur_passes(&self) -> u32 {
        self.blur_passes
    }

    pub fn set_blur_passes(&mut self, passes: u32) {
        self.blur_passes = passes.clamp(BLUR_PASSES_RANGE.0, BLUR_PASSES_RANGE.1);
    }

    pub fn debug_mode(&self) -> BloomDebugMode {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, mode: BloomDebugMode) {
        self.debug_mode = mode;
    }

    /// Ping-pong temp targets (for inspection)
    pub fn temp_targets(&self) -> &[RenderTarget; 2] {
        &self.temps
    }

    fn prepare_temps(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> Result<()> {
        for temp in self.temps.iter_mut() {
            temp.resize(device, width, height);
            if !temp.bind_and_clear(device, width, height) {
                return Err(Error::InvalidResource(format!(
                    "Bloom temp target '{}' unavailable at {}x{}",
                    temp.name(),
                    width,
                    height
                )));
            }
        }
        Ok(())
    }
}

impl Effect for BloomEffect {
    fn name(&self) -> &str {
        "BloomEffect"
    }

    fn pass_count(&self) -> u32 {
        match self.debug_mode {
            BloomDebugMode::ThresholdOnly => 1,
            _ => self.blur_passes * 2,
        }
    }

    fn apply(
        &mut self,
        ctx: &mut ApplyContext<'_>,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.debug_mode == BloomDebugMode::ThresholdOnly {
            if !input.blit_to(ctx.device, output, BRIGHT_PASS_ATTACHMENT as u32, width, height) {
                return Err(Error::InvalidResource(format!(
                    "Cannot copy bright pass of '{}' to '{}'",
                    input.name(),
                    output.name()
                )));
            }
            return Ok(());
        }

        let bright_pass = input.color_attachment(BRIGHT_PASS_ATTACHMENT).ok_or_else(|| {
            Error::InvalidResource(format!(
                "Bloom needs a bright-pass attachment on '{}' ({} color attachments)",
                input.name(),
                input.color_attachments().len()
            ))
        })?;

        let pass = ctx.pass_index;
        if ctx.is_first_pass() {
            self.prepare_temps(ctx.device, width, height)?;
        }

        let horizontal = pass % 2 == 0;
        let (target_index, source_index) = if horizontal { (0, 1) } else { (1, 0) };
        let source = if ctx.is_first_pass() {
            Some(bright_pass)
        } else {
            self.temps[source_index].color_attachment(0)
        };

        let blur_target = if ctx.is_last_pass() && self.debug_mode == BloomDebugMode::BlurOnly {
            output
        } else {
            &self.temps[target_index]
        };

        ctx.begin_pass(blur_target, self.blur_shader, width, height)?;
        ctx.bind_sampler(self.blur_shader, "inputTexture", 0, source);
        ctx.set_uniform(self.blur_shader, "horizontal", horizontal);
        ctx.set_uniform(self.blur_shader, "intensity", self.intensity);
        ctx.draw_quad();

        if ctx.is_last_pass() && self.debug_mode == BloomDebugMode::None {
            ctx.begin_pass(output, self.composite_shader, width, height)?;
            ctx.bind_sampler(self.composite_shader, "sceneTexture", 0, input.color_attachment(0));
            ctx.bind_sampler(self.composite_shader, "bloomTexture", 1, self.temps[target_index].color_attachment(0));
            ctx.draw_quad();
        }

        Ok(())
    }

    fn requires_scene_render(&self) -> bool {
        true
    }

    fn draw_parameter_ui(&mut self, ui: &mut dyn ParameterUi) {
        if !ui.collapsing_header("Bloom Settings", true) {
            return;
        }

        let labels: Vec<&str> = BloomDebugMode::ALL.iter().map(|mode| mode.label()).collect();
        let mut current = self.debug_mode.index();
        if ui.combo("Debug Mode", &mut current, &labels) {
            if let Some(mode) = BloomDebugMode::ALL.get(current) {
                self.debug_mode = *mode;
                engine_debug!("compositor::BloomEffect", "Debug mode set to {}", mode.label());
            }
        }
        if self.debug_mode != BloomDebugMode::None {
            ui.text_colored([1.0, 1.0, 0.0, 1.0], "Debug mode active!");
        }

        ui.separator();

        let mut threshold = self.threshold;
        if ui.slider_f32("Threshold", &mut threshold, THRESHOLD_RANGE.0, THRESHOLD_RANGE.1, "%.2f") {
            self.set_threshold(threshold);
        }
        ui.tooltip("Brightness threshold for bloom. Lower values = more bloom");

        let mut intensity = self.intensity;
        if ui.slider_f32("Intensity", &mut intensity, INTENSITY_RANGE.0, INTENSITY_RANGE.1, "%.2f") {
            self.set_intensity(intensity);
        }
        ui.tooltip("Strength of the bloom effect");

        let mut blur_passes = self.blur_passes;
        if ui.slider_u32("Blur Passes", &mut blur_passes, BLUR_PASSES_RANGE.0, BLUR_PASSES_RANGE.1) {
            self.set_blur_passes(blur_passes);
        }
        ui.tooltip("Number of blur iterations. More = smoother but slower");

        ui.separator();
        ui.text(&format!("Total Passes: {}", self.pass_count()));
    }

    fn export_parameters(&self, params: &mut SharedParameters) {
        params.insert("bloomThreshold".to_string(), UniformValue::Float(self.threshold));
    }

    fn release_resources(&mut self, device: &mut dyn GraphicsDevice) {
        for temp in self.temps.iter_mut() {
            temp.release(device);
        }
    }
}

#[cfg(test)]
#[path = "bloom_tests.rs"]
mod tests;
