/// Effect trait - one post-processing stage of the effect stack

use rustc_hash::FxHashMap;
use crate::device::{GraphicsDevice, ShaderHandle, TextureHandle, UniformValue};
use crate::error::{Error, Result};
use crate::postfx::{FullscreenQuad, ParameterUi};
use crate::target::RenderTarget;

/// Tunables effects push to the scene materials once per frame
/// (e.g. `bloomThreshold` for the bright-pass output of the scene shader)
pub type SharedParameters = FxHashMap<String, UniformValue>;

/// Everything an effect may touch while applying one pass
pub struct ApplyContext<'a> {
    /// Locked device for the duration of the stack
    pub device: &'a mut dyn GraphicsDevice,
    /// Full-screen quad owned by the stack
    pub quad: &'a FullscreenQuad,
    /// Untouched scene render (auxiliary attachments such as the
    /// bright-pass MRT output or a depth texture live here)
    pub scene: &'a RenderTarget,
    /// Index of the current pass, `0..pass_count`
    pub pass_index: u32,
    /// Pass count the effect declared for this frame
    pub pass_count: u32,
}

impl<'a> ApplyContext<'a> {
    pub fn is_first_pass(&self) -> bool {
        self.pass_index == 0
    }

    pub fn is_last_pass(&self) -> bool {
        self.pass_index + 1 >= self.pass_count
    }

    /// Bind and clear `output`, set the viewport and select `shader`
    pub fn begin_pass(
        &mut self,
        output: &RenderTarget,
        shader: ShaderHandle,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if !output.bind_and_clear(self.device, width, height) {
            return Err(Error::InvalidResource(format!(
                "Output target '{}' is not valid",
                output.name()
            )));
        }
        self.device.use_program(shader);
        Ok(())
    }

    /// Bind `texture` to `unit` and point the sampler uniform `name` at it
    pub fn bind_sampler(&mut self, shader: ShaderHandle, name: &str, unit: u32, texture: Option<TextureHandle>) {
        self.device.bind_texture(unit, texture);
        self.device.set_uniform(shader, name, UniformValue::Int(unit as i32));
    }

    pub fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: impl Into<UniformValue>) {
        self.device.set_uniform(shader, name, value.into());
    }

    /// Draw the full-screen quad into the bound framebuffer
    pub fn draw_quad(&mut self) {
        self.quad.draw(self.device);
    }
}

/// A post-processing effect
///
/// The stack calls `apply` once per declared pass, every call reading the
/// effect's routed input. Passes before the last one write to a scratch
/// target; the last pass writes to the effect's routed output (the stack's
/// destination when the effect is last). An effect that needs more than one
/// physical buffer across its passes keeps its own temporary targets.
/// `apply` runs with the device locked: targets created there must go
/// through `RenderTarget::with_device`, passing `ctx.device`.
pub trait Effect: Send {
    /// Display name (also the id used by the parameter panel)
    fn name(&self) -> &str;

    /// Number of `apply` calls per frame
    fn pass_count(&self) -> u32 {
        1
    }

    /// Render pass `ctx.pass_index` reading `input` into `output`
    ///
    /// Must leave `output` bound and populated on the last pass.
    fn apply(
        &mut self,
        ctx: &mut ApplyContext<'_>,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()>;

    /// Draw effect-specific controls
    fn draw_parameter_ui(&mut self, _ui: &mut dyn ParameterUi) {}

    /// True if `input` must be the untouched scene render rather than the
    /// previous effect's output
    fn requires_scene_render(&self) -> bool {
        false
    }

    /// Push tunables other stages depend on
    fn export_parameters(&self, _params: &mut SharedParameters) {}

    /// Release effect-owned GPU resources (called by `EffectStack::shutdown`)
    fn release_resources(&mut self, _device: &mut dyn GraphicsDevice) {}
}
