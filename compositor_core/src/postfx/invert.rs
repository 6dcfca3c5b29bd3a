/// Color inversion effect

use crate::device::ShaderHandle;
use crate::error::Result;
use crate::postfx::{ApplyContext, Effect, ParameterUi};
use crate::target::RenderTarget;

/// Single-pass effect sampling `inputTexture` through an inversion shader
pub struct InvertEffect {
    shader: ShaderHandle,
}

impl InvertEffect {
    pub fn new(shader: ShaderHandle) -> Self {
        Self { shader }
    }
}

impl Effect for InvertEffect {
    fn name(&self) -> &str {
        "InvertEffect"
    }

    fn apply(
        &mut self,
        ctx: &mut ApplyContext<'_>,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()> {
        ctx.begin_pass(output, self.shader, width, height)?;
        ctx.bind_sampler(self.shader, "inputTexture", 0, input.color_attachment(0));
        ctx.draw_quad();
        Ok(())
    }

    fn draw_parameter_ui(&mut self, ui: &mut dyn ParameterUi) {
        ui.text("No parameters");
    }
}

#[cfg(test)]
#[path = "invert_tests.rs"]
mod tests;
