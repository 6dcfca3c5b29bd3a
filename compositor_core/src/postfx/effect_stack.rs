/// Effect stack - ordered registry of post-processing effects and the
/// per-frame chain that runs them
///
/// The enabled list is a stable sort of the enabled entries by registration
/// order, recomputed whenever an entry's enabled flag changes. Toggling
/// therefore never reorders effects, and since toggling needs `&mut self`
/// it can never happen in the middle of `process_stack`.
///
/// Chain routing per enabled effect:
/// - input: the scene target when the effect requires the scene render,
///   otherwise the previous effect's output
/// - output: the destination for the last enabled effect, otherwise the
///   scratch target that does not hold the chain's current input
///
/// Two scratch targets are enough for any chain length: each effect writes
/// to the scratch target its input does not live in, so no `apply` reads
/// and writes the same physical buffer.

use slotmap::{new_key_type, SlotMap};
use crate::device::{lock_device, GraphicsDevice, SharedDevice, TextureFormat};
use crate::error::{Error, Result};
use crate::postfx::{ApplyContext, Effect, FullscreenQuad, ParameterUi, SharedParameters};
use crate::target::{RenderTarget, RenderTargetSpec};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

new_key_type! {
    /// Stable key of an effect registered in an `EffectStack`
    pub struct EffectId;
}

/// Registry entry
struct EffectEntry {
    effect: Box<dyn Effect>,
    registration_order: u64,
    enabled: bool,
}

/// Where the chain's current input lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainSource {
    Scene,
    Scratch(usize),
}

impl ChainSource {
    /// Scratch target that does not hold this source
    fn spare_scratch(&self) -> usize {
        match self {
            ChainSource::Scene => 0,
            ChainSource::Scratch(index) => 1 - index,
        }
    }
}

/// Output routed to one effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Destination,
    Scratch(usize),
}

/// Counters for one `process_stack` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Total `apply` invocations
    pub apply_calls: u32,
    /// Enabled effects that ran every pass successfully
    pub effects_run: u32,
    /// True when the input was copied straight to the output
    pub bypassed: bool,
    /// Effects whose `apply` returned an error
    pub failed_effects: u32,
}

/// Ordered registry of effects plus the scratch targets of the chain
pub struct EffectStack {
    effects: SlotMap<EffectId, EffectEntry>,
    enabled: Vec<EffectId>,
    next_registration: u64,
    scratch: [RenderTarget; 2],
    quad: Option<FullscreenQuad>,
}

impl EffectStack {
    /// Create an empty stack
    ///
    /// Scratch targets start at 0x0 and are sized on the first frame that
    /// runs at least one effect.
    pub fn new(device: &SharedDevice, scratch_format: TextureFormat) -> Result<Self> {
        let quad = {
            let mut guard = lock_device(device)?;
            FullscreenQuad::new(&mut *guard)?
        };

        let scratch_spec = RenderTargetSpec::color_only(0, 0, scratch_format);
        Ok(Self {
            effects: SlotMap::with_key(),
            enabled: Vec::new(),
            next_registration: 0,
            scratch: [
                RenderTarget::new(device, "postfx_scratch_0", scratch_spec),
                RenderTarget::new(device, "postfx_scratch_1", scratch_spec),
            ],
            quad: Some(quad),
        })
    }

    // ===== REGISTRY =====

    /// Register an effect at the end of the stack
    pub fn add_effect(&mut self, effect: Box<dyn Effect>, enabled: bool) -> EffectId {
        let registration_order = self.next_registration;
        self.next_registration += 1;

        engine_debug!(
            "compositor::EffectStack",
            "Registered effect '{}' (order {}, enabled: {})",
            effect.name(),
            registration_order,
            enabled
        );

        let id = self.effects.insert(EffectEntry { effect, registration_order, enabled });
        if enabled {
            self.rebuild_enabled_list();
        }
        id
    }

    /// Unregister an effect, returning it
    pub fn remove_effect(&mut self, id: EffectId) -> Option<Box<dyn Effect>> {
        let entry = self.effects.remove(id)?;
        if entry.enabled {
            self.rebuild_enabled_list();
        }
        engine_debug!("compositor::EffectStack", "Removed effect '{}'", entry.effect.name());
        Some(entry.effect)
    }

    /// Enable or disable an effect; the enabled list is updated immediately
    ///
    /// Returns false for an unknown id.
    pub fn set_enabled(&mut self, id: EffectId, enabled: bool) -> bool {
        let Some(entry) = self.effects.get_mut(id) else {
            return false;
        };
        if entry.enabled != enabled {
            entry.enabled = enabled;
            engine_debug!(
                "compositor::EffectStack",
                "Effect '{}' {}",
                entry.effect.name(),
                if enabled { "enabled" } else { "disabled" }
            );
            self.rebuild_enabled_list();
        }
        true
    }

    pub fn is_enabled(&self, id: EffectId) -> bool {
        self.effects.get(id).is_some_and(|entry| entry.enabled)
    }

    pub fn effect(&self, id: EffectId) -> Option<&dyn Effect> {
        self.effects.get(id).map(|entry| entry.effect.as_ref())
    }

    pub fn effect_mut(&mut self, id: EffectId) -> Option<&mut (dyn Effect + 'static)> {
        self.effects.get_mut(id).map(|entry| entry.effect.as_mut())
    }

    /// Every registered effect id, in registration order
    pub fn effects(&self) -> Vec<EffectId> {
        let mut ids: Vec<EffectId> = self.effects.keys().collect();
        ids.sort_by_key(|id| self.effects[*id].registration_order);
        ids
    }

    /// Enabled effect ids, in registration order
    pub fn enabled_effects(&self) -> &[EffectId] {
        &self.enabled
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    fn rebuild_enabled_list(&mut self) {
        let mut enabled: Vec<(u64, EffectId)> = self
            .effects
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(id, entry)| (entry.registration_order, id))
            .collect();
        enabled.sort_by_key(|(order, _)| *order);
        self.enabled = enabled.into_iter().map(|(_, id)| id).collect();
    }

    /// Sum of the pass counts of the enabled effects
    pub fn total_pass_count(&self) -> u32 {
        self.enabled
            .iter()
            .filter_map(|id| self.effects.get(*id))
            .map(|entry| entry.effect.pass_count())
            .sum()
    }

    // ===== PARAMETERS =====

    /// Gather the tunables every effect exports, in registration order
    pub fn collect_shared_parameters(&self) -> SharedParameters {
        let mut params = SharedParameters::default();
        for id in self.effects() {
            self.effects[id].effect.export_parameters(&mut params);
        }
        params
    }

    /// Draw the per-effect enable checkbox followed by the effect's controls
    pub fn draw_parameter_ui(&mut self, ui: &mut dyn ParameterUi) {
        ui.text("Post Processing Stack");
        ui.separator();

        let ids = self.effects();
        if ids.is_empty() {
            ui.text_colored([0.7, 0.7, 0.7, 1.0], "No effects in the stack.");
            return;
        }

        for id in ids {
            let Some(entry) = self.effects.get_mut(id) else {
                continue;
            };
            let name = entry.effect.name().to_string();
            let mut enabled = entry.enabled;

            ui.push_id(&name);
            let toggled = ui.checkbox(&name, &mut enabled);

            ui.indent();
            entry.effect.draw_parameter_ui(ui);
            ui.unindent();

            ui.separator();
            ui.pop_id();

            if toggled {
                self.set_enabled(id, enabled);
            }
        }
    }

    // ===== PER-FRAME CHAIN =====

    /// Run the enabled effects over `input`, leaving the result in `output`
    ///
    /// With no enabled effects the principal color attachment of `input` is
    /// copied to `output` unchanged. A failing effect is logged and skipped;
    /// if it was the last effect, the chain's current image is copied to
    /// `output` so the frame still presents something.
    pub fn process_stack(
        &mut self,
        device: &SharedDevice,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<ProcessStats> {
        let mut guard = lock_device(device)?;
        self.process_stack_with(&mut *guard, input, output, width, height)
    }

    /// Copy `input` straight to `output`, failing when the copy cannot run
    fn bypass_copy(
        device: &mut dyn GraphicsDevice,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if input.blit_to(device, output, 0, width, height) {
            return Ok(());
        }
        Err(Error::InvalidResource(format!(
            "Bypass copy from '{}' to '{}' failed",
            input.name(),
            output.name()
        )))
    }

    /// `process_stack` for callers already holding the device lock
    pub fn process_stack_with(
        &mut self,
        device: &mut dyn GraphicsDevice,
        input: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) -> Result<ProcessStats> {
        let mut stats = ProcessStats::default();

        if self.enabled.is_empty() {
            engine_trace!("compositor::EffectStack", "No enabled effects, bypassing");
            Self::bypass_copy(device, input, output, width, height)?;
            stats.bypassed = true;
            return Ok(stats);
        }

        let Some(quad) = self.quad.as_ref() else {
            return Err(Error::InvalidResource("Effect stack used after shutdown".to_string()));
        };

        for scratch in self.scratch.iter_mut() {
            scratch.resize(device, width, height);
        }
        if self.scratch.iter().any(|s| !s.is_valid()) {
            engine_error!(
                "compositor::EffectStack",
                "Scratch targets unavailable at {}x{}, bypassing effects",
                width,
                height
            );
            Self::bypass_copy(device, input, output, width, height)?;
            stats.bypassed = true;
            return Ok(stats);
        }

        let mut current = ChainSource::Scene;
        let last = self.enabled.len() - 1;

        for (position, id) in self.enabled.iter().enumerate() {
            let Some(entry) = self.effects.get_mut(*id) else {
                continue;
            };
            let effect = entry.effect.as_mut();
            let is_last = position == last;

            let source = if effect.requires_scene_render() { ChainSource::Scene } else { current };
            let route = if is_last { Route::Destination } else { Route::Scratch(current.spare_scratch()) };
            let pass_count = effect.pass_count();

            let effect_input = match source {
                ChainSource::Scene => input,
                ChainSource::Scratch(index) => &self.scratch[index],
            };
            let effect_output = match route {
                Route::Destination => output,
                Route::Scratch(index) => &self.scratch[index],
            };
            // Passes before the last one of the final effect must not touch
            // the destination
            let intermediate = &self.scratch[current.spare_scratch()];

            if pass_count == 0 {
                engine_warn!("compositor::EffectStack", "Effect '{}' declares 0 passes, skipping", effect.name());
                if is_last {
                    Self::present_fallback(device, effect_input_for_chain(current, input, &self.scratch), output, width, height);
                }
                continue;
            }

            let mut ctx = ApplyContext {
                device: &mut *device,
                quad,
                scene: input,
                pass_index: 0,
                pass_count,
            };

            let mut failure = None;
            for pass in 0..pass_count {
                ctx.pass_index = pass;
                let pass_output = if pass + 1 == pass_count { effect_output } else { intermediate };

                engine_trace!(
                    "compositor::EffectStack",
                    "'{}' pass {}/{}: {} -> {}",
                    effect.name(),
                    pass + 1,
                    pass_count,
                    effect_input.name(),
                    pass_output.name()
                );

                stats.apply_calls += 1;
                if let Err(err) = effect.apply(&mut ctx, effect_input, pass_output, width, height) {
                    failure = Some(err);
                    break;
                }
            }

            match failure {
                None => {
                    stats.effects_run += 1;
                    if let Route::Scratch(index) = route {
                        current = ChainSource::Scratch(index);
                    }
                }
                Some(err) => {
                    stats.failed_effects += 1;
                    engine_error!("compositor::EffectStack", "Effect '{}' failed: {}", effect.name(), err);
                    if is_last {
                        Self::present_fallback(device, effect_input_for_chain(current, input, &self.scratch), output, width, height);
                    }
                }
            }
        }

        Ok(stats)
    }

    fn present_fallback(
        device: &mut dyn GraphicsDevice,
        source: &RenderTarget,
        output: &RenderTarget,
        width: u32,
        height: u32,
    ) {
        if !source.blit_to(device, output, 0, width, height) {
            engine_error!(
                "compositor::EffectStack",
                "Fallback copy from '{}' to '{}' failed",
                source.name(),
                output.name()
            );
        }
    }

    /// Scratch targets (for inspection)
    pub fn scratch_targets(&self) -> &[RenderTarget; 2] {
        &self.scratch
    }

    /// Release the quad, the scratch targets and every effect's resources
    pub fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        for entry in self.effects.values_mut() {
            entry.effect.release_resources(device);
        }
        if let Some(quad) = self.quad.take() {
            quad.destroy(device);
        }
        for scratch in self.scratch.iter_mut() {
            scratch.release(device);
        }
        engine_debug!("compositor::EffectStack", "Shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.quad.is_none()
    }
}

/// Target holding the chain's current image
fn effect_input_for_chain<'a>(
    current: ChainSource,
    scene: &'a RenderTarget,
    scratch: &'a [RenderTarget; 2],
) -> &'a RenderTarget {
    match current {
        ChainSource::Scene => scene,
        ChainSource::Scratch(index) => &scratch[index],
    }
}

#[cfg(test)]
#[path = "effect_stack_tests.rs"]
mod tests;
