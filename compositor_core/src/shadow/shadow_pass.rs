/// Shadow pass - one depth map per active light
///
/// Light `i` always renders into shadow map `i`; indices are positional, so
/// removing a light shifts every later light to a new map. Maps are only
/// ever added: when the active count shrinks the extra maps are kept for a
/// later frame but are no longer reported. A map whose creation failed is
/// retried on the next `render` and reported as missing until then.

use glam::Mat4;
use crate::config::ShadowSettings;
use crate::device::{
    ClearFlags, CullFace, FramebufferTarget, GraphicsDevice, ShaderHandle, SharedDevice, TextureHandle, Viewport,
};
use crate::error::{Error, Result};
use crate::scene::Drawable;
use crate::shadow::{light_space_matrix, LightSnapshot, MAX_LIGHTS};
use crate::target::{RenderTarget, RenderTargetSpec};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

pub struct ShadowPass {
    device: SharedDevice,
    depth_shader: ShaderHandle,
    settings: ShadowSettings,
    targets: Vec<RenderTarget>,
    matrices: Vec<Mat4>,
    /// Map `i` holds this frame's depth for light `i`
    rendered: Vec<bool>,
    active_count: usize,
}

impl ShadowPass {
    /// Create the pass; shadow maps are allocated by the first `render`
    pub fn new(device: &SharedDevice, depth_shader: ShaderHandle, settings: ShadowSettings) -> Self {
        Self {
            device: device.clone(),
            depth_shader,
            settings,
            targets: Vec::new(),
            matrices: Vec::new(),
            rendered: Vec::new(),
            active_count: 0,
        }
    }

    /// Render the depth map of each of the first `MAX_LIGHTS` lights
    ///
    /// The viewport and framebuffer bindings active on entry are restored
    /// before returning. Returns the number of shadow maps rendered; fails
    /// only when lights were supplied and none of them could be rendered.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        drawables: &[Drawable],
        lights: &[LightSnapshot],
    ) -> Result<usize> {
        let count = lights.len().min(MAX_LIGHTS);
        if lights.len() > MAX_LIGHTS {
            engine_trace!(
                "compositor::ShadowPass",
                "{} lights supplied, shadowing the first {}",
                lights.len(),
                MAX_LIGHTS
            );
        }
        self.ensure_targets(device, count);

        let previous_viewport = device.viewport();
        let previous_read = device.bound_framebuffer(FramebufferTarget::Read);
        let previous_draw = device.bound_framebuffer(FramebufferTarget::Draw);

        let resolution = self.settings.resolution;
        let shader = self.depth_shader;
        let mut rendered = 0;
        self.rendered.iter_mut().for_each(|done| *done = false);

        for (index, light) in lights.iter().take(count).enumerate() {
            let matrix = light_space_matrix(light, &self.settings);
            let target = &self.targets[index];
            if !target.bind(device) {
                engine_error!(
                    "compositor::ShadowPass",
                    "Skipping shadow map {} ({} light)",
                    index,
                    light.light_type
                );
                continue;
            }

            device.clear(ClearFlags::DEPTH);
            device.set_viewport(Viewport::sized(resolution, resolution));
            device.set_cull_face(CullFace::Front);

            device.use_program(shader);
            device.set_uniform(shader, "lightSpaceMatrix", matrix.into());

            let mut mesh_count = 0;
            for drawable in drawables.iter().filter(|d| d.enabled) {
                device.set_uniform(shader, "modelMatrix", drawable.world_transform.into());
                for mesh in &drawable.meshes {
                    device.draw_mesh(*mesh);
                    mesh_count += 1;
                }
            }

            device.set_cull_face(CullFace::Back);
            target.unbind(device);
            self.matrices[index] = matrix;
            self.rendered[index] = true;
            rendered += 1;

            engine_trace!(
                "compositor::ShadowPass",
                "Shadow map {} ({} light): {} meshes",
                index,
                light.light_type,
                mesh_count
            );
        }

        device.set_viewport(previous_viewport);
        if previous_read == previous_draw {
            device.bind_framebuffer(FramebufferTarget::Both, previous_draw);
        } else {
            device.bind_framebuffer(FramebufferTarget::Read, previous_read);
            device.bind_framebuffer(FramebufferTarget::Draw, previous_draw);
        }

        self.active_count = count;

        if count > 0 && rendered == 0 {
            return Err(Error::InvalidResource(format!(
                "None of the {} shadow maps could be rendered",
                count
            )));
        }
        Ok(rendered)
    }

    /// Grow the map list to `count` entries and retry maps that failed
    fn ensure_targets(&mut self, device: &mut dyn GraphicsDevice, count: usize) {
        let resolution = self.settings.resolution;
        for (index, target) in self.targets.iter_mut().take(count).enumerate() {
            if !target.is_valid() {
                engine_debug!("compositor::ShadowPass", "Rebuilding shadow map {}", index);
                target.recreate(device);
                target.resize(device, resolution, resolution);
            }
        }

        while self.targets.len() < count {
            let index = self.targets.len();
            let mut target = RenderTarget::new(
                &self.device,
                format!("shadow_map_{}", index),
                RenderTargetSpec::depth_texture(0, 0),
            );
            target.resize(device, resolution, resolution);
            if !target.is_valid() {
                engine_warn!("compositor::ShadowPass", "Shadow map {} could not be created", index);
            }
            self.targets.push(target);
            self.matrices.push(Mat4::IDENTITY);
            self.rendered.push(false);
        }
    }

    // ===== ACCESSORS =====

    /// Number of lights shadowed by the last `render`
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    fn is_rendered(&self, index: usize) -> bool {
        index < self.active_count && self.rendered.get(index).copied().unwrap_or(false)
    }

    /// Depth texture of light `index`, `None` when it was not rendered
    pub fn shadow_map(&self, index: usize) -> Option<TextureHandle> {
        if !self.is_rendered(index) {
            return None;
        }
        self.targets.get(index).and_then(|t| t.depth_texture())
    }

    /// Light-space matrix of light `index`, `None` when its map was not rendered
    pub fn light_space_matrix(&self, index: usize) -> Option<Mat4> {
        if !self.is_rendered(index) {
            return None;
        }
        self.matrices.get(index).copied()
    }

    /// Number of leading lights whose shadow map is available
    ///
    /// Stops at the first missing map so light `i` keeps map `i`.
    pub fn usable_count(&self) -> usize {
        (0..self.active_count).take_while(|&index| self.is_rendered(index)).count()
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Every allocated shadow map, including ones beyond `active_count`
    pub fn targets(&self) -> &[RenderTarget] {
        &self.targets
    }

    /// Release every shadow map
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        for target in self.targets.iter_mut() {
            target.release(device);
        }
        self.targets.clear();
        self.matrices.clear();
        self.rendered.clear();
        self.active_count = 0;
        engine_debug!("compositor::ShadowPass", "Released shadow maps");
    }
}

#[cfg(test)]
#[path = "shadow_pass_tests.rs"]
mod tests;
