/// Renderable object supplied by the scene graph each frame

use glam::Mat4;
use crate::device::MeshHandle;
use crate::scene::Material;

#[derive(Debug, Clone)]
pub struct Drawable {
    pub name: String,
    /// Object-to-world transform (parent chain already applied)
    pub world_transform: Mat4,
    pub material: Option<Material>,
    pub meshes: Vec<MeshHandle>,
    /// Disabled drawables are skipped by every pass
    pub enabled: bool,
}

impl Drawable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world_transform: Mat4::IDENTITY,
            material: None,
            meshes: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_transform(mut self, world_transform: Mat4) -> Self {
        self.world_transform = world_transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_mesh(mut self, mesh: MeshHandle) -> Self {
        self.meshes.push(mesh);
        self
    }
}
