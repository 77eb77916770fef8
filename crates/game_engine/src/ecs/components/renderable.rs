//! Renderable component for entities that are drawn

use crate::ecs::Component;
use crate::render::material::MaterialId;
use crate::render::mesh::MeshHandle;

/// Mesh and material drawn at the entity's transform
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableComponent {
    /// Mesh asset
    pub mesh: MeshHandle,

    /// Material in the renderer's material library
    pub material: MaterialId,

    /// Hidden renderables are skipped before culling
    pub visible: bool,

    /// Layers this renderable belongs to; matched against the camera mask
    pub layers: u32,
}

impl RenderableComponent {
    /// Every layer
    pub const ALL_LAYERS: u32 = u32::MAX;

    /// Visible renderable on every layer
    pub fn new(mesh: MeshHandle, material: MaterialId) -> Self {
        Self {
            mesh,
            material,
            visible: true,
            layers: Self::ALL_LAYERS,
        }
    }

    /// Builder: restrict to the given layer mask
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether this renderable is drawn by a camera with `mask`
    pub fn is_drawn_for(&self, mask: u32) -> bool {
        self.visible && self.layers & mask != 0
    }
}

impl Component for RenderableComponent {}
