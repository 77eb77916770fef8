//! Renderable collector
//!
//! Turns visible renderables into render commands for one camera. Hidden
//! renderables, layer mismatches and renderables outside the camera frustum
//! never reach the queue.

use crate::assets::AssetManager;
use crate::ecs::components::{CameraComponent, RenderableComponent, TransformComponent};
use crate::ecs::World;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::material::{Material, MaterialId, MaterialLibrary};
use crate::render::mesh::Mesh;
use crate::render::render_queue::{RenderCommand, RenderQueue};
use crate::render::shader::ShaderLibrary;

/// Counters from one collection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Commands pushed to the queue
    pub submitted: usize,
    /// Renderables rejected by the frustum test
    pub culled: usize,
    /// Renderables skipped because their mesh or shader is missing
    pub skipped: usize,
}

/// Material used when a renderable points at an unknown material
pub const FALLBACK_MATERIAL: MaterialId = MaterialId(0);

/// Collects renderables into a `RenderQueue`
#[derive(Debug, Clone)]
pub struct RenderableCollector {
    frustum_culling: bool,
}

impl Default for RenderableCollector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RenderableCollector {
    /// Create a collector
    pub fn new(frustum_culling: bool) -> Self {
        Self { frustum_culling }
    }

    /// Enable or disable frustum culling
    pub fn set_frustum_culling(&mut self, enabled: bool) {
        self.frustum_culling = enabled;
    }

    /// Push one command per visible renderable
    ///
    /// Entities without a transform are drawn at the origin.
    pub fn collect(
        &self,
        world: &World,
        camera: &CameraComponent,
        assets: &AssetManager,
        materials: &MaterialLibrary,
        shaders: &ShaderLibrary,
        queue: &mut RenderQueue,
    ) -> CollectStats {
        let mut stats = CollectStats::default();
        let frustum = camera.camera.frustum();
        let eye = camera.camera.position;
        let forward = camera.camera.forward();

        for (entity, renderable) in world.query::<(RenderableComponent,)>() {
            if !renderable.is_drawn_for(camera.layer_mask) {
                continue;
            }

            let Some(mesh) = assets.get::<Mesh>(renderable.mesh) else {
                log::warn!("Skipping {entity:?}: mesh {:?} is not loaded", renderable.mesh);
                stats.skipped += 1;
                continue;
            };

            let model = world
                .get_component::<TransformComponent>(entity)
                .map_or_else(Mat4::identity, TransformComponent::to_matrix);

            let bounds = mesh.bounds().transformed(&model);
            if self.frustum_culling && !frustum.intersects_aabb(&bounds) {
                stats.culled += 1;
                continue;
            }

            let Some((material_id, material)) = resolve_material(materials, renderable.material) else {
                log::warn!("Skipping {entity:?}: no material available");
                stats.skipped += 1;
                continue;
            };
            let Some(shader) = shaders
                .id(&material.shader)
                .or_else(|| shaders.id(Material::DEFAULT_SHADER))
            else {
                log::warn!("Skipping {entity:?}: shader '{}' is not registered", material.shader);
                stats.skipped += 1;
                continue;
            };

            let center: Vec3 = bounds.center();
            queue.push(RenderCommand {
                entity,
                mesh: renderable.mesh,
                material: material_id,
                shader,
                model,
                depth: (center - eye).dot(&forward),
                transparent: material.is_transparent(),
            });
            stats.submitted += 1;
        }

        log::trace!(
            "RenderableCollector: {} submitted, {} culled, {} skipped",
            stats.submitted,
            stats.culled,
            stats.skipped
        );
        stats
    }
}

fn resolve_material(materials: &MaterialLibrary, id: MaterialId) -> Option<(MaterialId, &Material)> {
    materials
        .get(id)
        .map(|material| (id, material))
        .or_else(|| materials.get(FALLBACK_MATERIAL).map(|material| (FALLBACK_MATERIAL, material)))
}
