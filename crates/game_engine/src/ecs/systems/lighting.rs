//! Lighting system for converting light entities to render data

use crate::ecs::components::{LightComponent, TransformComponent};
use crate::ecs::World;
use crate::foundation::math::Vec3;
use crate::render::lighting::{Light, MultiLightEnvironment};

/// Builds the packed light block from light entities
///
/// A light on an entity with a transform sits at the transform position;
/// otherwise the component's own position is used.
#[derive(Debug, Default)]
pub struct LightingSystem {
    scratch: Vec<Light>,
}

impl LightingSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect enabled lights into a `MultiLightEnvironment`
    pub fn build_environment(&mut self, world: &World, ambient_color: Vec3, ambient_intensity: f32) -> MultiLightEnvironment {
        self.scratch.clear();
        for (entity, light) in world.query::<(LightComponent,)>() {
            if !light.enabled {
                continue;
            }
            let position = world
                .get_component::<TransformComponent>(entity)
                .map_or(light.position, |transform| transform.position);
            self.scratch.push(light.to_light(position));
        }
        log::trace!("LightingSystem: {} enabled lights", self.scratch.len());
        MultiLightEnvironment::from_lights(&self.scratch, ambient_color, ambient_intensity)
    }
}
