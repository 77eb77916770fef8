//! Camera component

use crate::ecs::{Component, Entity, World};
use crate::render::camera::Camera;

/// Camera attached to an entity
///
/// The camera keeps its own position and target; it does not follow the
/// entity transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    /// Camera parameters
    pub camera: Camera,
    /// Only active cameras are considered for rendering
    pub active: bool,
    /// The highest-priority active camera renders
    pub priority: i32,
    /// Layers this camera draws
    pub layer_mask: u32,
}

impl Component for CameraComponent {}

impl CameraComponent {
    /// Active camera with priority 0 drawing every layer
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            active: true,
            priority: 0,
            layer_mask: u32::MAX,
        }
    }

    /// Builder: set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set the layer mask
    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Highest-priority active camera in the world
    ///
    /// Ties go to the camera on the lowest entity index.
    pub fn find_active(world: &World) -> Option<(Entity, &Self)> {
        world
            .query::<(Self,)>()
            .into_iter()
            .filter(|(_, camera)| camera.active)
            .min_by_key(|(entity, camera)| (std::cmp::Reverse(camera.priority), entity.index()))
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_active_prefers_priority() {
        let mut world = World::new();
        let low = world.spawn();
        let high = world.spawn();
        let off = world.spawn();
        world.add_component(low, CameraComponent::default()).unwrap();
        world.add_component(high, CameraComponent::default().with_priority(5)).unwrap();
        let mut inactive = CameraComponent::default().with_priority(10);
        inactive.active = false;
        world.add_component(off, inactive).unwrap();

        let (entity, _) = CameraComponent::find_active(&world).unwrap();
        assert_eq!(entity, high);
    }

    #[test]
    fn test_find_active_none_without_cameras() {
        let world = World::new();
        assert!(CameraComponent::find_active(&world).is_none());
    }
}
