//! Movement integration

use crate::ecs::components::{MovementComponent, TransformComponent};
use crate::ecs::{System, SystemError, SystemPhase, World};

/// Integrates `MovementComponent` velocities into transforms
///
/// Runs in the `Update` phase, once per fixed step.
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Create the system
    pub fn new() -> Self {
        Self
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn phase(&self) -> SystemPhase {
        SystemPhase::Update
    }

    fn run(&mut self, world: &mut World, delta_time: f32) -> Result<(), SystemError> {
        world.for_each_mut::<MovementComponent>(|_, movement| movement.integrate(delta_time));

        let mut moved = 0usize;
        world.join_mut::<TransformComponent, MovementComponent>(|_, transform, movement| {
            if !movement.enabled {
                return;
            }
            transform.position += movement.position_delta(delta_time);
            transform.rotation = movement.rotation_delta(delta_time) * transform.rotation;
            moved += 1;
        });
        log::trace!("MovementSystem: moved {moved} entities");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::MovementFactory;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_motion() {
        let mut world = World::new();
        let entity = world.spawn();
        world.add_component(entity, TransformComponent::identity()).unwrap();
        world
            .add_component(entity, MovementFactory::create_linear(Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();

        let mut system = MovementSystem::new();
        for _ in 0..4 {
            system.run(&mut world, 0.25).unwrap();
        }

        let transform = world.get_component::<TransformComponent>(entity).unwrap();
        assert_relative_eq!(transform.position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_accumulates() {
        let mut world = World::new();
        let entity = world.spawn();
        world.add_component(entity, TransformComponent::identity()).unwrap();
        world
            .add_component(entity, MovementFactory::create_rotating(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();

        let mut system = MovementSystem::new();
        system.run(&mut world, 0.5).unwrap();
        system.run(&mut world, 0.5).unwrap();

        let transform = world.get_component::<TransformComponent>(entity).unwrap();
        assert_relative_eq!(transform.rotation.angle(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_movement_without_transform_is_ignored() {
        let mut world = World::new();
        let entity = world.spawn();
        world
            .add_component(entity, MovementFactory::create_linear(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        assert!(MovementSystem::new().run(&mut world, 1.0).is_ok());
        assert!(!world.has_component::<TransformComponent>(entity));
    }
}
