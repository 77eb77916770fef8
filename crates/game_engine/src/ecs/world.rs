//! ECS World implementation

use std::any::{Any, TypeId};
use std::collections::HashMap;

use thiserror::Error;

use super::entity::EntityAllocator;
use super::query::Query;
use super::storage::{ComponentStorage, ErasedStorage};
use super::{Component, Entity};

/// World-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity was despawned or never existed
    #[error("Entity {0:?} is not alive")]
    DeadEntity(Entity),
}

/// ECS World containing all entities, components and resources
#[derive(Default)]
pub struct World {
    entities: EntityAllocator,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.allocate();
        log::trace!("Spawned {entity:?}");
        entity
    }

    /// Destroy an entity and all of its components
    ///
    /// Returns false if the entity was not alive.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        log::trace!("Despawned {entity:?}");
        true
    }

    /// Whether the entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Add a component to an entity, returning the value it replaced
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<Option<T>, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        Ok(self.storage_mut::<T>().insert(entity, component))
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|s| s.remove(entity))
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()?
            .get_mut(entity)
    }

    /// Whether the entity has a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    /// Storage for a component type, if any component of it was ever added
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("storage registered under the TypeId of another type"),
        }
    }

    /// Fetch every entity that has all components in `Q`
    ///
    /// ```ignore
    /// for (entity, (transform, movement)) in world.query::<(Transform, MovementComponent)>() { .. }
    /// ```
    pub fn query<Q: Query>(&self) -> Vec<(Entity, Q::Item<'_>)> {
        Q::fetch(self)
    }

    /// Number of entities with a component of type `T`
    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Mutate every component of type `A`
    pub fn for_each_mut<A: Component>(&mut self, mut f: impl FnMut(Entity, &mut A)) {
        if let Some(storage) = self
            .storages
            .get_mut(&TypeId::of::<A>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<A>>())
        {
            for (entity, value) in storage.iter_mut() {
                f(entity, value);
            }
        }
    }

    /// Mutate `A` on every entity that also has `B`, reading `B`
    ///
    /// Joining a type with itself visits nothing.
    pub fn join_mut<A: Component, B: Component>(&mut self, mut f: impl FnMut(Entity, &mut A, &B)) {
        if TypeId::of::<A>() == TypeId::of::<B>() {
            return;
        }
        // Take A's storage out of the map so B can be borrowed alongside it
        let Some(mut boxed) = self.storages.remove(&TypeId::of::<A>()) else {
            return;
        };
        if let (Some(a), Some(b)) = (
            boxed.as_any_mut().downcast_mut::<ComponentStorage<A>>(),
            self.storage::<B>(),
        ) {
            for (entity, va) in a.iter_mut() {
                if let Some(vb) = b.get(entity) {
                    f(entity, va, vb);
                }
            }
        }
        self.storages.insert(TypeId::of::<A>(), boxed);
    }

    /// Insert a resource, returning the previous one of the same type
    pub fn insert_resource<R: Any + Send + Sync>(&mut self, resource: R) -> Option<R> {
        self.resources
            .insert(TypeId::of::<R>(), Box::new(resource))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Get a resource
    pub fn resource<R: Any + Send + Sync>(&self) -> Option<&R> {
        self.resources.get(&TypeId::of::<R>())?.downcast_ref::<R>()
    }

    /// Get a resource mutably
    pub fn resource_mut<R: Any + Send + Sync>(&mut self) -> Option<&mut R> {
        self.resources.get_mut(&TypeId::of::<R>())?.downcast_mut::<R>()
    }

    /// Remove a resource
    pub fn remove_resource<R: Any + Send + Sync>(&mut self) -> Option<R> {
        self.resources
            .remove(&TypeId::of::<R>())
            .and_then(|r| r.downcast::<R>().ok())
            .map(|r| *r)
    }

    /// Despawn every entity; resources are kept
    pub fn clear(&mut self) {
        self.entities.clear();
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32);
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32);
    impl Component for Velocity {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_spawn_and_components() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_component(e, Position(1.0)).unwrap();

        assert!(world.has_component::<Position>(e));
        assert!(!world.has_component::<Velocity>(e));
        assert_eq!(world.get_component::<Position>(e), Some(&Position(1.0)));

        world.get_component_mut::<Position>(e).unwrap().0 = 2.0;
        assert_eq!(world.remove_component::<Position>(e), Some(Position(2.0)));
        assert!(world.get_component::<Position>(e).is_none());
    }

    #[test]
    fn test_despawn_removes_components_and_rejects_stale() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_component(e, Position(1.0)).unwrap();

        assert!(world.despawn(e));
        assert!(!world.despawn(e));
        assert_eq!(world.count::<Position>(), 0);
        assert_eq!(world.add_component(e, Velocity(1.0)), Err(EcsError::DeadEntity(e)));

        // Reused slot does not inherit old components
        let reused = world.spawn();
        assert_eq!(reused.index(), e.index());
        assert!(world.get_component::<Position>(reused).is_none());
    }

    #[test]
    fn test_queries() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.add_component(a, Position(0.0)).unwrap();
        world.add_component(a, Velocity(1.0)).unwrap();
        world.add_component(a, Tag).unwrap();
        world.add_component(b, Position(5.0)).unwrap();
        world.add_component(c, Velocity(3.0)).unwrap();

        assert_eq!(world.query::<(Position,)>().len(), 2);

        let pairs = world.query::<(Position, Velocity)>();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, a);

        let triples = world.query::<(Position, Velocity, Tag)>();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].1 .1, &Velocity(1.0));
    }

    #[test]
    fn test_join_mut_integrates() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Position(0.0)).unwrap();
        world.add_component(a, Velocity(2.0)).unwrap();
        world.add_component(b, Position(10.0)).unwrap();

        world.join_mut::<Position, Velocity>(|_, p, v| p.0 += v.0 * 0.5);

        assert_eq!(world.get_component::<Position>(a), Some(&Position(1.0)));
        assert_eq!(world.get_component::<Position>(b), Some(&Position(10.0)));

        world.for_each_mut::<Position>(|_, p| p.0 = 0.0);
        assert!(world.query::<(Position,)>().iter().all(|(_, p)| p.0 == 0.0));
    }

    #[test]
    fn test_resources() {
        let mut world = World::new();
        assert!(world.insert_resource(5_u32).is_none());
        assert_eq!(world.insert_resource(6_u32), Some(5));
        *world.resource_mut::<u32>().unwrap() += 1;
        assert_eq!(world.resource::<u32>(), Some(&7));
        assert_eq!(world.remove_resource::<u32>(), Some(7));
        assert!(world.resource::<u32>().is_none());
    }

    #[test]
    fn test_clear_keeps_resources() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_component(e, Tag).unwrap();
        world.insert_resource(String::from("kept"));
        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_alive(e));
        assert_eq!(world.count::<Tag>(), 0);
        assert!(world.resource::<String>().is_some());
    }
}
