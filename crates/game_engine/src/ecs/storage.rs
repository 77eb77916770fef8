//! Sparse-set component storage
//!
//! Values are packed densely for iteration; `sparse` maps an entity index to
//! its dense slot. Removal swaps the last element into the hole.

use std::any::Any;

use super::{Component, Entity};

const EMPTY: usize = usize::MAX;

/// Storage for one component type
#[derive(Debug)]
pub struct ComponentStorage<T: Component> {
    sparse: Vec<usize>,
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T: Component> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let dense = *self.sparse.get(entity.index() as usize)?;
        (dense != EMPTY && self.entities[dense] == entity).then_some(dense)
    }

    /// Insert a component, returning the previous value for the entity
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(dense) = self.dense_index(entity) {
            return Some(std::mem::replace(&mut self.values[dense], value));
        }

        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, EMPTY);
        }

        // A stale generation may still occupy the slot
        if self.sparse[slot] != EMPTY {
            let stale = self.entities[self.sparse[slot]];
            self.remove(stale);
        }

        self.sparse[slot] = self.values.len();
        self.entities.push(entity);
        self.values.push(value);
        None
    }

    /// Remove the entity's component
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let dense = self.dense_index(entity)?;
        let last = self.values.len() - 1;

        self.entities.swap(dense, last);
        self.values.swap(dense, last);
        let moved = self.entities[dense];
        self.sparse[moved.index() as usize] = dense;

        self.sparse[entity.index() as usize] = EMPTY;
        self.entities.pop();
        self.values.pop()
    }

    /// Get the entity's component
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|dense| &self.values[dense])
    }

    /// Get the entity's component mutably
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(move |dense| &mut self.values[dense])
    }

    /// Whether the entity has this component
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Iterate `(entity, component)` pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(entity, component)` pairs mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Entities that own this component
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove all components
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a storage, used by the world for per-entity cleanup
pub(crate) trait ErasedStorage: Any + Send + Sync {
    fn remove_entity(&mut self, entity: Entity);
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn clear(&mut self) {
        ComponentStorage::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    fn entity(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn test_insert_replaces_and_returns_old() {
        let mut storage = ComponentStorage::new();
        assert_eq!(storage.insert(entity(3), Health(10)), None);
        assert_eq!(storage.insert(entity(3), Health(20)), Some(Health(10)));
        assert_eq!(storage.get(entity(3)), Some(&Health(20)));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_other_entries() {
        let mut storage = ComponentStorage::new();
        storage.insert(entity(0), Health(0));
        storage.insert(entity(1), Health(1));
        storage.insert(entity(2), Health(2));

        assert_eq!(storage.remove(entity(0)), Some(Health(0)));
        assert_eq!(storage.get(entity(2)), Some(&Health(2)));
        assert_eq!(storage.get(entity(1)), Some(&Health(1)));
        assert!(!storage.contains(entity(0)));
        assert_eq!(storage.remove(entity(0)), None);
    }

    #[test]
    fn test_stale_generation_is_not_found() {
        let mut storage = ComponentStorage::new();
        storage.insert(Entity::new(4, 0), Health(1));
        assert!(storage.get(Entity::new(4, 1)).is_none());

        storage.insert(Entity::new(4, 1), Health(2));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(Entity::new(4, 1)), Some(&Health(2)));
    }

    #[test]
    fn test_iter_mut() {
        let mut storage = ComponentStorage::new();
        storage.insert(entity(0), Health(1));
        storage.insert(entity(5), Health(2));
        for (_, health) in storage.iter_mut() {
            health.0 *= 10;
        }
        let total: i32 = storage.iter().map(|(_, h)| h.0).sum();
        assert_eq!(total, 30);
    }
}
