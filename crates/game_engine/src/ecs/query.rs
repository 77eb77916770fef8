//! Query system for component access
//!
//! Queries are tuples of component types. The first type drives iteration,
//! the others filter and fetch by entity.

use super::{Component, Entity, World};

/// Tuple of component types that can be fetched together
pub trait Query {
    /// References handed out per matching entity
    type Item<'w>;

    /// Collect every entity that has all queried components
    fn fetch(world: &World) -> Vec<(Entity, Self::Item<'_>)>;
}

impl<A: Component> Query for (A,) {
    type Item<'w> = &'w A;

    fn fetch(world: &World) -> Vec<(Entity, &A)> {
        world.storage::<A>().map(|a| a.iter().collect()).unwrap_or_default()
    }
}

impl<A: Component, B: Component> Query for (A, B) {
    type Item<'w> = (&'w A, &'w B);

    fn fetch(world: &World) -> Vec<(Entity, (&A, &B))> {
        let (Some(a), Some(b)) = (world.storage::<A>(), world.storage::<B>()) else {
            return Vec::new();
        };
        a.iter()
            .filter_map(|(entity, va)| b.get(entity).map(|vb| (entity, (va, vb))))
            .collect()
    }
}

impl<A: Component, B: Component, C: Component> Query for (A, B, C) {
    type Item<'w> = (&'w A, &'w B, &'w C);

    fn fetch(world: &World) -> Vec<(Entity, (&A, &B, &C))> {
        let (Some(a), Some(b), Some(c)) = (world.storage::<A>(), world.storage::<B>(), world.storage::<C>())
        else {
            return Vec::new();
        };
        a.iter()
            .filter_map(|(entity, va)| {
                let vb = b.get(entity)?;
                let vc = c.get(entity)?;
                Some((entity, (va, vb, vc)))
            })
            .collect()
    }
}
