//! Name component

use std::fmt;

use crate::ecs::{Component, Entity, World};

/// Human-readable entity name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameComponent(pub String);

impl Component for NameComponent {}

impl NameComponent {
    /// Create a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// First entity with the given name
    pub fn find(world: &World, name: &str) -> Option<Entity> {
        world
            .query::<(Self,)>()
            .into_iter()
            .find(|(_, n)| n.0 == name)
            .map(|(entity, _)| entity)
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
