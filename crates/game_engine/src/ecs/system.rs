//! System trait and implementations

use thiserror::Error;

use super::World;

/// System execution phases with explicit ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemPhase {
    /// Input processing, entity lifecycle management
    PreUpdate = 0,
    /// Game logic, runs once per fixed step
    Update = 1,
    /// Transform and state fix-ups after game logic
    PostUpdate = 2,
    /// Render data extraction
    Render = 3,
}

impl SystemPhase {
    /// All phases in execution order
    pub const ALL: [Self; 4] = [Self::PreUpdate, Self::Update, Self::PostUpdate, Self::Render];
}

/// Errors raised by a running system
#[derive(Error, Debug)]
pub enum SystemError {
    /// A resource the system needs is not in the world
    #[error("System '{system}' requires missing resource {resource}")]
    MissingResource {
        /// System name
        system: String,
        /// Resource type name
        resource: &'static str,
    },

    /// Any other failure
    #[error("System '{system}' failed: {message}")]
    Failed {
        /// System name
        system: String,
        /// What went wrong
        message: String,
    },
}

/// System trait for processing entities and components
pub trait System {
    /// Unique name, used for dependency declarations
    fn name(&self) -> &str;

    /// Which phase this system belongs to
    fn phase(&self) -> SystemPhase {
        SystemPhase::Update
    }

    /// Names of systems in the same phase that must run before this one
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Run the system
    fn run(&mut self, world: &mut World, delta_time: f32) -> Result<(), SystemError>;
}
