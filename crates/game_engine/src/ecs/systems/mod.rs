//! ECS systems

pub mod lighting;
pub mod movement;
pub mod renderable_collector;

pub use lighting::LightingSystem;
pub use movement::MovementSystem;
pub use renderable_collector::{CollectStats, RenderableCollector, FALLBACK_MATERIAL};
