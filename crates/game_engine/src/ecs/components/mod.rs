//! ECS components

pub mod audio;
pub mod camera;
pub mod lighting;
pub mod movement;
pub mod name;
pub mod renderable;
pub mod transform;

pub use audio::AudioSourceComponent;
pub use camera::CameraComponent;
pub use lighting::{LightComponent, LightFactory};
pub use movement::{MovementComponent, MovementFactory};
pub use name::NameComponent;
pub use renderable::RenderableComponent;
pub use transform::TransformComponent;
