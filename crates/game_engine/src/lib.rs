//! # Game Engine
//!
//! A small modular 3D game engine.
//!
//! ## Layers
//!
//! - **Platform**: window and event source behind the [`platform::Platform`] trait
//! - **Foundation**: math (via `mdcla`), handles, allocators, timing, logging
//! - **ECS**: entities, typed component storage, phased system scheduling
//! - **Assets**: typed handles, search paths, OBJ/MTL, images, hot reload
//! - **Render**: cameras, shaders, lights, materials, instanced batching
//! - **Input / Audio**: keyboard and mouse state, action maps, mixed sound
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use game_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let camera = engine.world_mut().spawn();
//!         engine.world_mut().add_component(camera, CameraComponent::default()).map_err(|e| AppError::Custom(e.to_string()))?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         if engine.action_active("quit") {
//!             engine.quit();
//!         }
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut platform = HeadlessPlatform::new(1280, 720).with_frame_limit(600);
//!     Engine::run(EngineConfig::default(), &mut MyApp, &mut platform)?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

pub mod assets;
pub mod audio;
pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod input;
pub mod platform;
pub mod render;

mod application;
mod engine;

pub use application::{AppError, AppEvent, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Asset, AssetError, AssetHandle, AssetManager},
        audio::{AudioSystem, VolumeGroup},
        config::{Config, EngineConfig},
        ecs::components::{
            AudioSourceComponent, CameraComponent, LightComponent, LightFactory, MovementComponent, MovementFactory,
            NameComponent, RenderableComponent, TransformComponent,
        },
        ecs::{Component, Entity, System, SystemPhase, World},
        foundation::{
            math::{Quat, Transform, Vec3},
            time::{Stopwatch, Timer},
        },
        input::{InputManager, KeyCode, MouseButton},
        platform::{HeadlessPlatform, Platform},
        render::{Camera, Material, MaterialId, Mesh, Renderer},
        AppError, AppEvent, Application, Engine, EngineError,
    };
}
