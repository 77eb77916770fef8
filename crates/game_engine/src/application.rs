//! Application lifecycle
//!
//! The engine owns the loop; an [`Application`] is called back at fixed
//! points of each frame.

use thiserror::Error;

use crate::assets::AssetError;
use crate::audio::AudioError;
use crate::engine::{Engine, EngineError};

pub use crate::platform::AppEvent;

/// Game code driven by [`Engine::run`]
pub trait Application {
    /// One-time setup before the first frame: spawn entities, load assets,
    /// register systems
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Fixed-rate simulation step
    ///
    /// Called zero or more times per frame, each time followed by the
    /// `Update` phase systems. `step` is the fixed step length in seconds.
    fn fixed_update(&mut self, _engine: &mut Engine, _step: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Variable-rate update, once per frame after the fixed steps
    ///
    /// `delta_time` is the frame time in seconds.
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Draw the frame; runs after the `Render` phase systems
    fn render(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        engine.render()
    }

    /// React to one platform event
    ///
    /// Overriding this without calling [`Engine::handle_event`] hides the
    /// event from input, resize and close handling.
    fn handle_event(&mut self, engine: &mut Engine, event: AppEvent) -> Result<(), AppError> {
        engine.handle_event(event)
    }

    /// Shutdown hook; also runs when the main loop fails after a
    /// successful `initialize`
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Errors returned from application callbacks
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine call failed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Audio error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),

    /// Anything else
    #[error("Application error: {0}")]
    Custom(String),
}
