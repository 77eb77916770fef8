//! Audio backend implementations
//!
//! Platform-independent abstraction over audio playback libraries.

pub mod null_backend;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

use std::any::Any;

use crate::audio::AudioError;
use crate::config::AudioConfig;

pub use null_backend::NullBackend;
#[cfg(feature = "rodio")]
pub use rodio_backend::RodioBackend;

/// Handle to a playing sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    /// Unique identifier for the sound
    pub id: u32,
    /// Generation counter for handle validation
    pub generation: u32,
}

impl SoundHandle {
    /// Create a handle
    pub fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }

    /// Handle that never refers to a sound; returned when audio is disabled
    pub fn invalid() -> Self {
        Self::new(u32::MAX, u32::MAX)
    }

    /// Whether this is not the invalid handle
    pub fn is_valid(&self) -> bool {
        *self != Self::invalid()
    }
}

/// Audio backend trait for platform abstraction
///
/// Not `Send`: the backend lives on the thread running the game loop.
pub trait AudioBackend {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Open the output device; calling twice is a no-op
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Stop everything and close the device
    fn shutdown(&mut self);

    /// Whether `initialize` succeeded
    fn is_initialized(&self) -> bool;

    /// Drop finished sounds
    fn update(&mut self);

    /// Start playing encoded sound data
    fn play_sound(&mut self, data: &[u8], looping: bool) -> Result<SoundHandle, AudioError>;

    /// Pause a playing sound
    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Resume a paused sound
    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Stop a sound; unknown handles are ignored
    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Stop all playing sounds
    fn stop_all(&mut self);

    /// Set volume of a sound (0.0 = silent, 1.0 = full)
    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError>;

    /// Volume of a sound
    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Set stereo pan, -1.0 (left) to 1.0 (right)
    ///
    /// Backends without panning ignore this.
    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        let _ = (handle, pan);
        Ok(())
    }

    /// Switch looping on or off
    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError>;

    /// Whether a sound is playing (not paused, not finished)
    fn is_playing(&self, handle: SoundHandle) -> bool;

    /// Number of live sounds, paused ones included
    fn active_count(&self) -> usize;

    /// Downcast to the concrete backend
    fn as_any(&self) -> &dyn Any;
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

impl From<&AudioConfig> for AudioBackendConfig {
    fn from(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}

/// Create the default backend for this build
///
/// With the `rodio` feature a device backend is tried first; when it cannot
/// open an output device the silent backend is used instead.
pub fn create_backend(config: &AudioBackendConfig) -> Box<dyn AudioBackend> {
    #[cfg(feature = "rodio")]
    {
        let mut backend = RodioBackend::new();
        match backend.initialize(config) {
            Ok(()) => return Box::new(backend),
            Err(err) => log::warn!("Audio device unavailable, falling back to silent output: {err}"),
        }
    }
    let mut backend = NullBackend::new();
    // The silent backend cannot fail to initialize
    let _ = backend.initialize(config);
    Box::new(backend)
}
