//! Silent backend
//!
//! Tracks sound state without an output device. Used for headless runs and
//! tests; sounds play until stopped or marked finished with `finish`.

use std::any::Any;
use std::collections::HashMap;

use super::{AudioBackend, AudioBackendConfig, SoundHandle};
use crate::audio::AudioError;

/// State of one silent sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NullSound {
    /// Encoded size in bytes
    pub size: usize,
    /// Current volume
    pub volume: f32,
    /// Current pan
    pub pan: f32,
    /// Looping flag
    pub looping: bool,
    /// Paused flag
    pub paused: bool,
    /// Finished sounds are dropped on the next `update`
    pub finished: bool,
}

/// Backend that plays nothing
#[derive(Debug, Default)]
pub struct NullBackend {
    sounds: HashMap<SoundHandle, NullSound>,
    next_id: u32,
    initialized: bool,
    total_played: usize,
}

impl NullBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a live sound
    pub fn sound(&self, handle: SoundHandle) -> Option<&NullSound> {
        self.sounds.get(&handle)
    }

    /// Mark a non-looping sound as finished, as if it reached its end
    pub fn finish(&mut self, handle: SoundHandle) {
        if let Some(sound) = self.sounds.get_mut(&handle) {
            if !sound.looping {
                sound.finished = true;
            }
        }
    }

    /// Sounds started since creation
    pub fn total_played(&self) -> usize {
        self.total_played
    }

    fn sound_mut(&mut self, handle: SoundHandle) -> Result<&mut NullSound, AudioError> {
        self.sounds.get_mut(&handle).ok_or(AudioError::InvalidHandle)
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        if !self.initialized {
            log::debug!(
                "Silent audio backend initialized ({} Hz, {} channels)",
                config.sample_rate,
                config.channels
            );
            self.initialized = true;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop_all();
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        self.sounds.retain(|_, sound| !sound.finished);
    }

    fn play_sound(&mut self, data: &[u8], looping: bool) -> Result<SoundHandle, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }
        if data.is_empty() {
            return Err(AudioError::PlaybackFailed("empty sound data".to_string()));
        }
        let handle = SoundHandle::new(self.next_id, 0);
        self.next_id = self.next_id.wrapping_add(1);
        self.sounds.insert(
            handle,
            NullSound {
                size: data.len(),
                volume: 1.0,
                pan: 0.0,
                looping,
                paused: false,
                finished: false,
            },
        );
        self.total_played += 1;
        Ok(handle)
    }

    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sound_mut(handle)?.paused = true;
        Ok(())
    }

    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sound_mut(handle)?.paused = false;
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sounds.remove(&handle);
        Ok(())
    }

    fn stop_all(&mut self) {
        self.sounds.clear();
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.sound_mut(handle)?.volume = volume.max(0.0);
        Ok(())
    }

    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        self.sounds
            .get(&handle)
            .map(|sound| sound.volume)
            .ok_or(AudioError::InvalidHandle)
    }

    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        self.sound_mut(handle)?.pan = pan.clamp(-1.0, 1.0);
        Ok(())
    }

    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError> {
        self.sound_mut(handle)?.looping = looping;
        Ok(())
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.sounds
            .get(&handle)
            .is_some_and(|sound| !sound.paused && !sound.finished)
    }

    fn active_count(&self) -> usize {
        self.sounds.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> NullBackend {
        let mut backend = NullBackend::new();
        backend.initialize(&AudioBackendConfig::default()).unwrap();
        backend
    }

    #[test]
    fn test_playback_without_initialization() {
        let mut backend = NullBackend::new();
        assert!(matches!(
            backend.play_sound(&[1, 2, 3], false),
            Err(AudioError::BackendNotInitialized)
        ));
    }

    #[test]
    fn test_pause_resume_and_finish() {
        let mut backend = backend();
        let handle = backend.play_sound(&[0; 16], false).unwrap();
        assert!(backend.is_playing(handle));

        backend.pause(handle).unwrap();
        assert!(!backend.is_playing(handle));
        backend.resume(handle).unwrap();
        assert!(backend.is_playing(handle));

        backend.finish(handle);
        backend.update();
        assert_eq!(backend.active_count(), 0);
    }

    #[test]
    fn test_looping_sounds_do_not_finish() {
        let mut backend = backend();
        let handle = backend.play_sound(&[0; 16], true).unwrap();
        backend.finish(handle);
        backend.update();
        assert!(backend.is_playing(handle));
    }

    #[test]
    fn test_invalid_handle_operations() {
        let mut backend = backend();
        let invalid = SoundHandle::new(999, 0);
        assert!(matches!(backend.pause(invalid), Err(AudioError::InvalidHandle)));
        assert!(matches!(backend.set_volume(invalid, 0.5), Err(AudioError::InvalidHandle)));
        assert!(matches!(backend.get_volume(invalid), Err(AudioError::InvalidHandle)));
        assert!(backend.stop(invalid).is_ok());
        assert!(!backend.is_playing(invalid));
    }
}
