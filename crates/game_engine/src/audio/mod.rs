//! Audio system
//!
//! [`AudioSystem`] ties together a playback backend, the volume mixer, the
//! sound bank registry and listener-relative spatialization. With audio
//! disabled every call succeeds without doing anything.

pub mod backend;
pub mod mixer;
pub mod sound_manager;
pub mod spatial;

use std::collections::HashMap;

use thiserror::Error;

pub use backend::{create_backend, AudioBackend, AudioBackendConfig, NullBackend, SoundHandle};
pub use mixer::{MixerSystem, VolumeGroup};
pub use sound_manager::{SoundBankManifest, SoundData, SoundId, SoundManager};
pub use spatial::{SpatialAudio, SpatialConfig};

use crate::assets::AssetError;
use crate::config::AudioConfig;
use crate::ecs::components::{AudioSourceComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;

/// Audio errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// Backend used before `initialize`
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Output device could not be opened
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Decoding or playback failed
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Handle does not refer to a live sound
    #[error("Invalid sound handle")]
    InvalidHandle,

    /// No loaded sound has this id
    #[error("Sound not found: {0}")]
    SoundNotFound(String),

    /// Sound bank manifest could not be parsed
    #[error("Invalid sound bank manifest: {0}")]
    InvalidManifest(String),

    /// Loading sound files failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Options for starting a sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Source volume before mixing
    pub volume: f32,
    /// Restart when finished
    pub looping: bool,
    /// World position for spatial playback
    pub position: Option<Vec3>,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
            position: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveSound {
    group: VolumeGroup,
    volume: f32,
    position: Option<Vec3>,
    paused: bool,
}

/// Audio façade used by the engine
pub struct AudioSystem {
    enabled: bool,
    backend: Box<dyn AudioBackend>,
    mixer: MixerSystem,
    sounds: SoundManager,
    spatial: SpatialAudio,
    active: HashMap<SoundHandle, ActiveSound>,
    sources: HashMap<Entity, SoundHandle>,
}

impl AudioSystem {
    /// Create the audio system over an already initialized backend
    pub fn new(config: &AudioConfig, backend: Box<dyn AudioBackend>) -> Self {
        if config.enabled {
            log::info!("Audio enabled on the '{}' backend", backend.name());
        } else {
            log::info!("Audio disabled");
        }
        Self {
            enabled: config.enabled,
            backend,
            mixer: MixerSystem::from_config(config),
            sounds: SoundManager::new(),
            spatial: SpatialAudio::default(),
            active: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    /// Create the audio system with the default backend for this build
    pub fn from_config(config: &AudioConfig) -> Self {
        let backend = if config.enabled {
            create_backend(&AudioBackendConfig::from(config))
        } else {
            Box::new(NullBackend::new())
        };
        Self::new(config, backend)
    }

    /// Whether audio is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Playback backend
    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    /// Volume mixer
    pub fn mixer(&self) -> &MixerSystem {
        &self.mixer
    }

    /// Sound bank registry
    pub fn sounds(&self) -> &SoundManager {
        &self.sounds
    }

    /// Sound bank registry, mutably
    pub fn sounds_mut(&mut self) -> &mut SoundManager {
        &mut self.sounds
    }

    /// Listener state
    pub fn spatial(&self) -> &SpatialAudio {
        &self.spatial
    }

    /// Play a sound in a mixer group
    pub fn play(&mut self, sound_id: &str, group: VolumeGroup) -> Result<SoundHandle, AudioError> {
        self.play_with(sound_id, group, PlaybackOptions::default())
    }

    /// Play a sound at a world position
    pub fn play_at(&mut self, sound_id: &str, group: VolumeGroup, position: Vec3) -> Result<SoundHandle, AudioError> {
        self.play_with(
            sound_id,
            group,
            PlaybackOptions {
                position: Some(position),
                ..PlaybackOptions::default()
            },
        )
    }

    /// Play a sound with explicit options
    ///
    /// Returns [`SoundHandle::invalid`] when audio is disabled.
    pub fn play_with(&mut self, sound_id: &str, group: VolumeGroup, options: PlaybackOptions) -> Result<SoundHandle, AudioError> {
        if !self.enabled {
            return Ok(SoundHandle::invalid());
        }
        let data = self
            .sounds
            .get(sound_id)
            .ok_or_else(|| AudioError::SoundNotFound(sound_id.to_string()))?;
        let handle = self.backend.play_sound(data.bytes(), options.looping)?;

        let sound = ActiveSound {
            group,
            volume: options.volume.clamp(0.0, 1.0),
            position: options.position,
            paused: false,
        };
        self.apply(handle, &sound)?;
        self.active.insert(handle, sound);
        log::trace!("Playing '{sound_id}' as {handle:?} in {group:?}");
        Ok(handle)
    }

    /// Pause a sound
    pub fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        self.backend.pause(handle)?;
        if let Some(sound) = self.active.get_mut(&handle) {
            sound.paused = true;
        }
        Ok(())
    }

    /// Resume a paused sound
    pub fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        self.backend.resume(handle)?;
        if let Some(sound) = self.active.get_mut(&handle) {
            sound.paused = false;
        }
        Ok(())
    }

    /// Stop a sound
    pub fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        self.active.remove(&handle);
        self.backend.stop(handle)
    }

    /// Stop every sound
    pub fn stop_all(&mut self) {
        self.active.clear();
        self.sources.clear();
        self.backend.stop_all();
    }

    /// Move a positioned sound
    pub fn set_sound_position(&mut self, handle: SoundHandle, position: Vec3) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        let sound = self.active.get_mut(&handle).ok_or(AudioError::InvalidHandle)?;
        sound.position = Some(position);
        let sound = *sound;
        self.apply(handle, &sound)
    }

    /// Set a group level and re-apply volume to its live sounds
    pub fn set_group_volume(&mut self, group: VolumeGroup, volume: f32) -> Result<(), AudioError> {
        self.mixer.set_group_volume(group, volume);
        self.refresh(|sound| group == VolumeGroup::Master || sound.group == group)
    }

    /// Mute or unmute a group
    pub fn set_group_muted(&mut self, group: VolumeGroup, muted: bool) -> Result<(), AudioError> {
        if muted {
            self.mixer.mute_group(group);
        } else {
            self.mixer.unmute_group(group);
        }
        self.refresh(|sound| group == VolumeGroup::Master || sound.group == group)
    }

    /// Move and orient the listener
    pub fn set_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        self.spatial.set_listener(position, forward, up);
    }

    /// Per-frame maintenance
    ///
    /// Drops finished sounds and re-applies spatial volume and pan for the
    /// current listener.
    pub fn update(&mut self) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        self.backend.update();
        let backend = self.backend.as_ref();
        self.active
            .retain(|&handle, sound| sound.paused || backend.is_playing(handle));
        self.sources.retain(|_, handle| self.active.contains_key(handle));
        self.refresh(|sound| sound.position.is_some())
    }

    /// Start and track sounds for `AudioSourceComponent`s
    ///
    /// Autoplay sources without a live sound are started, spatial sources
    /// follow their entity's transform, and sounds whose entity lost its
    /// source are stopped. A source whose sound is missing has autoplay
    /// switched off so the warning is not repeated every frame.
    pub fn sync_sources(&mut self, world: &mut World) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }

        let orphaned: Vec<Entity> = self
            .sources
            .keys()
            .copied()
            .filter(|&entity| !world.has_component::<AudioSourceComponent>(entity))
            .collect();
        for entity in orphaned {
            if let Some(handle) = self.sources.remove(&entity) {
                self.stop(handle)?;
            }
        }

        let positions: HashMap<Entity, Vec3> = world
            .query::<(AudioSourceComponent, TransformComponent)>()
            .into_iter()
            .map(|(entity, (_, transform))| (entity, transform.position))
            .collect();

        let mut result = Ok(());
        world.for_each_mut::<AudioSourceComponent>(|entity, source| {
            let position = positions.get(&entity).copied().filter(|_| source.spatial);

            // A replaced component no longer owns the sound tracked for it
            if let Some(&tracked) = self.sources.get(&entity) {
                if source.playing != Some(tracked) {
                    self.sources.remove(&entity);
                    if let Err(err) = self.stop(tracked) {
                        result = Err(err);
                    }
                }
            }

            if let Some(handle) = source.playing {
                if !self.active.contains_key(&handle) {
                    source.playing = None;
                    self.sources.remove(&entity);
                } else if let Some(position) = position {
                    if let Err(err) = self.set_sound_position(handle, position) {
                        result = Err(err);
                    }
                }
                return;
            }

            if !source.autoplay {
                return;
            }
            let options = PlaybackOptions {
                volume: source.volume,
                looping: source.looping,
                position,
            };
            match self.play_with(&source.sound_id, source.group, options) {
                Ok(handle) => {
                    source.playing = Some(handle);
                    // One-shot sources play once
                    source.autoplay = source.looping;
                    self.sources.insert(entity, handle);
                }
                Err(AudioError::SoundNotFound(id)) => {
                    log::warn!("{entity:?}: audio source sound '{id}' is not loaded");
                    source.autoplay = false;
                }
                Err(err) => result = Err(err),
            }
        });
        result
    }

    /// Stop everything and close the backend
    pub fn shutdown(&mut self) {
        self.stop_all();
        self.backend.shutdown();
    }

    fn refresh(&mut self, filter: impl Fn(&ActiveSound) -> bool) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        let targets: Vec<(SoundHandle, ActiveSound)> = self
            .active
            .iter()
            .filter(|(_, sound)| filter(sound))
            .map(|(&handle, &sound)| (handle, sound))
            .collect();
        for (handle, sound) in targets {
            self.apply(handle, &sound)?;
        }
        Ok(())
    }

    fn apply(&mut self, handle: SoundHandle, sound: &ActiveSound) -> Result<(), AudioError> {
        let mut volume = sound.volume * self.mixer.effective_volume(sound.group);
        if let Some(position) = sound.position {
            volume *= self.spatial.attenuation(position);
            self.backend.set_pan(handle, self.spatial.pan(position))?;
        }
        self.backend.set_volume(handle, volume)
    }
}
