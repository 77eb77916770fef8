//! Audio source component

use crate::audio::{SoundHandle, VolumeGroup};
use crate::ecs::Component;

/// Sound emitted by an entity
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSourceComponent {
    /// Sound id in the sound manager
    pub sound_id: String,
    /// Mixer group
    pub group: VolumeGroup,
    /// Source volume before mixing (0.0 to 1.0)
    pub volume: f32,
    /// Restart when finished
    pub looping: bool,
    /// Attenuate and pan by distance to the listener
    pub spatial: bool,
    /// Start playing as soon as the audio system sees the source
    pub autoplay: bool,
    /// Handle of the live sound, set by the audio system
    pub playing: Option<SoundHandle>,
}

impl Component for AudioSourceComponent {}

impl AudioSourceComponent {
    /// One-shot, non-spatial sound effect that plays immediately
    pub fn new(sound_id: impl Into<String>) -> Self {
        Self {
            sound_id: sound_id.into(),
            group: VolumeGroup::Sfx,
            volume: 1.0,
            looping: false,
            spatial: false,
            autoplay: true,
            playing: None,
        }
    }

    /// Builder: mixer group
    pub fn with_group(mut self, group: VolumeGroup) -> Self {
        self.group = group;
        self
    }

    /// Builder: volume, clamped to `[0, 1]`
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Builder: loop playback
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Builder: positional playback
    pub fn spatial(mut self) -> Self {
        self.spatial = true;
        self
    }
}
