//! Audio mixer
//!
//! Volume groups with independent level and mute. A sound's effective
//! volume is its group level times the master level, or zero when either
//! is muted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AudioConfig;

/// Volume group categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeGroup {
    /// Scales every other group
    Master,
    /// Sound effects
    Sfx,
    /// Background music
    Music,
    /// User interface sounds
    Ui,
    /// Ambient environmental sounds
    Ambient,
}

impl VolumeGroup {
    /// All groups
    pub const ALL: [Self; 5] = [Self::Master, Self::Sfx, Self::Music, Self::Ui, Self::Ambient];
}

/// Per-group volume and mute state
#[derive(Debug, Clone)]
pub struct MixerSystem {
    group_volumes: HashMap<VolumeGroup, f32>,
    group_muted: HashMap<VolumeGroup, bool>,
}

impl MixerSystem {
    /// Every group at full volume
    pub fn new() -> Self {
        Self {
            group_volumes: VolumeGroup::ALL.iter().map(|&g| (g, 1.0)).collect(),
            group_muted: HashMap::new(),
        }
    }

    /// Mixer with levels from the audio configuration
    pub fn from_config(config: &AudioConfig) -> Self {
        let mut mixer = Self::new();
        mixer.set_group_volume(VolumeGroup::Master, config.master_volume);
        mixer.set_group_volume(VolumeGroup::Music, config.music_volume);
        mixer.set_group_volume(VolumeGroup::Sfx, config.sfx_volume);
        mixer
    }

    /// Set a group level, clamped to `[0, 1]`
    pub fn set_group_volume(&mut self, group: VolumeGroup, volume: f32) {
        self.group_volumes.insert(group, volume.clamp(0.0, 1.0));
    }

    /// Level of a group
    pub fn group_volume(&self, group: VolumeGroup) -> f32 {
        self.group_volumes.get(&group).copied().unwrap_or(1.0)
    }

    /// Group level scaled by master, 0 when muted
    pub fn effective_volume(&self, group: VolumeGroup) -> f32 {
        if self.is_muted(group) || self.is_muted(VolumeGroup::Master) {
            return 0.0;
        }
        if group == VolumeGroup::Master {
            return self.group_volume(VolumeGroup::Master);
        }
        self.group_volume(group) * self.group_volume(VolumeGroup::Master)
    }

    /// Mute a group
    pub fn mute_group(&mut self, group: VolumeGroup) {
        self.group_muted.insert(group, true);
    }

    /// Unmute a group
    pub fn unmute_group(&mut self, group: VolumeGroup) {
        self.group_muted.insert(group, false);
    }

    /// Whether a group is muted
    pub fn is_muted(&self, group: VolumeGroup) -> bool {
        self.group_muted.get(&group).copied().unwrap_or(false)
    }

    /// Flip the mute state of a group
    pub fn toggle_mute(&mut self, group: VolumeGroup) {
        let muted = self.is_muted(group);
        self.group_muted.insert(group, !muted);
    }
}

impl Default for MixerSystem {
    fn default() -> Self {
        Self::new()
    }
}
