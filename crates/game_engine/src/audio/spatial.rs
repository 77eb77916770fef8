//! Spatial audio
//!
//! Listener-relative distance attenuation and stereo panning.

use crate::foundation::math::Vec3;

/// Distance attenuation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialConfig {
    /// Beyond this distance a sound is silent
    pub max_distance: f32,
    /// Within this distance there is no falloff
    pub reference_distance: f32,
    /// Falloff exponent (1.0 = linear, 2.0 = quadratic)
    pub falloff_exponent: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            reference_distance: 2.0,
            falloff_exponent: 1.0,
        }
    }
}

/// Listener state and attenuation math
#[derive(Debug, Clone)]
pub struct SpatialAudio {
    config: SpatialConfig,
    listener_position: Vec3,
    listener_forward: Vec3,
    listener_up: Vec3,
}

impl SpatialAudio {
    /// Listener at the origin facing -Z
    pub fn new(config: SpatialConfig) -> Self {
        Self {
            config,
            listener_position: Vec3::zeros(),
            listener_forward: -Vec3::z(),
            listener_up: Vec3::y(),
        }
    }

    /// Attenuation parameters
    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Move and orient the listener
    ///
    /// Degenerate directions keep the previous orientation.
    pub fn set_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        self.listener_position = position;
        if let (Some(forward), Some(up)) = (forward.try_normalize(f32::EPSILON), up.try_normalize(f32::EPSILON)) {
            if forward.cross(&up).norm() > f32::EPSILON {
                self.listener_forward = forward;
                self.listener_up = up;
            }
        }
    }

    /// Listener position
    pub fn listener_position(&self) -> Vec3 {
        self.listener_position
    }

    /// Volume factor in `[0, 1]` for a sound at `position`
    pub fn attenuation(&self, position: Vec3) -> f32 {
        let distance = (position - self.listener_position).norm();
        if distance > self.config.max_distance {
            return 0.0;
        }
        if distance <= self.config.reference_distance {
            return 1.0;
        }
        let span = self.config.max_distance - self.config.reference_distance;
        if span <= f32::EPSILON {
            return 0.0;
        }
        let normalized = (distance - self.config.reference_distance) / span;
        (1.0 - normalized.powf(self.config.falloff_exponent)).max(0.0)
    }

    /// Stereo pan in `[-1, 1]` for a sound at `position`
    ///
    /// Sounds on the listener are centered.
    pub fn pan(&self, position: Vec3) -> f32 {
        let Some(direction) = (position - self.listener_position).try_normalize(f32::EPSILON) else {
            return 0.0;
        };
        let right = self.listener_forward.cross(&self.listener_up).normalize();
        direction.dot(&right).clamp(-1.0, 1.0)
    }
}

impl Default for SpatialAudio {
    fn default() -> Self {
        Self::new(SpatialConfig::default())
    }
}
