//! Light component
//!
//! Pure data. `LightingSystem` turns enabled lights into the packed
//! per-frame light block.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::render::lighting::{Light, LightType};

/// Light attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    /// Directional, point or spot
    pub light_type: LightType,
    /// RGB color (0.0 to 1.0)
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// World-space direction for directional and spot lights
    pub direction: Vec3,
    /// World-space position, used when the entity has no transform
    pub position: Vec3,
    /// Range for point and spot lights
    pub range: f32,
    /// Inner cone angle for spot lights (radians)
    pub inner_cone: f32,
    /// Outer cone angle for spot lights (radians)
    pub outer_cone: f32,
    /// Disabled lights are ignored
    pub enabled: bool,
}

impl Component for LightComponent {}

impl LightComponent {
    /// Renderer light at the given world position
    pub fn to_light(&self, position: Vec3) -> Light {
        Light {
            light_type: self.light_type,
            position,
            direction: self.direction,
            color: self.color,
            intensity: self.intensity,
            range: self.range,
            inner_cone_angle: self.inner_cone,
            outer_cone_angle: self.outer_cone,
        }
    }
}

/// Factory functions for light components
pub struct LightFactory;

impl LightFactory {
    /// Directional light with a world-space direction
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> LightComponent {
        LightComponent {
            light_type: LightType::Directional,
            color,
            intensity,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vec3::y()),
            position: Vec3::zeros(),
            range: 0.0,
            inner_cone: 0.0,
            outer_cone: 0.0,
            enabled: true,
        }
    }

    /// Point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> LightComponent {
        LightComponent {
            light_type: LightType::Point,
            color,
            intensity,
            direction: Vec3::zeros(),
            position,
            range,
            inner_cone: 0.0,
            outer_cone: 0.0,
            enabled: true,
        }
    }

    /// Spot light; cone angles in radians
    ///
    /// The outer cone is raised to the inner cone if given smaller.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> LightComponent {
        LightComponent {
            light_type: LightType::Spot,
            color,
            intensity,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vec3::y()),
            position,
            range,
            inner_cone,
            outer_cone: outer_cone.max(inner_cone),
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_normalizes_direction() {
        let light = LightFactory::directional(Vec3::new(0.0, -4.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert_relative_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert!(light.enabled);
    }

    #[test]
    fn test_spot_cone_is_ordered() {
        let light = LightFactory::spot(Vec3::zeros(), -Vec3::z(), Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0, 0.5, 0.2);
        assert_eq!(light.outer_cone, 0.5);
        let converted = light.to_light(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(converted.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(converted.light_type, LightType::Spot);
    }
}
