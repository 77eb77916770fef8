//! Lighting system
//!
//! [`Light`] and [`LightingEnvironment`] are the scene-facing description.
//! [`MultiLightEnvironment`] is the fixed-capacity block handed to backends;
//! its layout is std140-friendly (every member is a 16-byte vector or a
//! group of four scalars).

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec3};

/// Maximum number of directional lights supported
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Maximum number of point lights supported
pub const MAX_POINT_LIGHTS: usize = 8;
/// Maximum number of spot lights supported
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Point and spot light attenuation `[constant, linear, quadratic]`
const ATTENUATION: [f32; 3] = [1.0, 0.22, 0.20];

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// Light position (for point/spot lights)
    pub position: Vec3,
    /// Light direction (for directional/spot lights)
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point/spot lights)
    pub range: f32,
    /// Inner cone angle for spot lights (in radians)
    pub inner_cone_angle: f32,
    /// Outer cone angle for spot lights (in radians)
    pub outer_cone_angle: f32,
}

impl Light {
    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: direction.normalize(),
            color,
            intensity,
            range: 0.0,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            color,
            intensity,
            range,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
        }
    }

    /// Create a spot light
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone_angle: f32,
        outer_cone_angle: f32,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction: direction.normalize(),
            color,
            intensity,
            range,
            inner_cone_angle,
            outer_cone_angle,
        }
    }
}

/// Lighting environment containing multiple lights
#[derive(Debug, Clone)]
pub struct LightingEnvironment {
    /// List of lights in the scene
    pub lights: Vec<Light>,
    /// Ambient light color
    pub ambient_color: Vec3,
    /// Ambient light intensity
    pub ambient_intensity: f32,
}

impl LightingEnvironment {
    /// Create a new empty lighting environment
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            ambient_color: Vec3::new(1.0, 1.0, 1.0),
            ambient_intensity: 0.1,
        }
    }

    /// Add a light to the environment
    pub fn add_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    /// Set ambient lighting
    pub fn with_ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    /// Warm indoor lighting
    pub fn indoor_warm() -> Self {
        Self::new()
            .with_ambient(Vec3::new(1.0, 0.9, 0.8), 0.2)
            .add_light(Light::directional(
                Vec3::new(-0.3, -1.0, -0.5),
                Vec3::new(1.0, 0.95, 0.8),
                0.8,
            ))
            .add_light(Light::point(
                Vec3::new(2.0, 3.0, 2.0),
                Vec3::new(1.0, 0.9, 0.7),
                1.0,
                10.0,
            ))
    }

    /// Outdoor daylight
    pub fn outdoor_daylight() -> Self {
        Self::new()
            .with_ambient(Vec3::new(0.5, 0.7, 1.0), 0.3)
            .add_light(Light::directional(
                Vec3::new(-0.2, -1.0, -0.3),
                Vec3::new(1.0, 1.0, 0.9),
                1.0,
            ))
    }

    /// Pack into the fixed-capacity block
    pub fn to_multi_light(&self) -> MultiLightEnvironment {
        MultiLightEnvironment::from_lights(&self.lights, self.ambient_color, self.ambient_intensity)
    }
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Header with ambient lighting and light counts
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MultiLightHeader {
    /// Ambient light color and intensity [R, G, B, intensity]
    pub ambient_color: [f32; 4],
    /// Number of active directional lights
    pub directional_light_count: u32,
    /// Number of active point lights
    pub point_light_count: u32,
    /// Number of active spot lights
    pub spot_light_count: u32,
    /// Padding for std140 alignment
    pub _padding: u32,
}

/// Directional light data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightData {
    /// Light direction and intensity [x, y, z, intensity]
    pub direction: [f32; 4],
    /// Light color [r, g, b, padding]
    pub color: [f32; 4],
}

/// Point light data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    /// Light position and range [x, y, z, range]
    pub position: [f32; 4],
    /// Light color and intensity [r, g, b, intensity]
    pub color: [f32; 4],
    /// Attenuation factors [constant, linear, quadratic, padding]
    pub attenuation: [f32; 4],
}

/// Spot light data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightData {
    /// Light position and range [x, y, z, range]
    pub position: [f32; 4],
    /// Light direction and intensity [x, y, z, intensity]
    pub direction: [f32; 4],
    /// Light color [r, g, b, padding]
    pub color: [f32; 4],
    /// Cone angles [inner_angle, outer_angle, unused, unused]
    pub cone_angles: [f32; 4],
}

/// Multi-light environment structure containing all light types
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MultiLightEnvironment {
    /// Header with ambient lighting and light counts
    pub header: MultiLightHeader,
    /// Array of directional light data
    pub directional_lights: [DirectionalLightData; MAX_DIRECTIONAL_LIGHTS],
    /// Array of point light data
    pub point_lights: [PointLightData; MAX_POINT_LIGHTS],
    /// Array of spot light data
    pub spot_lights: [SpotLightData; MAX_SPOT_LIGHTS],
}

impl MultiLightEnvironment {
    /// Create new empty multi-light environment
    pub fn new() -> Self {
        let mut env = Self::zeroed();
        env.header.ambient_color = [0.1, 0.1, 0.1, 0.1];
        env
    }

    /// Pack lights by type
    ///
    /// When a type has more lights than slots, the brightest ones win; ties
    /// keep the input order.
    pub fn from_lights(lights: &[Light], ambient_color: Vec3, ambient_intensity: f32) -> Self {
        let mut env = Self::new();
        env.header.ambient_color = [ambient_color.x, ambient_color.y, ambient_color.z, ambient_intensity];

        let directional = Self::select(lights, LightType::Directional, MAX_DIRECTIONAL_LIGHTS);
        for (slot, light) in directional.iter().enumerate() {
            env.directional_lights[slot] = DirectionalLightData {
                direction: [light.direction.x, light.direction.y, light.direction.z, light.intensity],
                color: [light.color.x, light.color.y, light.color.z, 0.0],
            };
        }

        let points = Self::select(lights, LightType::Point, MAX_POINT_LIGHTS);
        for (slot, light) in points.iter().enumerate() {
            env.point_lights[slot] = PointLightData {
                position: [light.position.x, light.position.y, light.position.z, light.range],
                color: [light.color.x, light.color.y, light.color.z, light.intensity],
                attenuation: [ATTENUATION[0], ATTENUATION[1], ATTENUATION[2], 0.0],
            };
        }

        let spots = Self::select(lights, LightType::Spot, MAX_SPOT_LIGHTS);
        for (slot, light) in spots.iter().enumerate() {
            env.spot_lights[slot] = SpotLightData {
                position: [light.position.x, light.position.y, light.position.z, light.range],
                direction: [light.direction.x, light.direction.y, light.direction.z, light.intensity],
                color: [light.color.x, light.color.y, light.color.z, 0.0],
                cone_angles: [light.inner_cone_angle, light.outer_cone_angle, 0.0, 0.0],
            };
        }

        env.header.directional_light_count = directional.len() as u32;
        env.header.point_light_count = points.len() as u32;
        env.header.spot_light_count = spots.len() as u32;
        env
    }

    fn select(lights: &[Light], light_type: LightType, capacity: usize) -> Vec<&Light> {
        let mut selected: Vec<&Light> = lights.iter().filter(|l| l.light_type == light_type).collect();
        if selected.len() > capacity {
            log::warn!(
                "{} {:?} lights exceed the limit of {}, dropping the dimmest",
                selected.len(),
                light_type,
                capacity
            );
            // Stable sort keeps input order among equal intensities
            selected.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
            selected.truncate(capacity);
        }
        selected
    }

    /// Total number of packed lights
    pub fn light_count(&self) -> usize {
        (self.header.directional_light_count + self.header.point_light_count + self.header.spot_light_count) as usize
    }

    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Lambert lighting at a surface point, matching what the shaders compute
    ///
    /// Returns the RGB light reaching the point, ambient included.
    pub fn evaluate_at(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let normal = normal.normalize();
        let [ar, ag, ab, ai] = self.header.ambient_color;
        let mut result = Vec3::new(ar, ag, ab) * ai;

        for light in &self.directional_lights[..self.header.directional_light_count as usize] {
            let [dx, dy, dz, intensity] = light.direction;
            let to_light = -Vec3::new(dx, dy, dz);
            let n_dot_l = normal.dot(&to_light).max(0.0);
            result += rgb(light.color) * intensity * n_dot_l;
        }

        for light in &self.point_lights[..self.header.point_light_count as usize] {
            let [px, py, pz, range] = light.position;
            let intensity = light.color[3];
            if let Some((to_light, falloff)) = attenuate(Vec3::new(px, py, pz), range, light.attenuation, point) {
                let n_dot_l = normal.dot(&to_light).max(0.0);
                result += rgb(light.color) * intensity * falloff * n_dot_l;
            }
        }

        for light in &self.spot_lights[..self.header.spot_light_count as usize] {
            let [px, py, pz, range] = light.position;
            let [dx, dy, dz, intensity] = light.direction;
            let attenuation = [ATTENUATION[0], ATTENUATION[1], ATTENUATION[2], 0.0];
            if let Some((to_light, falloff)) = attenuate(Vec3::new(px, py, pz), range, attenuation, point) {
                let cos_theta = (-to_light).dot(&Vec3::new(dx, dy, dz));
                let cos_inner = light.cone_angles[0].cos();
                let cos_outer = light.cone_angles[1].cos();
                let cone = utils::smoothstep(cos_outer, cos_inner, cos_theta);
                let n_dot_l = normal.dot(&to_light).max(0.0);
                result += rgb(light.color) * intensity * falloff * cone * n_dot_l;
            }
        }

        result
    }
}

impl Default for MultiLightEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn rgb(color: [f32; 4]) -> Vec3 {
    Vec3::new(color[0], color[1], color[2])
}

/// Direction to the light and distance falloff, or `None` outside its range
fn attenuate(position: Vec3, range: f32, attenuation: [f32; 4], point: Vec3) -> Option<(Vec3, f32)> {
    let offset = position - point;
    let distance = offset.norm();
    if distance >= range || distance <= f32::EPSILON {
        return None;
    }
    let [constant, linear, quadratic, _] = attenuation;
    let falloff = (1.0 - distance / range) / (constant + linear * distance + quadratic * distance * distance);
    Some((offset / distance, falloff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unlit_env(lights: &[Light]) -> MultiLightEnvironment {
        MultiLightEnvironment::from_lights(lights, Vec3::zeros(), 0.0)
    }

    #[test]
    fn test_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<MultiLightHeader>(), 32);
        assert_eq!(std::mem::size_of::<DirectionalLightData>(), 32);
        assert_eq!(std::mem::size_of::<PointLightData>(), 48);
        assert_eq!(std::mem::size_of::<SpotLightData>(), 64);
        assert_eq!(
            MultiLightEnvironment::new().as_bytes().len(),
            32 + 4 * 32 + 8 * 48 + 4 * 64
        );
    }

    #[test]
    fn test_excess_lights_keep_brightest() {
        let lights: Vec<Light> = (0..6)
            .map(|i| Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), i as f32))
            .collect();
        let env = unlit_env(&lights);

        assert_eq!(env.header.directional_light_count, 4);
        let kept: Vec<f32> = env.directional_lights.iter().map(|d| d.direction[3]).collect();
        assert_eq!(kept, vec![5.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_directional_lambert() {
        let env = unlit_env(&[Light::directional(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.5, 0.25),
            2.0,
        )]);

        let lit = env.evaluate_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(lit, Vec3::new(2.0, 1.0, 0.5), epsilon = 1e-5);

        let back = env.evaluate_at(Vec3::zeros(), Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(back, Vec3::zeros());
    }

    #[test]
    fn test_point_light_range() {
        let env = unlit_env(&[Light::point(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0)]);
        let up = Vec3::new(0.0, 1.0, 0.0);

        let near = env.evaluate_at(Vec3::zeros(), up);
        let far = env.evaluate_at(Vec3::new(0.0, -2.0, 0.0), up);
        let outside = env.evaluate_at(Vec3::new(0.0, -10.0, 0.0), up);

        assert!(near.x > far.x);
        assert!(far.x > 0.0);
        assert_relative_eq!(outside, Vec3::zeros());
    }

    #[test]
    fn test_spot_cone() {
        let spot = Light::spot(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            1.0,
            10.0,
            0.2,
            0.3,
        );
        let env = unlit_env(&[spot]);
        let up = Vec3::new(0.0, 1.0, 0.0);

        assert!(env.evaluate_at(Vec3::zeros(), up).x > 0.0);
        // Well outside the outer cone
        assert_relative_eq!(env.evaluate_at(Vec3::new(3.0, 0.0, 0.0), up), Vec3::zeros());
    }

    #[test]
    fn test_presets_pack_ambient() {
        let env = LightingEnvironment::indoor_warm().to_multi_light();
        assert_eq!(env.light_count(), 2);
        assert_relative_eq!(env.header.ambient_color[3], 0.2);
    }
}
