//! Transform component
//!
//! Pure data: position, rotation and scale in world space (Y-up,
//! right-handed). Math lives in `foundation::math::Transform`.

use crate::ecs::Component;
use crate::foundation::math::{Mat4, Quat, Transform as MathTransform, Vec3};

/// World-space transform of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// World space position
    pub position: Vec3,

    /// World space rotation
    pub rotation: Quat,

    /// Per-axis scale
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform at a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to the math transform
    pub fn to_math_transform(&self) -> MathTransform {
        MathTransform::new(self.position, self.rotation, self.scale)
    }

    /// Model matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        self.to_math_transform().to_matrix()
    }

    /// Local -Z axis in world space
    pub fn forward(&self) -> Vec3 {
        self.to_math_transform().forward()
    }

    /// Builder: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder: set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: set rotation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.rotation = Quat::from_euler_angles(roll, pitch, yaw);
        self
    }

    /// Builder: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }
}

impl From<MathTransform> for TransformComponent {
    fn from(transform: MathTransform) -> Self {
        Self {
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }
}
