//! Translation / rotation / scale transforms

use crate::{Mat3, Mat4, Point3, Quat, Vec3};

/// Transform representing position, rotation, and scale
///
/// Composes as `T * R * S` when converted to a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform from all three parts
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose a TRS matrix
    ///
    /// Shear is not representable and is lost. A zero scale axis yields an
    /// identity rotation for that matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        if scale_x <= f32::EPSILON || scale_y <= f32::EPSILON || scale_z <= f32::EPSILON {
            return Self {
                position,
                rotation: Quat::identity(),
                scale,
            };
        }

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Apply this transform to a direction (ignores translation)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(&vector)
    }

    /// Combine this transform with a child transform (`self * other`)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&other.position),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Get the inverse transform
    ///
    /// Exact for uniform scale; non-uniform scale combined with rotation
    /// cannot be inverted into a single TRS.
    pub fn inverse(&self) -> Transform {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_scale.component_mul(&(inv_rotation * -self.position));

        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Local forward direction (-Z) in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Local right direction (+X) in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::new(1.0, 0.0, 0.0)
    }

    /// Local up direction (+Y) in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_roundtrip_preserves_rotation_and_translation() {
        let rotation = Quat::from_euler_angles(0.3, -1.1, 0.7);
        let original = Transform::new(Vec3::new(1.0, -2.0, 3.5), rotation, Vec3::new(2.0, 2.0, 2.0));

        let decomposed = Transform::from_matrix(original.to_matrix());

        assert_relative_eq!(decomposed.position, original.position, epsilon = 1e-5);
        assert_relative_eq!(decomposed.scale, original.scale, epsilon = 1e-5);
        assert!(decomposed.rotation.angle_to(&original.rotation) < 1e-3);
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let t = Transform::new(
            Vec3::new(0.5, 1.0, -4.0),
            Quat::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::new(1.0, 3.0, 2.0),
        );
        let p = Point3::new(1.0, 2.0, 3.0);

        let direct = t.transform_point(p);
        let via_matrix = t.to_matrix().transform_point(&p);

        assert_relative_eq!(direct, via_matrix, epsilon = 1e-5);
    }

    #[test]
    fn test_combine_with_inverse_is_identity() {
        let t = Transform::new(
            Vec3::new(3.0, -1.0, 2.0),
            Quat::from_euler_angles(0.4, 0.2, -0.9),
            Vec3::new(1.5, 1.5, 1.5),
        );

        let identity = t.combine(&t.inverse());

        assert_relative_eq!(identity.position, Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(identity.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
        assert!(identity.rotation.angle() < 1e-3);
    }

    #[test]
    fn test_combine_matches_matrix_product() {
        let parent = Transform::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_euler_angles(0.0, 0.5, 0.0),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let child = Transform::from_position(Vec3::new(0.0, 1.0, 1.0));

        let combined = parent.combine(&child).to_matrix();
        let product = parent.to_matrix() * child.to_matrix();

        assert_relative_eq!(combined, product, epsilon = 1e-5);
    }

    #[test]
    fn test_directions_follow_rotation() {
        let t = Transform::from_position_rotation(
            Vec3::zeros(),
            Quat::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0),
        );

        // +90 degrees about Y turns -Z forward towards -X
        assert_relative_eq!(t.forward(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(t.up(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_from_matrix_with_zero_scale() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));
        let t = Transform::from_matrix(m);
        assert_eq!(t.rotation, Quat::identity());
        assert_relative_eq!(t.scale.x, 0.0);
    }
}
