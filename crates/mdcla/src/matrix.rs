//! Projection, view and rotation matrix construction

use crate::{Mat4, Vec3};

/// Extension trait for Mat4 with graphics convenience constructors
///
/// View space is right-handed and Y-up with the camera looking down -Z.
/// Projection matrices expect the clip correction (`X`) to be applied first,
/// which turns view-space -Z into +Z, so a full chain is `P * X * V`.
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a perspective projection matrix with `[0, 1]` depth
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix with `[0, 1]` depth
    ///
    /// `height` is the full vertical extent of the view volume.
    fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Clip correction matrix flipping Y and Z into the Y-down, Z-forward
    /// clip convention
    fn clip_correction() -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let half_height = height * 0.5;
        let half_width = half_height * aspect;

        let mut result = Mat4::identity();
        result[(0, 0)] = 1.0 / half_width;
        result[(1, 1)] = 1.0 / half_height;
        result[(2, 2)] = 1.0 / (far - near);
        result[(2, 3)] = -near / (far - near);
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        // Looking along `up` leaves the cross product degenerate
        let right = forward
            .cross(&up)
            .try_normalize(1.0e-6)
            .or_else(|| forward.cross(&Vec3::z()).try_normalize(1.0e-6))
            .unwrap_or_else(Vec3::x);
        let camera_up = right.cross(&forward);

        let translation = Mat4::new_translation(&-eye);

        #[rustfmt::skip]
        let rotation = Mat4::new(
            right.x,      right.y,      right.z,      0.0,
            camera_up.x,  camera_up.y,  camera_up.z,  0.0,
            -forward.x,   -forward.y,   -forward.z,   0.0,
            0.0,          0.0,          0.0,          1.0,
        );

        rotation * translation
    }

    fn clip_correction() -> Mat4 {
        #[rustfmt::skip]
        let m = Mat4::new(
            1.0,  0.0,  0.0, 0.0,
            0.0, -1.0,  0.0, 0.0,
            0.0,  0.0, -1.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
        );
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point3, Vec4};
    use approx::assert_relative_eq;

    fn project(m: &Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_look_at_moves_target_onto_negative_z() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y());
        let p = view.transform_point(&Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_straight_down_along_up() {
        let view = Mat4::look_at(Vec3::new(0.0, 20.0, 0.0), Vec3::zeros(), Vec3::y());
        assert!(view.iter().all(|v| v.is_finite()));

        let p = view.transform_point(&Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(0.0, 0.0, -20.0), epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let (near, far) = (0.5, 50.0);
        let chain = Mat4::perspective(1.0, 1.5, near, far) * Mat4::clip_correction();

        let at_near = project(&chain, Vec3::new(0.0, 0.0, -near));
        let at_far = project(&chain, Vec3::new(0.0, 0.0, -far));

        assert_relative_eq!(at_near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(at_far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_clip_correction_flips_y() {
        let chain = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 10.0)
            * Mat4::clip_correction();
        // A point above the view axis ends up with negative clip Y
        let above = project(&chain, Vec3::new(0.0, 1.0, -2.0));
        assert!(above.y < 0.0);
    }

    #[test]
    fn test_orthographic_maps_extents_to_ndc() {
        let chain = Mat4::orthographic(10.0, 2.0, 1.0, 11.0) * Mat4::clip_correction();
        let corner = project(&chain, Vec3::new(10.0, 5.0, -11.0));
        assert_relative_eq!(corner, Vec3::new(1.0, -1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let m = Mat4::rotation_y(std::f32::consts::FRAC_PI_2);
        let v = m.transform_vector(&Vec3::x());
        assert_relative_eq!(v, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }
}
