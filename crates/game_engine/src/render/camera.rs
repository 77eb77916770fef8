//! 3D camera
//!
//! View space is right-handed and Y-up with the camera looking down -Z. The
//! view-projection chain is `P * X * V`, where `X` is the clip correction that
//! flips into the Y-down, `[0, 1]` depth clip convention.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Frustum, Mat4, Mat4Ext, Ray, Vec3, Vec4};

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
        /// Width / height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Full vertical extent of the view volume
        height: f32,
        /// Width / height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

impl Projection {
    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        match *self {
            Self::Perspective { aspect, .. } | Self::Orthographic { aspect, .. } => aspect,
        }
    }

    /// Near and far plane distances
    pub fn clip_planes(&self) -> (f32, f32) {
        match *self {
            Self::Perspective { near, far, .. } | Self::Orthographic { near, far, .. } => (near, far),
        }
    }
}

/// 3D camera with a look-at orientation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera looks at
    pub target: Vec3,

    /// Up vector (typically +Y)
    pub up: Vec3,

    /// Projection parameters
    pub projection: Projection,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            projection: Projection::Perspective {
                fov: utils::deg_to_rad(fov_degrees),
                aspect,
                near,
                far,
            },
        }
    }

    /// Create an orthographic camera looking at the origin
    pub fn orthographic(position: Vec3, height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            projection: Projection::Orthographic {
                height,
                aspect,
                near,
                far,
            },
        }
    }

    /// Point the camera at `target` with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Update the aspect ratio after a viewport change
    ///
    /// Non-positive or non-finite ratios (minimized windows) are ignored.
    pub fn set_aspect_ratio(&mut self, new_aspect: f32) {
        if !new_aspect.is_finite() || new_aspect <= 0.0 {
            log::debug!("Ignoring aspect ratio {new_aspect}");
            return;
        }
        match &mut self.projection {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => {
                if (*aspect - new_aspect).abs() > 0.01 {
                    log::debug!("Camera aspect ratio changed: {:.3} -> {new_aspect:.3}", *aspect);
                }
                *aspect = new_aspect;
            }
        }
    }

    /// Current aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.projection.aspect()
    }

    /// Unit view direction
    ///
    /// Falls back to -Z when position and target coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vec3::z())
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.forward(), self.up)
    }

    /// View-to-projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov, aspect, near, far } => Mat4::perspective(fov, aspect, near, far),
            Projection::Orthographic {
                height,
                aspect,
                near,
                far,
            } => Mat4::orthographic(height, aspect, near, far),
        }
    }

    /// Complete world-to-clip matrix, `P * X * V`
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * Mat4::clip_correction() * self.view_matrix()
    }

    /// World-space frustum for culling
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection_matrix())
    }

    /// Ray through a point on the screen
    ///
    /// Coordinates are NDC with x from -1 (left) to 1 (right) and y from -1
    /// (bottom) to 1 (top). Returns `None` when the camera matrices are
    /// degenerate.
    pub fn screen_to_world_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inverse = self.view_projection_matrix().try_inverse()?;

        // Clip space is Y-down; depth runs 0 (near) to 1 (far)
        let unproject = |depth: f32| {
            let h = inverse * Vec4::new(ndc_x, -ndc_y, depth, 1.0);
            (h.w.abs() > f32::EPSILON).then(|| h.xyz() / h.w)
        };
        let near = unproject(0.0)?;
        let far = unproject(1.0)?;

        let origin = match self.projection {
            Projection::Perspective { .. } => self.position,
            Projection::Orthographic { .. } => near,
        };
        Ray::try_new(origin, far - near)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 3.0, 3.0), 45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Aabb, Point3};
    use approx::assert_relative_eq;

    fn front_camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0)
    }

    fn to_ndc(m: &Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        clip.xyz() / clip.w
    }

    #[test]
    fn test_view_matrix_looks_down_negative_z() {
        let camera = front_camera();
        let p = camera.view_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
        assert_relative_eq!(camera.forward(), -Vec3::z());
    }

    #[test]
    fn test_view_projection_depth_range() {
        let camera = front_camera();
        let vp = camera.view_projection_matrix();
        let near = to_ndc(&vp, Vec3::new(0.0, 0.0, 5.0 - 0.1));
        let far = to_ndc(&vp, Vec3::new(0.0, 0.0, 5.0 - 100.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);

        // World up lands in the upper half, which is negative Y in clip space
        let above = to_ndc(&vp, Vec3::new(0.0, 1.0, 0.0));
        assert!(above.y < 0.0);
    }

    #[test]
    fn test_aspect_ratio_rejects_non_positive() {
        let mut camera = front_camera();
        camera.set_aspect_ratio(2.0);
        assert_eq!(camera.aspect_ratio(), 2.0);
        camera.set_aspect_ratio(0.0);
        camera.set_aspect_ratio(-1.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_center_ray_is_forward() {
        let camera = front_camera();
        let ray = camera.screen_to_world_ray(0.0, 0.0).unwrap();
        assert_relative_eq!(ray.origin, camera.position);
        assert_relative_eq!(ray.direction, -Vec3::z(), epsilon = 1e-4);

        let upper = camera.screen_to_world_ray(0.0, 1.0).unwrap();
        assert!(upper.direction.y > 0.0);
        // Top edge of a 60 degree view is 30 degrees above forward
        assert_relative_eq!(upper.direction.y.atan2(-upper.direction.z), 30f32.to_radians(), epsilon = 1e-3);
    }

    #[test]
    fn test_orthographic_rays_are_parallel() {
        let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 4.0, 1.0, 0.1, 50.0);
        let left = camera.screen_to_world_ray(-1.0, 0.0).unwrap();
        let right = camera.screen_to_world_ray(1.0, 0.0).unwrap();
        assert_relative_eq!(left.direction, right.direction, epsilon = 1e-5);
        assert_relative_eq!(left.origin.x, -2.0, epsilon = 1e-4);
        assert_relative_eq!(right.origin.x, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_frustum_culls_behind_camera() {
        let frustum = front_camera().frustum();
        let in_front = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        let behind = Aabb::new(Vec3::new(-0.5, -0.5, 8.0), Vec3::new(0.5, 0.5, 9.0));
        assert!(frustum.intersects_aabb(&in_front));
        assert!(!frustum.intersects_aabb(&behind));
    }

    #[test]
    fn test_top_down_camera_sees_below() {
        let camera = Camera::perspective(Vec3::new(0.0, 20.0, 0.0), 60.0, 1.0, 0.1, 100.0);
        assert!(camera.view_matrix().iter().all(|v| v.is_finite()));

        let cube = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        assert!(camera.frustum().intersects_aabb(&cube));
        assert_relative_eq!(camera.forward(), -Vec3::y(), epsilon = 1e-5);
    }
}
