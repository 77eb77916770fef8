//! View frustum extraction and culling tests

use crate::geometry::{Aabb, Plane, Sphere};
use crate::{Mat4, Vec3};

/// Index of each plane in [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Left clipping plane
    Left = 0,
    /// Right clipping plane
    Right = 1,
    /// Bottom clipping plane
    Bottom = 2,
    /// Top clipping plane
    Top = 3,
    /// Near clipping plane
    Near = 4,
    /// Far clipping plane
    Far = 5,
}

/// Six inward-facing planes of a view volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Normalized planes, normals pointing into the volume
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from a view-projection matrix with `[0, 1]` clip depth
    ///
    /// The matrix must map world space to clip space where a point is inside
    /// when `-w <= x <= w`, `-w <= y <= w` and `0 <= z <= w`.
    pub fn from_matrix(m: &Mat4) -> Self {
        let row = |i: usize| m.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let plane = |v: crate::Vec4| Plane::new(Vec3::new(v.x, v.y, v.z), v.w).normalized();

        Self {
            planes: [
                plane(r3 + r0),
                plane(r3 - r0),
                plane(r3 + r1),
                plane(r3 - r1),
                plane(r2),
                plane(r3 - r2),
            ],
        }
    }

    /// Get one plane
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Whether a point is inside all six planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Whether a sphere touches the volume
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(sphere.center) >= -sphere.radius)
    }

    /// Whether a box touches the volume
    ///
    /// Conservative: boxes near frustum corners may be reported visible even
    /// when they are outside, but visible boxes are never rejected.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        self.planes.iter().all(|p| {
            let positive = Vec3::new(
                if p.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            p.signed_distance(positive) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mat4Ext;

    fn camera_frustum() -> Frustum {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y());
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_matrix(&(proj * Mat4::clip_correction() * view))
    }

    #[test]
    fn test_points_in_front_and_behind() {
        let f = camera_frustum();
        assert!(f.contains_point(Vec3::zeros()));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, -200.0)));
    }

    #[test]
    fn test_side_planes_follow_fov() {
        let f = camera_frustum();
        // 90 degree fov: at distance 5 the half-width is 5
        assert!(f.contains_point(Vec3::new(4.9, 0.0, 0.0)));
        assert!(!f.contains_point(Vec3::new(5.5, 0.0, 0.0)));
        assert!(!f.contains_point(Vec3::new(0.0, -5.5, 0.0)));
    }

    #[test]
    fn test_near_plane_faces_forward() {
        let f = camera_frustum();
        let near = f.plane(FrustumPlane::Near);
        assert!(near.normal.z < 0.0);
    }

    #[test]
    fn test_aabb_and_sphere_culling() {
        let f = camera_frustum();
        let straddling = Aabb::new(Vec3::new(4.0, -1.0, -1.0), Vec3::new(8.0, 1.0, 1.0));
        let outside = Aabb::new(Vec3::new(20.0, -1.0, -1.0), Vec3::new(22.0, 1.0, 1.0));
        assert!(f.intersects_aabb(&straddling));
        assert!(!f.intersects_aabb(&outside));
        assert!(f.intersects_sphere(&Sphere::new(Vec3::new(5.5, 0.0, 0.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, 20.0), 1.0)));
    }
}
