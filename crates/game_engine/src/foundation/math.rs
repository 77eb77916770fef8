//! Math types used across the engine
//!
//! Everything here comes from the `mdcla` crate; this module keeps engine
//! code importing from a single place.

pub use mdcla::{
    constants, frustum::FrustumPlane, utils, Aabb, Frustum, Mat3, Mat4, Mat4Ext, Plane, Point2,
    Point3, Quat, Ray, Sphere, Transform, Vec2, Vec3, Vec4,
};
