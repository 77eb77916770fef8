//! # mdcla
//!
//! Math library for the engine: linear algebra aliases, transforms and the
//! geometric primitives used for culling and picking.
//!
//! All types are `f32` and built on nalgebra. View space is right-handed and
//! Y-up; projections map depth to `[0, 1]` and a separate clip correction
//! matrix flips into the Y-down clip convention. A complete camera transform
//! is `P * X * V`.
//!
//! ```rust
//! use mdcla::{Vec3, Transform};
//!
//! let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
//! let p = t.transform_point(mdcla::Point3::origin());
//! assert_eq!(p.coords, Vec3::new(1.0, 2.0, 3.0));
//! ```

#![warn(missing_docs)]

pub mod frustum;
pub mod geometry;
pub mod matrix;
pub mod transform;
pub mod utils;

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

pub use frustum::Frustum;
pub use geometry::{Aabb, Plane, Ray, Sphere};
pub use matrix::Mat4Ext;
pub use transform::Transform;
pub use utils::constants;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion used for rotations
pub type Quat = Unit<Quaternion<f32>>;
