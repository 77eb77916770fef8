//! Scalar helpers and constants

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Default tolerance for approximate float comparisons
    pub const EPSILON: f32 = 1.0e-5;
}

/// Convert degrees to radians
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * constants::DEG_TO_RAD
}

/// Convert radians to degrees
pub fn rad_to_deg(radians: f32) -> f32 {
    radians * constants::RAD_TO_DEG
}

/// Clamp a value between min and max
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]: where `value` sits between `a` and `b`
///
/// Returns 0 when the range is empty.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    let range = b - a;
    if range.abs() < f32::EPSILON {
        0.0
    } else {
        (value - a) / range
    }
}

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`
pub fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    lerp(out_min, out_max, inverse_lerp(in_min, in_max, value))
}

/// Hermite smoothstep between two edges
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp(inverse_lerp(edge0, edge1, x), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Approximate equality within [`constants::EPSILON`]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= constants::EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Wrap an angle in radians into `(-PI, PI]`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + constants::PI).rem_euclid(constants::TAU) - constants::PI;
    if wrapped <= -constants::PI {
        wrapped + constants::TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_remap_and_inverse_lerp() {
        assert_relative_eq!(inverse_lerp(10.0, 20.0, 15.0), 0.5);
        assert_relative_eq!(remap(5.0, 0.0, 10.0, 100.0, 200.0), 150.0);
        assert_relative_eq!(inverse_lerp(3.0, 3.0, 7.0), 0.0);
    }

    #[test]
    fn test_smoothstep_is_clamped() {
        assert_relative_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_relative_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_relative_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(constants::TAU + 0.25), 0.25, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(-constants::PI), constants::PI, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(3.0 * constants::HALF_PI), -constants::HALF_PI, epsilon = 1e-5);
    }

    #[test]
    fn test_degree_conversion() {
        assert_relative_eq!(deg_to_rad(180.0), constants::PI);
        assert_relative_eq!(rad_to_deg(constants::HALF_PI), 90.0, epsilon = 1e-4);
        assert!(approx_eq(0.1 + 0.2, 0.3));
    }
}
