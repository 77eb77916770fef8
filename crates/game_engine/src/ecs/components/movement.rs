//! Movement component for entities that move in 3D space

use crate::ecs::Component;
use crate::foundation::math::{Quat, Vec3};

/// Velocity, acceleration and damping of a moving entity
#[derive(Debug, Clone, PartialEq)]
pub struct MovementComponent {
    /// Linear velocity in units per second
    pub velocity: Vec3,

    /// Linear acceleration in units per second squared
    pub acceleration: Vec3,

    /// Angular velocity in radians per second (axis * rate)
    pub angular_velocity: Vec3,

    /// Angular acceleration in radians per second squared
    pub angular_acceleration: Vec3,

    /// Maximum speed (0 = no limit)
    pub max_speed: f32,

    /// Fraction of linear velocity lost per second (0 = none, 1 = instant stop)
    pub linear_damping: f32,

    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,

    /// Whether movement is applied
    pub enabled: bool,
}

impl Component for MovementComponent {}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementComponent {
    /// Stationary, enabled component
    pub fn new() -> Self {
        Self {
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            angular_acceleration: Vec3::zeros(),
            max_speed: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            enabled: true,
        }
    }

    /// Advance velocities by `delta_time`
    ///
    /// Applies acceleration, then damping, then the speed limit.
    pub fn integrate(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.velocity += self.acceleration * delta_time;
        self.angular_velocity += self.angular_acceleration * delta_time;

        if self.linear_damping > 0.0 {
            self.velocity *= (1.0 - self.linear_damping * delta_time).max(0.0);
        }
        if self.angular_damping > 0.0 {
            self.angular_velocity *= (1.0 - self.angular_damping * delta_time).max(0.0);
        }

        if self.max_speed > 0.0 {
            let speed = self.velocity.norm();
            if speed > self.max_speed {
                self.velocity *= self.max_speed / speed;
            }
        }
    }

    /// Position change over `delta_time`
    pub fn position_delta(&self, delta_time: f32) -> Vec3 {
        if self.enabled {
            self.velocity * delta_time
        } else {
            Vec3::zeros()
        }
    }

    /// Rotation over `delta_time`, identity when not spinning
    pub fn rotation_delta(&self, delta_time: f32) -> Quat {
        if !self.enabled {
            return Quat::identity();
        }
        Quat::from_scaled_axis(self.angular_velocity * delta_time)
    }

    /// Zero every velocity and acceleration
    pub fn stop(&mut self) {
        self.velocity = Vec3::zeros();
        self.acceleration = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
        self.angular_acceleration = Vec3::zeros();
    }

    /// Current speed
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }
}

/// Factory for common movement setups
pub struct MovementFactory;

impl MovementFactory {
    /// Constant linear velocity
    pub fn create_linear(velocity: Vec3) -> MovementComponent {
        MovementComponent {
            velocity,
            ..MovementComponent::new()
        }
    }

    /// Constant spin
    pub fn create_rotating(angular_velocity: Vec3) -> MovementComponent {
        MovementComponent {
            angular_velocity,
            ..MovementComponent::new()
        }
    }

    /// Velocity that decays over time
    pub fn create_with_damping(velocity: Vec3, linear_damping: f32, angular_damping: f32) -> MovementComponent {
        MovementComponent {
            velocity,
            linear_damping: linear_damping.clamp(0.0, 1.0),
            angular_damping: angular_damping.clamp(0.0, 1.0),
            ..MovementComponent::new()
        }
    }

    /// Constant acceleration with a speed cap
    pub fn create_accelerating(acceleration: Vec3, max_speed: f32) -> MovementComponent {
        MovementComponent {
            acceleration,
            max_speed,
            ..MovementComponent::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_damping_reduces_velocity() {
        let mut movement = MovementFactory::create_with_damping(Vec3::new(10.0, 0.0, 0.0), 0.5, 0.0);
        movement.integrate(1.0);
        assert_relative_eq!(movement.velocity.x, 5.0);
        movement.integrate(4.0);
        assert_relative_eq!(movement.velocity.x, 0.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut movement = MovementFactory::create_accelerating(Vec3::new(0.0, 0.0, -100.0), 3.0);
        movement.integrate(1.0);
        assert_relative_eq!(movement.speed(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_disabled_component_does_not_move() {
        let mut movement = MovementFactory::create_linear(Vec3::new(1.0, 0.0, 0.0));
        movement.enabled = false;
        assert_eq!(movement.position_delta(1.0), Vec3::zeros());
        assert_eq!(movement.rotation_delta(1.0), Quat::identity());
    }

    #[test]
    fn test_rotation_delta_uses_axis_rate() {
        let movement = MovementFactory::create_rotating(Vec3::new(0.0, std::f32::consts::PI, 0.0));
        let half = movement.rotation_delta(0.5);
        assert_relative_eq!(half.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }
}
