use std::time::Duration;

use nalgebra::{Matrix6, Vector3, Vector6};

use super::{
    cartesian_clamp, cartesian_projection, CartesianAcceleration,
    CartesianPose, CartesianProjection, CartesianState, CartesianStateVariable,
};
use crate::math::{nonzero_seconds, quaternion_exp};
use crate::state::StateType;
use crate::Result;

/// Linear and angular velocity of a frame in a reference frame.
#[derive(Debug, Clone)]
pub struct CartesianTwist(CartesianState);

cartesian_projection!(
    CartesianTwist,
    StateType::CartesianTwist,
    CartesianStateVariable::Twist
);

cartesian_clamp!(
    CartesianTwist,
    CartesianStateVariable::LinearVelocity,
    CartesianStateVariable::AngularVelocity
);

impl CartesianTwist {
    /// Filled zero twist.
    #[must_use]
    pub fn zero(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut twist = Self::new(name, reference_frame);
        twist.set_linear_velocity(Vector3::zeros());
        twist
    }

    /// Filled twist with random components in `[-1, 1]`.
    #[must_use]
    pub fn random(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::from_cartesian(&CartesianState::random(name, reference_frame))
    }

    /// Twist from linear and angular velocity.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        linear_velocity: Vector3<f64>,
        angular_velocity: Vector3<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let mut twist = Self::new(name, reference_frame);
        twist.set_linear_velocity(linear_velocity);
        twist.set_angular_velocity(angular_velocity);
        twist
    }

    /// Set the linear velocity.
    pub fn set_linear_velocity(&mut self, linear_velocity: Vector3<f64>) {
        self.0.set_linear_velocity(linear_velocity);
    }

    /// Set the angular velocity.
    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        self.0.set_angular_velocity(angular_velocity);
    }

    /// Pose displacement produced by holding this twist for `dt`.
    pub fn integrate(&self, dt: Duration) -> Result<CartesianPose> {
        self.0.assert_filled()?;
        let seconds = dt.as_secs_f64();
        Ok(CartesianPose::from_parts(
            self.name(),
            self.linear_velocity() * seconds,
            quaternion_exp(&self.angular_velocity(), seconds / 2.0),
            self.reference_frame(),
        ))
    }

    /// Acceleration reaching this twist from rest in `dt`.
    pub fn differentiate(&self, dt: Duration) -> Result<CartesianAcceleration> {
        self.0.assert_filled()?;
        let seconds = nonzero_seconds(dt, self.name())?;
        Ok(CartesianAcceleration::from_parts(
            self.name(),
            self.linear_velocity() / seconds,
            self.angular_velocity() / seconds,
            self.reference_frame(),
        ))
    }

    /// Multiply `[linear, angular]` by a 6x6 gain matrix.
    pub fn scaled_by_matrix(&self, gain: &Matrix6<f64>) -> Result<Self> {
        self.0.assert_filled()?;
        let twist = Vector6::from_column_slice(self.0.state_variable(Self::VARIABLE).as_slice());
        let mut result = self.clone();
        result.set_data((gain * twist).as_slice())?;
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{CartesianLimits, StateError};
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::PI;

    #[test]
    fn test_zero_integrates_to_identity() {
        let pose = CartesianTwist::zero("ee", "base")
            .integrate(Duration::from_secs(1))
            .unwrap();
        let identity = CartesianPose::identity("ee", "base");
        assert_eq!(pose.name(), identity.name());
        assert_eq!(pose.reference_frame(), identity.reference_frame());
        assert_eq!(pose.data().unwrap(), identity.data().unwrap());
    }

    #[test]
    fn test_integrate_rotation() {
        let twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, PI / 2.0),
            "base",
        );
        let pose = twist.integrate(Duration::from_secs(2)).unwrap();
        assert_relative_eq!(pose.position(), Vector3::new(2.0, 0.0, 0.0));
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI);
        assert_relative_eq!(pose.orientation().angle_to(&expected), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_integrate_empty_fails() {
        let twist = CartesianTwist::new("ee", "base");
        assert!(twist
            .integrate(Duration::from_secs(1))
            .unwrap_err()
            .is_empty_state());
    }

    #[test]
    fn test_differentiate() {
        let twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            "base",
        );
        let acc = twist.differentiate(Duration::from_millis(500)).unwrap();
        assert_relative_eq!(acc.linear_acceleration(), Vector3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(acc.angular_acceleration(), Vector3::new(0.0, 4.0, 0.0));
        assert!(matches!(
            twist.differentiate(Duration::ZERO),
            Err(StateError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_clamp() {
        let mut twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(3.0, 0.0, 4.0),
            Vector3::new(0.01, 0.0, 0.0),
            "base",
        );
        twist.clamp(1.0, 1.0, 0.0, 0.1).unwrap();
        assert_relative_eq!(twist.linear_velocity(), Vector3::new(0.6, 0.0, 0.8));
        assert_eq!(twist.angular_velocity(), Vector3::zeros());
    }

    #[test]
    fn test_clamp_with_limits() {
        let twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            "base",
        );
        let mut clamped = twist.clone();
        clamped
            .clamp_with(&CartesianLimits::new(1.0, 1.5))
            .unwrap();
        assert_relative_eq!(clamped.linear_velocity().norm(), 1.0);
        assert_relative_eq!(clamped.angular_velocity().norm(), 1.5);

        let copy = twist.clamped(10.0, 10.0, 0.0, 0.0).unwrap();
        assert_eq!(copy.linear_velocity(), twist.linear_velocity());

        let invalid = CartesianLimits::new(-1.0, 1.0);
        assert!(matches!(
            clamped.clamp_with(&invalid),
            Err(StateError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_scaled_by_matrix() {
        let twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            "base",
        );
        let mut gain = Matrix6::identity() * 2.0;
        gain[(1, 5)] = 1.0;
        let scaled = twist.scaled_by_matrix(&gain).unwrap();
        assert_relative_eq!(scaled.linear_velocity(), Vector3::new(2.0, 1.0, 0.0));
        assert_relative_eq!(scaled.angular_velocity(), Vector3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_twist_arithmetic() {
        let a = CartesianTwist::from_parts("ee", Vector3::x(), Vector3::y(), "base");
        let b = CartesianTwist::from_parts("tool", Vector3::y(), Vector3::z(), "base");
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.state_type(), StateType::CartesianTwist);
        assert_relative_eq!(sum.linear_velocity(), Vector3::new(1.0, 1.0, 0.0));
        let half = sum.divided(2.0).unwrap();
        assert_relative_eq!(half.angular_velocity(), Vector3::new(0.0, 0.5, 0.5));
    }
}
