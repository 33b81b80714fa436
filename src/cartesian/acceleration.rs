use std::time::Duration;

use nalgebra::{Matrix6, Vector3};

use super::{
    cartesian_clamp, cartesian_projection, CartesianProjection, CartesianState,
    CartesianStateVariable, CartesianTwist,
};
use crate::state::StateType;
use crate::Result;

/// Linear and angular acceleration of a frame in a reference frame.
#[derive(Debug, Clone)]
pub struct CartesianAcceleration(CartesianState);

cartesian_projection!(
    CartesianAcceleration,
    StateType::CartesianAcceleration,
    CartesianStateVariable::Acceleration
);

cartesian_clamp!(
    CartesianAcceleration,
    CartesianStateVariable::LinearAcceleration,
    CartesianStateVariable::AngularAcceleration
);

impl CartesianAcceleration {
    /// Filled zero acceleration.
    #[must_use]
    pub fn zero(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut acceleration = Self::new(name, reference_frame);
        acceleration.set_linear_acceleration(Vector3::zeros());
        acceleration
    }

    /// Filled acceleration with random components in `[-1, 1]`.
    #[must_use]
    pub fn random(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::from_cartesian(&CartesianState::random(name, reference_frame))
    }

    /// Acceleration from its linear and angular parts.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        linear_acceleration: Vector3<f64>,
        angular_acceleration: Vector3<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let mut acceleration = Self::new(name, reference_frame);
        acceleration.set_linear_acceleration(linear_acceleration);
        acceleration.set_angular_acceleration(angular_acceleration);
        acceleration
    }

    /// Acceleration reaching `twist` from rest in one second.
    pub fn from_twist(twist: &CartesianTwist) -> Result<Self> {
        twist.differentiate(Duration::from_secs(1))
    }

    /// Set the linear acceleration.
    pub fn set_linear_acceleration(&mut self, linear_acceleration: Vector3<f64>) {
        self.0.set_linear_acceleration(linear_acceleration);
    }

    /// Set the angular acceleration.
    pub fn set_angular_acceleration(&mut self, angular_acceleration: Vector3<f64>) {
        self.0.set_angular_acceleration(angular_acceleration);
    }

    /// Twist gained by holding this acceleration for `dt`.
    pub fn integrate(&self, dt: Duration) -> Result<CartesianTwist> {
        self.0.assert_filled()?;
        let seconds = dt.as_secs_f64();
        Ok(CartesianTwist::from_parts(
            self.name(),
            self.linear_acceleration() * seconds,
            self.angular_acceleration() * seconds,
            self.reference_frame(),
        ))
    }

    /// Scale by the diagonal 3x3 blocks of a 6x6 gain.
    ///
    /// Off-diagonal blocks are ignored: linear and angular accelerations do
    /// not mix.
    pub fn scaled_by_matrix(&self, gain: &Matrix6<f64>) -> Result<Self> {
        self.0.assert_filled()?;
        let linear = gain.fixed_view::<3, 3>(0, 0) * self.linear_acceleration();
        let angular = gain.fixed_view::<3, 3>(3, 3) * self.angular_acceleration();
        let mut result = self.clone();
        result.set_linear_acceleration(linear);
        result.set_angular_acceleration(angular);
        Ok(result)
    }
}
