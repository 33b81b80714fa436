use nalgebra::{Matrix6, Vector3, Vector6};

use super::{
    cartesian_clamp, cartesian_projection, CartesianProjection, CartesianState,
    CartesianStateVariable,
};
use crate::state::StateType;
use crate::Result;

/// Force and torque applied at a frame, expressed in a reference frame.
#[derive(Debug, Clone)]
pub struct CartesianWrench(CartesianState);

cartesian_projection!(
    CartesianWrench,
    StateType::CartesianWrench,
    CartesianStateVariable::Wrench
);

cartesian_clamp!(
    CartesianWrench,
    CartesianStateVariable::Force,
    CartesianStateVariable::Torque
);

impl CartesianWrench {
    /// Filled zero wrench.
    #[must_use]
    pub fn zero(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut wrench = Self::new(name, reference_frame);
        wrench.set_force(Vector3::zeros());
        wrench
    }

    /// Filled wrench with random components in `[-1, 1]`.
    #[must_use]
    pub fn random(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::from_cartesian(&CartesianState::random(name, reference_frame))
    }

    /// Wrench from force and torque.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        force: Vector3<f64>,
        torque: Vector3<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let mut wrench = Self::new(name, reference_frame);
        wrench.set_force(force);
        wrench.set_torque(torque);
        wrench
    }

    /// Set the force.
    pub fn set_force(&mut self, force: Vector3<f64>) {
        self.0.set_force(force);
    }

    /// Set the torque.
    pub fn set_torque(&mut self, torque: Vector3<f64>) {
        self.0.set_torque(torque);
    }

    /// Multiply `[force, torque]` by a 6x6 gain matrix.
    pub fn scaled_by_matrix(&self, gain: &Matrix6<f64>) -> Result<Self> {
        self.0.assert_filled()?;
        let wrench = Vector6::from_column_slice(self.0.state_variable(Self::VARIABLE).as_slice());
        let mut result = self.clone();
        result.set_data((gain * wrench).as_slice())?;
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::CartesianPose;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_parts_layout() {
        let wrench = CartesianWrench::from_parts(
            "ft_sensor",
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
            "ee",
        );
        assert_eq!(
            wrench.to_vec().unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_lever_arm_torque() {
        let ee = CartesianPose::from_position("ee", Vector3::new(1.0, 0.0, 0.0), "base");
        let wrench = CartesianWrench::from_parts(
            "contact",
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::zeros(),
            "ee",
        );
        let at_base = ee.compose(&wrench).unwrap();
        assert_relative_eq!(at_base.force(), Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(at_base.torque(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_clamp_with_dead_zone() {
        let mut wrench = CartesianWrench::from_parts(
            "ee",
            Vector3::new(0.05, 0.0, 0.0),
            Vector3::new(0.0, 20.0, 0.0),
            "base",
        );
        wrench.clamp(10.0, 5.0, 0.1, 0.0).unwrap();
        assert_eq!(wrench.force(), Vector3::zeros());
        assert_relative_eq!(wrench.torque(), Vector3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_scaled_by_matrix() {
        let wrench = CartesianWrench::from_parts("ee", Vector3::x(), Vector3::y(), "base");
        let scaled = wrench.scaled_by_matrix(&(Matrix6::identity() * 0.5)).unwrap();
        assert_relative_eq!(scaled.force(), Vector3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(scaled.torque(), Vector3::new(0.0, 0.5, 0.0));
    }
}
