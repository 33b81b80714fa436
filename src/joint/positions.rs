use std::time::Duration;

use super::{joint_projection, JointState, JointStateVariable, JointVelocities};
use crate::math::nonzero_seconds;
use crate::state::StateType;
use crate::Result;

/// Joint positions of a robot.
#[derive(Debug, Clone)]
pub struct JointPositions(JointState);

joint_projection!(
    JointPositions,
    StateType::JointPositions,
    JointStateVariable::Positions
);

impl JointPositions {
    /// Set all positions; one value per joint.
    pub fn set_positions(&mut self, positions: &[f64]) -> Result<()> {
        self.0.set_positions(positions)
    }

    /// Set the position of the joint called `name`.
    pub fn set_position(&mut self, name: &str, position: f64) -> Result<()> {
        self.0.set_position(name, position)
    }

    /// Set the position of the joint at `index`.
    pub fn set_position_at(&mut self, index: usize, position: f64) -> Result<()> {
        self.0.set_position_at(index, position)
    }

    /// Velocities covering these positions from zero in `dt`.
    pub fn differentiate(&self, dt: Duration) -> Result<JointVelocities> {
        self.0.assert_filled()?;
        let seconds = nonzero_seconds(dt, self.name())?;
        let mut velocities = JointVelocities::new(self.name(), self.names().iter().cloned());
        velocities.set_data((self.positions() / seconds).as_slice())?;
        Ok(velocities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{JointProjection, StateError};
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn test_projection_from_joint_state() {
        let mut state = JointState::zero("arm", ["j1", "j2"]);
        state.set_positions(&[0.5, -0.5]).unwrap();
        state.set_torques(&[3.0, 3.0]).unwrap();

        let positions = JointPositions::from(&state);
        assert_eq!(positions.state_type(), StateType::JointPositions);
        assert_eq!(positions.data().unwrap().as_slice(), &[0.5, -0.5]);
        assert_eq!(positions.torques().as_slice(), &[0.0, 0.0]);
        assert_eq!(positions.into_joint_state().names(), state.names());
    }

    #[test]
    fn test_set_data_length() {
        let mut positions = JointPositions::with_size("arm", 3);
        assert!(positions.set_data(&[1.0; 4]).unwrap_err().is_size_mismatch());
        positions.set_position("joint2", 1.0).unwrap();
        assert_eq!(positions.to_vec().unwrap(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_scaling_stays_positions() {
        let mut positions = JointPositions::zero("arm", ["j1", "j2", "j3"]);
        positions.set_positions(&[1.0, 2.0, 3.0]).unwrap();
        let doubled = positions.scaled(2.0).unwrap();
        assert_eq!(doubled.state_type(), StateType::JointPositions);
        assert_eq!(doubled.positions().as_slice(), &[2.0, 4.0, 6.0]);

        let gain = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.0, -1.0]));
        let scaled = positions.scaled_by_matrix(&gain).unwrap();
        assert_eq!(scaled.positions().as_slice(), &[1.0, 0.0, -3.0]);

        let elementwise = positions
            .scaled_elementwise(&DVector::from_vec(vec![0.0, 1.0, 2.0]))
            .unwrap();
        assert_eq!(elementwise.positions().as_slice(), &[0.0, 2.0, 6.0]);
    }

    #[test]
    fn test_differentiate() {
        let mut positions = JointPositions::zero("arm", ["j1", "j2"]);
        positions.set_positions(&[1.0, -2.0]).unwrap();
        let velocities = positions.differentiate(Duration::from_millis(500)).unwrap();
        assert_eq!(velocities.names(), positions.names());
        assert_eq!(velocities.velocities().as_slice(), &[2.0, -4.0]);
        assert!(matches!(
            positions.differentiate(Duration::ZERO),
            Err(StateError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_incompatible_names() {
        let a = JointPositions::zero("arm", ["j1", "j2"]);
        let b = JointPositions::zero("arm", ["j2", "j1"]);
        assert!(a.checked_add(&b).unwrap_err().is_incompatible_states());
    }
}
