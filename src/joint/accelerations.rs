use std::time::Duration;

use super::{joint_clamp, joint_projection, JointState, JointStateVariable, JointVelocities};
use crate::state::StateType;
use crate::Result;

/// Joint accelerations of a robot.
#[derive(Debug, Clone)]
pub struct JointAccelerations(JointState);

joint_projection!(
    JointAccelerations,
    StateType::JointAccelerations,
    JointStateVariable::Accelerations
);

joint_clamp!(JointAccelerations, JointStateVariable::Accelerations);

impl JointAccelerations {
    /// Set all accelerations; one value per joint.
    pub fn set_accelerations(&mut self, accelerations: &[f64]) -> Result<()> {
        self.0.set_accelerations(accelerations)
    }

    /// Set the acceleration of the joint called `name`.
    pub fn set_acceleration(&mut self, name: &str, acceleration: f64) -> Result<()> {
        self.0.set_acceleration(name, acceleration)
    }

    /// Set the acceleration of the joint at `index`.
    pub fn set_acceleration_at(&mut self, index: usize, acceleration: f64) -> Result<()> {
        self.0.set_acceleration_at(index, acceleration)
    }

    /// Velocities gained by holding these accelerations for `dt`.
    pub fn integrate(&self, dt: Duration) -> Result<JointVelocities> {
        self.0.assert_filled()?;
        let mut velocities = JointVelocities::new(self.name(), self.names().iter().cloned());
        velocities.set_data((self.accelerations() * dt.as_secs_f64()).as_slice())?;
        Ok(velocities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate() {
        let mut accelerations = JointAccelerations::zero("arm", ["j1", "j2"]);
        accelerations.set_acceleration("j2", 3.0).unwrap();
        let velocities = accelerations.integrate(Duration::from_millis(500)).unwrap();
        assert_eq!(velocities.velocities().as_slice(), &[0.0, 1.5]);
        assert_eq!(velocities.names(), accelerations.names());
    }

    #[test]
    fn test_clamp_per_joint() {
        let mut accelerations = JointAccelerations::zero("arm", ["j1", "j2"]);
        accelerations.set_accelerations(&[-5.0, 0.2]).unwrap();
        accelerations
            .clamp_per_joint(&[2.0, 1.0], &[0.0, 0.5])
            .unwrap();
        assert_eq!(accelerations.accelerations().as_slice(), &[-2.0, 0.0]);
    }
}
