use std::time::Duration;

use super::{
    joint_clamp, joint_projection, JointAccelerations, JointPositions, JointState,
    JointStateVariable,
};
use crate::math::nonzero_seconds;
use crate::state::StateType;
use crate::Result;

/// Joint velocities of a robot.
#[derive(Debug, Clone)]
pub struct JointVelocities(JointState);

joint_projection!(
    JointVelocities,
    StateType::JointVelocities,
    JointStateVariable::Velocities
);

joint_clamp!(JointVelocities, JointStateVariable::Velocities);

impl JointVelocities {
    /// Set all velocities; one value per joint.
    pub fn set_velocities(&mut self, velocities: &[f64]) -> Result<()> {
        self.0.set_velocities(velocities)
    }

    /// Set the velocity of the joint called `name`.
    pub fn set_velocity(&mut self, name: &str, velocity: f64) -> Result<()> {
        self.0.set_velocity(name, velocity)
    }

    /// Set the velocity of the joint at `index`.
    pub fn set_velocity_at(&mut self, index: usize, velocity: f64) -> Result<()> {
        self.0.set_velocity_at(index, velocity)
    }

    /// Displacement produced by holding these velocities for `dt`.
    pub fn integrate(&self, dt: Duration) -> Result<JointPositions> {
        self.0.assert_filled()?;
        let mut positions = JointPositions::new(self.name(), self.names().iter().cloned());
        positions.set_data((self.velocities() * dt.as_secs_f64()).as_slice())?;
        Ok(positions)
    }

    /// Accelerations reaching these velocities from rest in `dt`.
    pub fn differentiate(&self, dt: Duration) -> Result<JointAccelerations> {
        self.0.assert_filled()?;
        let seconds = nonzero_seconds(dt, self.name())?;
        let mut accelerations = JointAccelerations::new(self.name(), self.names().iter().cloned());
        accelerations.set_data((self.velocities() / seconds).as_slice())?;
        Ok(accelerations)
    }
}
