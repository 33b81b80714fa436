use super::{joint_clamp, joint_projection, JointState, JointStateVariable};
use crate::state::StateType;
use crate::Result;

/// Joint torques of a robot.
#[derive(Debug, Clone)]
pub struct JointTorques(JointState);

joint_projection!(
    JointTorques,
    StateType::JointTorques,
    JointStateVariable::Torques
);

joint_clamp!(JointTorques, JointStateVariable::Torques);

impl JointTorques {
    /// Set all torques; one value per joint.
    pub fn set_torques(&mut self, torques: &[f64]) -> Result<()> {
        self.0.set_torques(torques)
    }

    /// Set the torque of the joint called `name`.
    pub fn set_torque(&mut self, name: &str, torque: f64) -> Result<()> {
        self.0.set_torque(name, torque)
    }

    /// Set the torque of the joint at `index`.
    pub fn set_torque_at(&mut self, index: usize, torque: f64) -> Result<()> {
        self.0.set_torque_at(index, torque)
    }
}
