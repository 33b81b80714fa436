use std::time::Duration;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use super::{
    cartesian_projection, unit_quaternion, CartesianProjection, CartesianState,
    CartesianStateVariable, CartesianTwist,
};
use crate::math::{nonzero_seconds, quaternion_log};
use crate::state::StateType;
use crate::Result;

/// Position and orientation of a frame in a reference frame.
///
/// # Example
///
/// ```
/// use state_types::{CartesianPose, CartesianTwist};
/// use nalgebra::Vector3;
/// use std::time::Duration;
///
/// let pose = CartesianPose::from_position("ee", Vector3::new(0.2, 0.0, 0.0), "base");
/// let twist = pose.differentiate(Duration::from_millis(100)).unwrap();
/// assert!((twist.linear_velocity().x - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CartesianPose(CartesianState);

cartesian_projection!(
    CartesianPose,
    StateType::CartesianPose,
    CartesianStateVariable::Pose
);

impl CartesianPose {
    /// Filled pose at the origin with identity orientation.
    #[must_use]
    pub fn identity(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut pose = Self::new(name, reference_frame);
        pose.0.set_position(Vector3::zeros());
        pose
    }

    /// Filled pose with a random position in `[-1, 1]` and random orientation.
    #[must_use]
    pub fn random(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::from_cartesian(&CartesianState::random(name, reference_frame))
    }

    /// Pose with the given position and identity orientation.
    #[must_use]
    pub fn from_position(
        name: impl Into<String>,
        position: Vector3<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let mut pose = Self::new(name, reference_frame);
        pose.set_position(position);
        pose
    }

    /// Pose from position and orientation.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let mut pose = Self::from_position(name, position, reference_frame);
        pose.set_orientation(orientation);
        pose
    }

    /// Pose from a rigid transform.
    #[must_use]
    pub fn from_isometry(
        name: impl Into<String>,
        isometry: &Isometry3<f64>,
        reference_frame: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            name,
            isometry.translation.vector,
            isometry.rotation,
            reference_frame,
        )
    }

    /// Pose reached by applying `twist` for one second.
    pub fn from_twist(twist: &CartesianTwist) -> Result<Self> {
        twist.integrate(Duration::from_secs(1))
    }

    /// The pose as a rigid transform.
    pub fn to_isometry(&self) -> Result<Isometry3<f64>> {
        self.0.assert_filled()?;
        Ok(Isometry3::from_parts(
            Translation3::from(self.position()),
            self.orientation(),
        ))
    }

    /// Set the position.
    pub fn set_position(&mut self, position: Vector3<f64>) {
        self.0.set_position(position);
    }

    /// Set the orientation.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.0.set_orientation(orientation);
    }

    /// Set the orientation from `w, x, y, z` coefficients, normalizing them.
    pub fn set_orientation_coefficients(&mut self, w: f64, x: f64, y: f64, z: f64) -> Result<()> {
        self.0.set_orientation(unit_quaternion(w, x, y, z)?);
        Ok(())
    }

    /// Map a vector expressed in this frame into the reference frame.
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Result<Vector3<f64>> {
        self.0.assert_filled()?;
        Ok(self.orientation() * vector + self.position())
    }

    /// Express `other` (given in this pose's frame) in this pose's reference
    /// frame. The result has the same projection type as `other`.
    pub fn compose<T: CartesianProjection>(&self, other: &T) -> Result<T> {
        self.0
            .compose(other.as_cartesian())
            .map(|state| T::from_cartesian(&state))
    }

    /// Twist that moves the reference origin onto this pose in `dt`.
    ///
    /// Fails with [`StateError::DivisionByZero`](crate::StateError) for a
    /// zero duration.
    pub fn differentiate(&self, dt: Duration) -> Result<CartesianTwist> {
        self.0.assert_filled()?;
        let seconds = nonzero_seconds(dt, self.name())?;
        let orientation = self.orientation();
        let mut log = quaternion_log(&orientation);
        if orientation.coords.dot(&log.coords) < 0.0 {
            log = -log;
        }
        Ok(CartesianTwist::from_parts(
            self.name(),
            self.position() / seconds,
            log.imag() * (2.0 / seconds),
            self.reference_frame(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{CartesianWrench, StateError, StateLike};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let pose = CartesianPose::identity("ee", "base");
        assert!(!pose.is_empty());
        assert_eq!(pose.state_type(), StateType::CartesianPose);
        let data = pose.data().unwrap();
        assert_eq!(data.as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_set_data_size() {
        let mut pose = CartesianPose::new("ee", "base");
        assert!(pose.set_data(&[1.0; 6]).unwrap_err().is_size_mismatch());
        pose.set_data(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 2.0]).unwrap();
        assert_relative_eq!(pose.orientation().k, 1.0);
        assert_eq!(pose.to_vec().unwrap().len(), 7);
    }

    #[test]
    fn test_projection_drops_other_fields() {
        let state = CartesianState::random("ee", "base");
        let pose = CartesianPose::from(&state);
        assert_eq!(pose.position(), state.position());
        assert_eq!(pose.linear_velocity(), Vector3::zeros());
        assert_eq!(pose.force(), Vector3::zeros());

        let empty = CartesianPose::from(&CartesianState::new("ee", "base"));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_isometry_round_trip() {
        let iso = Isometry3::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 0.5));
        let pose = CartesianPose::from_isometry("ee", &iso, "base");
        let back = pose.to_isometry().unwrap();
        assert_relative_eq!(back, iso, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_vector() {
        let pose = CartesianPose::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            "base",
        );
        let v = pose.transform_vector(&Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(v, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_returns_operand_type() {
        let base = CartesianPose::from_parts(
            "base",
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            "world",
        );
        let wrench = CartesianWrench::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::zeros(),
            "base",
        );
        let in_world: CartesianWrench = base.compose(&wrench).unwrap();
        assert_eq!(in_world.reference_frame(), "world");
        assert_eq!(in_world.state().state_type(), StateType::CartesianWrench);
        assert_relative_eq!(in_world.force(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_differentiate() {
        let pose = CartesianPose::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.5),
            "base",
        );
        let twist = pose.differentiate(Duration::from_secs(2)).unwrap();
        assert_eq!(twist.name(), "ee");
        assert_eq!(twist.reference_frame(), "base");
        assert_relative_eq!(twist.linear_velocity(), Vector3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(
            twist.angular_velocity(),
            Vector3::new(0.25, 0.0, 0.0),
            epsilon = 1e-12
        );

        let err = pose.differentiate(Duration::ZERO).unwrap_err();
        assert!(matches!(err, StateError::DivisionByZero { .. }));
    }

    #[test]
    fn test_differentiate_integrate() {
        let pose = CartesianPose::from_parts(
            "ee",
            Vector3::new(0.3, -0.2, 0.9),
            UnitQuaternion::from_euler_angles(0.4, 0.1, -0.7),
            "base",
        );
        let dt = Duration::from_millis(250);
        let back = pose.differentiate(dt).unwrap().integrate(dt).unwrap();
        assert_relative_eq!(back.position(), pose.position(), epsilon = 1e-9);
        assert_relative_eq!(back.orientation().angle_to(&pose.orientation()), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_twist() {
        let twist = CartesianTwist::from_parts(
            "ee",
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::zeros(),
            "base",
        );
        let pose = CartesianPose::from_twist(&twist).unwrap();
        assert_relative_eq!(pose.position(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_inverse_and_add_stay_poses() {
        let a = CartesianPose::random("ee", "base");
        let inv = a.inverse().unwrap();
        assert_eq!(inv.state_type(), StateType::CartesianPose);
        assert_eq!(inv.name(), "base");

        let sum = a.checked_add(&a).unwrap();
        assert_relative_eq!(sum.position(), a.position() * 2.0, epsilon = 1e-12);
    }
}
