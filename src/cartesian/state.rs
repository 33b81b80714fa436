//! The dense Cartesian state record and its arithmetic core.

use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};
use rand::Rng;

use crate::math::{align_sign, quaternion_exp, quaternion_log, random_unit_quaternion};
use crate::spatial::{SpatialState, WORLD_FRAME};
use crate::state::{State, StateLike, StateType};
use crate::{Result, StateError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selector for the fields of a [`CartesianState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CartesianStateVariable {
    /// Position (3).
    Position,
    /// Orientation quaternion `[w, x, y, z]` (4).
    Orientation,
    /// Pose: position and orientation (7).
    Pose,
    /// Linear velocity (3).
    LinearVelocity,
    /// Angular velocity (3).
    AngularVelocity,
    /// Twist: linear and angular velocity (6).
    Twist,
    /// Linear acceleration (3).
    LinearAcceleration,
    /// Angular acceleration (3).
    AngularAcceleration,
    /// Linear and angular acceleration (6).
    Acceleration,
    /// Force (3).
    Force,
    /// Torque (3).
    Torque,
    /// Wrench: force and torque (6).
    Wrench,
    /// Every field (25).
    All,
}

impl CartesianStateVariable {
    const PRIMITIVES: [Self; 8] = [
        Self::Position,
        Self::Orientation,
        Self::LinearVelocity,
        Self::AngularVelocity,
        Self::LinearAcceleration,
        Self::AngularAcceleration,
        Self::Force,
        Self::Torque,
    ];

    /// The primitive fields selected, in storage order.
    #[must_use]
    pub fn fields(self) -> &'static [Self] {
        let p = &Self::PRIMITIVES;
        match self {
            Self::Position => &p[0..1],
            Self::Orientation => &p[1..2],
            Self::Pose => &p[0..2],
            Self::LinearVelocity => &p[2..3],
            Self::AngularVelocity => &p[3..4],
            Self::Twist => &p[2..4],
            Self::LinearAcceleration => &p[4..5],
            Self::AngularAcceleration => &p[5..6],
            Self::Acceleration => &p[4..6],
            Self::Force => &p[6..7],
            Self::Torque => &p[7..8],
            Self::Wrench => &p[6..8],
            Self::All => p,
        }
    }

    /// Length of the data vector for this selector.
    #[must_use]
    pub fn size(self) -> usize {
        self.fields()
            .iter()
            .map(|field| if *field == Self::Orientation { 4 } else { 3 })
            .sum()
    }

    /// Check if the selection involves the orientation quaternion.
    #[must_use]
    pub fn contains_orientation(self) -> bool {
        self.fields().contains(&Self::Orientation)
    }
}

impl std::fmt::Display for CartesianStateVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Orientation => "orientation",
            Self::Pose => "pose",
            Self::LinearVelocity => "linear velocity",
            Self::AngularVelocity => "angular velocity",
            Self::Twist => "twist",
            Self::LinearAcceleration => "linear acceleration",
            Self::AngularAcceleration => "angular acceleration",
            Self::Acceleration => "acceleration",
            Self::Force => "force",
            Self::Torque => "torque",
            Self::Wrench => "wrench",
            Self::All => "all",
        };
        write!(f, "{name}")
    }
}

/// Full kinematic state of a frame expressed in a reference frame.
///
/// Holds pose, twist, acceleration and wrench together. The typed projections
/// ([`CartesianPose`](crate::CartesianPose), [`CartesianTwist`](crate::CartesianTwist),
/// ...) wrap this record and expose only their own fields.
///
/// # Example
///
/// ```
/// use state_types::CartesianState;
/// use nalgebra::Vector3;
///
/// let mut world_to_base = CartesianState::identity("base", "world");
/// world_to_base.set_position(Vector3::new(1.0, 0.0, 0.0));
/// let mut base_to_ee = CartesianState::identity("ee", "base");
/// base_to_ee.set_position(Vector3::new(0.0, 2.0, 0.0));
///
/// let world_to_ee = world_to_base.compose(&base_to_ee).unwrap();
/// assert_eq!(world_to_ee.name(), "ee");
/// assert_eq!(world_to_ee.reference_frame(), "world");
/// assert_eq!(world_to_ee.position(), Vector3::new(1.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct CartesianState {
    spatial: SpatialState,
    position: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    linear_acceleration: Vector3<f64>,
    angular_acceleration: Vector3<f64>,
    force: Vector3<f64>,
    torque: Vector3<f64>,
}

impl Default for CartesianState {
    fn default() -> Self {
        Self::new("", WORLD_FRAME)
    }
}

impl CartesianState {
    /// Create an empty state with all fields at identity.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::with_type(StateType::CartesianState, name, reference_frame)
    }

    pub(crate) fn with_type(
        state_type: StateType,
        name: impl Into<String>,
        reference_frame: impl Into<String>,
    ) -> Self {
        Self {
            spatial: SpatialState::with_type(state_type, name, reference_frame),
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            linear_acceleration: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Create a filled identity state: zero vectors and identity orientation.
    #[must_use]
    pub fn identity(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut state = Self::new(name, reference_frame);
        state.spatial.state_mut().set_filled();
        state
    }

    /// Create a filled state with random vectors in `[-1, 1]` and a uniformly
    /// random orientation.
    #[must_use]
    pub fn random(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut rng = rand::thread_rng();
        let mut state = Self::identity(name, reference_frame);
        let mut random_vector = || Vector3::from_fn(|_, _| rng.gen_range(-1.0..=1.0));
        state.position = random_vector();
        state.linear_velocity = random_vector();
        state.angular_velocity = random_vector();
        state.linear_acceleration = random_vector();
        state.angular_acceleration = random_vector();
        state.force = random_vector();
        state.torque = random_vector();
        state.orientation = random_unit_quaternion(&mut rng);
        state
    }

    /// Access the spatial part (name, reference frame, filled flag).
    #[must_use]
    pub fn spatial(&self) -> &SpatialState {
        &self.spatial
    }

    pub(crate) fn set_type(&mut self, state_type: StateType) {
        self.spatial.state_mut().set_type(state_type);
    }

    /// Get the type tag.
    #[must_use]
    pub fn state_type(&self) -> StateType {
        self.spatial.state().state_type()
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.spatial.name()
    }

    /// Set the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.spatial.set_name(name);
    }

    /// Get the reference frame.
    #[must_use]
    pub fn reference_frame(&self) -> &str {
        self.spatial.reference_frame()
    }

    /// Set the reference frame.
    pub fn set_reference_frame(&mut self, reference_frame: impl Into<String>) {
        self.spatial.set_reference_frame(reference_frame);
    }

    /// Check if no field has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spatial.is_empty()
    }

    /// Set the empty flag.
    pub fn set_empty(&mut self, empty: bool) {
        self.spatial.state_mut().set_empty(empty);
    }

    /// Get the creation (or last reset) time.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.spatial.state().timestamp()
    }

    /// Refresh the timestamp to now.
    pub fn reset_timestamp(&mut self) {
        self.spatial.state_mut().reset_timestamp();
    }

    /// Time elapsed since the timestamp.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.spatial.state().age()
    }

    /// Check if the state is at least `threshold` old.
    #[must_use]
    pub fn is_deprecated(&self, threshold: Duration) -> bool {
        self.spatial.state().is_deprecated(threshold)
    }

    /// Check the frame relation with another Cartesian state.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.spatial.is_compatible(&other.spatial)
    }

    /// Negation of [`CartesianState::is_compatible`].
    #[must_use]
    pub fn is_incompatible(&self, other: &Self) -> bool {
        !self.is_compatible(other)
    }

    /// Fail with [`StateError::EmptyState`] if the state is empty.
    pub fn assert_filled(&self) -> Result<()> {
        self.spatial.state().assert_filled()
    }

    /// Position.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// Orientation.
    #[must_use]
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    /// Linear velocity.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    /// Angular velocity.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    /// Linear acceleration.
    #[must_use]
    pub fn linear_acceleration(&self) -> Vector3<f64> {
        self.linear_acceleration
    }

    /// Angular acceleration.
    #[must_use]
    pub fn angular_acceleration(&self) -> Vector3<f64> {
        self.angular_acceleration
    }

    /// Force.
    #[must_use]
    pub fn force(&self) -> Vector3<f64> {
        self.force
    }

    /// Torque.
    #[must_use]
    pub fn torque(&self) -> Vector3<f64> {
        self.torque
    }

    /// Set the position.
    pub fn set_position(&mut self, position: Vector3<f64>) {
        self.position = position;
        self.spatial.state_mut().set_filled();
    }

    /// Set the orientation.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
        self.spatial.state_mut().set_filled();
    }

    /// Set the orientation from raw `w, x, y, z` coefficients, normalizing them.
    ///
    /// Fails with [`StateError::InvalidParameter`] for a zero quaternion.
    pub fn set_orientation_coefficients(&mut self, w: f64, x: f64, y: f64, z: f64) -> Result<()> {
        let orientation = unit_quaternion(w, x, y, z)?;
        self.set_orientation(orientation);
        Ok(())
    }

    /// Set the linear velocity.
    pub fn set_linear_velocity(&mut self, linear_velocity: Vector3<f64>) {
        self.linear_velocity = linear_velocity;
        self.spatial.state_mut().set_filled();
    }

    /// Set the angular velocity.
    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        self.angular_velocity = angular_velocity;
        self.spatial.state_mut().set_filled();
    }

    /// Set the linear acceleration.
    pub fn set_linear_acceleration(&mut self, linear_acceleration: Vector3<f64>) {
        self.linear_acceleration = linear_acceleration;
        self.spatial.state_mut().set_filled();
    }

    /// Set the angular acceleration.
    pub fn set_angular_acceleration(&mut self, angular_acceleration: Vector3<f64>) {
        self.angular_acceleration = angular_acceleration;
        self.spatial.state_mut().set_filled();
    }

    /// Set the force.
    pub fn set_force(&mut self, force: Vector3<f64>) {
        self.force = force;
        self.spatial.state_mut().set_filled();
    }

    /// Set the torque.
    pub fn set_torque(&mut self, torque: Vector3<f64>) {
        self.torque = torque;
        self.spatial.state_mut().set_filled();
    }

    /// Reset every field to identity without touching the filled flag.
    pub fn set_zero(&mut self) {
        let spatial = self.spatial.clone();
        *self = Self {
            spatial,
            ..Self::new("", WORLD_FRAME)
        };
    }

    /// Reset every field to identity and mark the state empty.
    pub fn initialize(&mut self) {
        self.set_zero();
        self.spatial.state_mut().initialize();
    }

    /// Copy keeping only the fields selected by `variable`, retagged as
    /// `state_type`. Identity, emptiness and timestamp are preserved.
    pub(crate) fn projected(&self, state_type: StateType, variable: CartesianStateVariable) -> Self {
        let mut result = Self {
            spatial: self.spatial.clone(),
            ..Self::new("", WORLD_FRAME)
        };
        result.set_type(state_type);
        for field in variable.fields() {
            if *field == CartesianStateVariable::Orientation {
                result.orientation = self.orientation;
            } else if let (Some(target), Some(source)) =
                (result.vector_field_mut(*field), self.vector_field(*field))
            {
                *target = *source;
            }
        }
        result
    }

    fn vector_field(&self, field: CartesianStateVariable) -> Option<&Vector3<f64>> {
        match field {
            CartesianStateVariable::Position => Some(&self.position),
            CartesianStateVariable::LinearVelocity => Some(&self.linear_velocity),
            CartesianStateVariable::AngularVelocity => Some(&self.angular_velocity),
            CartesianStateVariable::LinearAcceleration => Some(&self.linear_acceleration),
            CartesianStateVariable::AngularAcceleration => Some(&self.angular_acceleration),
            CartesianStateVariable::Force => Some(&self.force),
            CartesianStateVariable::Torque => Some(&self.torque),
            _ => None,
        }
    }

    fn vector_field_mut(&mut self, field: CartesianStateVariable) -> Option<&mut Vector3<f64>> {
        match field {
            CartesianStateVariable::Position => Some(&mut self.position),
            CartesianStateVariable::LinearVelocity => Some(&mut self.linear_velocity),
            CartesianStateVariable::AngularVelocity => Some(&mut self.angular_velocity),
            CartesianStateVariable::LinearAcceleration => Some(&mut self.linear_acceleration),
            CartesianStateVariable::AngularAcceleration => Some(&mut self.angular_acceleration),
            CartesianStateVariable::Force => Some(&mut self.force),
            CartesianStateVariable::Torque => Some(&mut self.torque),
            _ => None,
        }
    }

    fn vector_fields_mut(&mut self) -> [&mut Vector3<f64>; 7] {
        [
            &mut self.position,
            &mut self.linear_velocity,
            &mut self.angular_velocity,
            &mut self.linear_acceleration,
            &mut self.angular_acceleration,
            &mut self.force,
            &mut self.torque,
        ]
    }

    /// Raw values of the selected fields, concatenated in storage order.
    ///
    /// This reads storage directly and does not check the filled flag.
    #[must_use]
    pub fn state_variable(&self, variable: CartesianStateVariable) -> DVector<f64> {
        let mut values = Vec::with_capacity(variable.size());
        for field in variable.fields() {
            match self.vector_field(*field) {
                Some(vector) => values.extend_from_slice(vector.as_slice()),
                None => {
                    let q = self.orientation.quaternion();
                    values.extend_from_slice(&[q.w, q.i, q.j, q.k]);
                }
            }
        }
        DVector::from_vec(values)
    }

    /// Write the selected fields from a flat slice and mark the state filled.
    ///
    /// Orientation coefficients are normalized.
    pub fn set_state_variable(
        &mut self,
        data: &[f64],
        variable: CartesianStateVariable,
    ) -> Result<()> {
        if data.len() != variable.size() {
            return Err(StateError::size_mismatch(
                format!("{variable} data"),
                variable.size(),
                data.len(),
            ));
        }
        // validate the quaternion before writing anything
        let mut orientation = None;
        let mut offset = 0;
        for field in variable.fields() {
            if *field == CartesianStateVariable::Orientation {
                let q = &data[offset..offset + 4];
                orientation = Some(unit_quaternion(q[0], q[1], q[2], q[3])?);
                offset += 4;
            } else {
                offset += 3;
            }
        }

        let mut offset = 0;
        for field in variable.fields() {
            if let Some(vector) = self.vector_field_mut(*field) {
                vector.copy_from_slice(&data[offset..offset + 3]);
                offset += 3;
            } else {
                offset += 4;
            }
        }
        if let Some(orientation) = orientation {
            self.orientation = orientation;
        }
        self.spatial.state_mut().set_filled();
        Ok(())
    }

    /// Set position and orientation from `[x, y, z, qw, qx, qy, qz]`.
    pub fn set_pose(&mut self, pose: &[f64]) -> Result<()> {
        self.set_state_variable(pose, CartesianStateVariable::Pose)
    }

    /// Set linear and angular velocity from a 6-vector.
    pub fn set_twist(&mut self, twist: &[f64]) -> Result<()> {
        self.set_state_variable(twist, CartesianStateVariable::Twist)
    }

    /// Set linear and angular acceleration from a 6-vector.
    pub fn set_acceleration(&mut self, acceleration: &[f64]) -> Result<()> {
        self.set_state_variable(acceleration, CartesianStateVariable::Acceleration)
    }

    /// Set force and torque from a 6-vector.
    pub fn set_wrench(&mut self, wrench: &[f64]) -> Result<()> {
        self.set_state_variable(wrench, CartesianStateVariable::Wrench)
    }

    /// All 25 values of the state.
    pub fn data(&self) -> Result<DVector<f64>> {
        self.assert_filled()?;
        Ok(self.state_variable(CartesianStateVariable::All))
    }

    /// All 25 values of the state as a `Vec`.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        Ok(self.data()?.as_slice().to_vec())
    }

    /// Set all 25 values of the state.
    pub fn set_data(&mut self, data: &[f64]) -> Result<()> {
        self.set_state_variable(data, CartesianStateVariable::All)
    }

    /// Compose two transforms: `self` maps `other`'s reference frame into
    /// `self`'s reference frame.
    ///
    /// Requires `self.name() == other.reference_frame()`. The result is named
    /// after `other` and expressed in `self`'s reference frame.
    ///
    /// Velocities and accelerations are transported to the composed frame,
    /// including the `w x p` and Coriolis terms. The torque is the moment
    /// about the origin of the result's reference frame, so the force of
    /// `other` acts through the full lever arm
    /// `self.position() + self.orientation() * other.position()`.
    pub fn compose(&self, other: &Self) -> Result<Self> {
        self.assert_filled()?;
        other.assert_filled()?;
        if self.name() != other.reference_frame() {
            tracing::debug!(
                expected = self.name(),
                actual = other.reference_frame(),
                "rejected composition across unrelated frames"
            );
            return Err(StateError::incompatible(format!(
                "cannot compose {} with a state expressed in {}: expected {}",
                self.name(),
                other.reference_frame(),
                self.name()
            )));
        }

        let rotation = self.orientation;
        let other_orientation = align_sign(&other.orientation, &rotation);
        let p = rotation * other.position;
        let v = rotation * other.linear_velocity;
        let w = rotation * other.angular_velocity;
        let f = rotation * other.force;
        let omega = self.angular_velocity;

        let mut result = Self::new(other.name(), self.reference_frame());
        result.position = self.position + p;
        result.orientation =
            UnitQuaternion::new_normalize(rotation.into_inner() * other_orientation.into_inner());
        result.linear_velocity = self.linear_velocity + v + omega.cross(&p);
        result.angular_velocity = omega + w;
        result.linear_acceleration = self.linear_acceleration
            + rotation * other.linear_acceleration
            + self.angular_acceleration.cross(&p)
            + 2.0 * omega.cross(&v)
            + omega.cross(&omega.cross(&p));
        result.angular_acceleration =
            self.angular_acceleration + rotation * other.angular_acceleration + omega.cross(&w);
        result.force = self.force + f;
        result.torque = self.torque + rotation * other.torque + result.position.cross(&f);
        result.spatial.state_mut().set_filled();
        Ok(result)
    }

    /// Inverse transform: swaps name and reference frame.
    pub fn inverse(&self) -> Result<Self> {
        self.assert_filled()?;
        let inverse_rotation = self.orientation.inverse();
        let mut result = self.clone();
        result.set_name(self.reference_frame());
        result.set_reference_frame(self.name());
        result.orientation = inverse_rotation;
        for vector in result.vector_fields_mut() {
            *vector = inverse_rotation * (-*vector);
        }
        Ok(result)
    }

    /// Field-wise sum; orientations combine by quaternion product.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.combine(other, false)
    }

    /// Field-wise difference; orientations combine by product with the conjugate.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, true)
    }

    fn combine(&self, other: &Self, subtract: bool) -> Result<Self> {
        self.assert_filled()?;
        other.assert_filled()?;
        self.spatial.assert_compatible(&other.spatial)?;

        let sign = if subtract { -1.0 } else { 1.0 };
        let mut aligned = align_sign(&other.orientation, &self.orientation);
        if subtract {
            aligned = aligned.conjugate();
        }

        let mut result = self.clone();
        result.orientation =
            UnitQuaternion::new_normalize(self.orientation.into_inner() * aligned.into_inner());
        for field in CartesianStateVariable::All.fields() {
            if let (Some(vector), Some(rhs)) =
                (result.vector_field_mut(*field), other.vector_field(*field))
            {
                *vector += rhs * sign;
            }
        }
        Ok(result)
    }

    /// Negate every vector and conjugate the orientation.
    pub fn negated(&self) -> Result<Self> {
        self.assert_filled()?;
        let mut result = self.clone();
        result.orientation = self.orientation.conjugate();
        for vector in result.vector_fields_mut() {
            *vector = -*vector;
        }
        Ok(result)
    }

    /// Scale every vector by `lambda` and the orientation's rotation angle by
    /// `lambda`.
    ///
    /// The rotation is read off the quaternion log with a half angle in
    /// `[0, pi]`, i.e. a rotation angle in `[0, 2 pi]` about the quaternion's
    /// own axis. Scaled angles past `2 pi` wrap, so scaling back by `1 / lambda`
    /// only restores the orientation while `|lambda| * angle <= 2 pi`.
    pub fn scaled(&self, lambda: f64) -> Result<Self> {
        self.assert_filled()?;
        let mut result = self.clone();
        result.orientation = quaternion_exp(&quaternion_log(&self.orientation).imag(), lambda);
        for vector in result.vector_fields_mut() {
            *vector *= lambda;
        }
        Ok(result)
    }

    /// Divide by a scalar. Fails with [`StateError::DivisionByZero`] for zero.
    pub fn divided(&self, lambda: f64) -> Result<Self> {
        if lambda == 0.0 {
            return Err(StateError::division_by_zero(format!(
                "{} state divided by zero",
                self.name()
            )));
        }
        self.scaled(1.0 / lambda)
    }

    /// Multiply the selected vector block by a square gain matrix.
    pub fn multiply_state_variable(
        &mut self,
        gain: &DMatrix<f64>,
        variable: CartesianStateVariable,
    ) -> Result<()> {
        if variable.contains_orientation() {
            return Err(StateError::NotImplemented(format!(
                "gain multiplication is not defined for {variable}"
            )));
        }
        self.assert_filled()?;
        let expected = variable.size();
        if gain.nrows() != expected {
            return Err(StateError::size_mismatch("gain matrix rows", expected, gain.nrows()));
        }
        if gain.ncols() != expected {
            return Err(StateError::size_mismatch(
                "gain matrix columns",
                expected,
                gain.ncols(),
            ));
        }
        let value = gain * self.state_variable(variable);
        self.set_state_variable(value.as_slice(), variable)
    }

    /// Clamp the norm of the selected vector block.
    ///
    /// When `noise_ratio` is non-zero and the norm is below
    /// `noise_ratio * max_value`, the block is zeroed. Otherwise a norm above
    /// `max_value` is scaled back down to `max_value`.
    pub fn clamp_state_variable(
        &mut self,
        max_value: f64,
        variable: CartesianStateVariable,
        noise_ratio: f64,
    ) -> Result<()> {
        if variable.contains_orientation() {
            return Err(StateError::NotImplemented(format!(
                "clamping is not defined for {variable}"
            )));
        }
        self.assert_filled()?;
        let mut value = self.state_variable(variable);
        let norm = value.norm();
        if noise_ratio != 0.0 && norm < noise_ratio * max_value {
            tracing::trace!(name = self.name(), %variable, norm, "dead zone applied");
            value.fill(0.0);
        } else if norm > max_value {
            value *= max_value / norm;
        }
        self.set_state_variable(value.as_slice(), variable)
    }

    /// Euclidean norm of each selected field, in storage order.
    pub fn norms(&self, variable: CartesianStateVariable) -> Result<Vec<f64>> {
        self.assert_filled()?;
        Ok(variable
            .fields()
            .iter()
            .map(|field| match self.vector_field(*field) {
                Some(vector) => vector.norm(),
                None => self.orientation.quaternion().norm(),
            })
            .collect())
    }

    /// Copy with each selected field normalized. Zero vectors stay zero.
    pub fn normalized(&self, variable: CartesianStateVariable) -> Result<Self> {
        self.assert_filled()?;
        let mut result = self.clone();
        for field in variable.fields() {
            if let Some(vector) = result.vector_field_mut(*field) {
                if let Some(unit) = vector.try_normalize(0.0) {
                    *vector = unit;
                }
            }
        }
        Ok(result)
    }

    /// Sum of the distances between the selected fields.
    ///
    /// Orientations contribute the angle between them.
    pub fn dist(&self, other: &Self, variable: CartesianStateVariable) -> Result<f64> {
        self.assert_filled()?;
        other.assert_filled()?;
        self.spatial.assert_compatible(&other.spatial)?;
        Ok(variable
            .fields()
            .iter()
            .map(|field| match (self.vector_field(*field), other.vector_field(*field)) {
                (Some(a), Some(b)) => (a - b).norm(),
                _ => {
                    let inner = self.orientation.coords.dot(&other.orientation.coords);
                    (2.0 * inner * inner - 1.0).clamp(-1.0, 1.0).acos()
                }
            })
            .sum())
    }
}

impl StateLike for CartesianState {
    fn state(&self) -> &State {
        self.spatial.state()
    }

    fn as_spatial(&self) -> Option<&SpatialState> {
        Some(&self.spatial)
    }
}

/// Free-function form of [`CartesianState::dist`].
pub fn cartesian_dist(
    a: &CartesianState,
    b: &CartesianState,
    variable: CartesianStateVariable,
) -> Result<f64> {
    a.dist(b, variable)
}

pub(crate) fn unit_quaternion(w: f64, x: f64, y: f64, z: f64) -> Result<UnitQuaternion<f64>> {
    UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f64::EPSILON).ok_or_else(|| {
        StateError::InvalidParameter(format!(
            "quaternion [{w}, {x}, {y}, {z}] cannot be normalized"
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample(name: &str, reference: &str) -> CartesianState {
        let mut state = CartesianState::identity(name, reference);
        state.set_position(Vector3::new(1.0, 2.0, 3.0));
        state.set_orientation(UnitQuaternion::from_euler_angles(0.1, -0.4, 0.7));
        state.set_linear_velocity(Vector3::new(0.3, 0.0, -0.2));
        state.set_angular_velocity(Vector3::new(0.0, 0.5, 0.1));
        state.set_linear_acceleration(Vector3::new(1.0, 1.0, 0.0));
        state.set_angular_acceleration(Vector3::new(0.0, 0.0, 2.0));
        state.set_force(Vector3::new(5.0, 0.0, 0.0));
        state.set_torque(Vector3::new(0.0, -1.0, 0.0));
        state
    }

    fn assert_same_rotation(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) {
        assert_relative_eq!(a.angle_to(b), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_variable_sizes() {
        assert_eq!(CartesianStateVariable::Position.size(), 3);
        assert_eq!(CartesianStateVariable::Orientation.size(), 4);
        assert_eq!(CartesianStateVariable::Pose.size(), 7);
        assert_eq!(CartesianStateVariable::Twist.size(), 6);
        assert_eq!(CartesianStateVariable::Wrench.size(), 6);
        assert_eq!(CartesianStateVariable::All.size(), 25);
        assert!(CartesianStateVariable::Pose.contains_orientation());
        assert!(!CartesianStateVariable::Twist.contains_orientation());
    }

    #[test]
    fn test_new_is_empty_identity() {
        let state = CartesianState::new("ee", "base");
        assert!(state.is_empty());
        assert_eq!(state.state_type(), StateType::CartesianState);
        assert_eq!(state.position(), Vector3::zeros());
        assert_eq!(state.orientation(), UnitQuaternion::identity());
        assert!(state.data().unwrap_err().is_empty_state());
    }

    #[test]
    fn test_setter_fills() {
        let mut state = CartesianState::new("ee", "base");
        state.set_force(Vector3::new(0.0, 0.0, 1.0));
        assert!(!state.is_empty());
    }

    #[test]
    fn test_orientation_is_normalized() {
        let mut state = CartesianState::new("ee", "base");
        state.set_orientation_coefficients(2.0, 0.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(state.orientation().quaternion().norm(), 1.0);

        state
            .set_pose(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])
            .unwrap();
        assert_relative_eq!(state.orientation().w, 0.5);

        let err = state.set_orientation_coefficients(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(err, Err(StateError::InvalidParameter(_))));
    }

    #[test]
    fn test_failed_set_pose_leaves_state_untouched() {
        let mut state = CartesianState::new("ee", "base");
        let err = state
            .set_pose(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidParameter(_)));
        assert_eq!(state.position(), Vector3::zeros());
        assert_eq!(state.orientation(), UnitQuaternion::identity());
        assert!(state.is_empty());

        let mut filled = sample("ee", "base");
        let before = filled.data().unwrap();
        let mut all = vec![9.0; 25];
        all[3..7].copy_from_slice(&[0.0; 4]);
        assert!(filled.set_data(&all).is_err());
        assert_eq!(filled.data().unwrap(), before);
    }

    #[test]
    fn test_compose_wrench_lever_arm() {
        let mut a = CartesianState::identity("ee", "base");
        a.set_position(Vector3::new(1.0, 0.0, 0.0));
        a.set_orientation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2));
        let mut b = CartesianState::identity("contact", "ee");
        b.set_position(Vector3::new(1.0, 0.0, 0.0));
        b.set_force(Vector3::new(1.0, 0.0, 0.0));
        b.set_torque(Vector3::new(0.0, 0.0, 0.5));

        let c = a.compose(&b).unwrap();
        // contact sits at (1, 1, 0) in base and pushes along +y
        assert_relative_eq!(c.position(), Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(c.force(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(c.torque(), Vector3::new(0.0, 0.0, 1.5), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_angular_acceleration_transport() {
        let mut a = CartesianState::identity("base", "world");
        a.set_angular_velocity(Vector3::new(0.0, 0.0, 1.0));
        a.set_angular_acceleration(Vector3::new(0.0, 0.0, 2.0));
        let mut b = CartesianState::identity("ee", "base");
        b.set_position(Vector3::new(1.0, 0.0, 0.0));
        b.set_angular_velocity(Vector3::new(1.0, 0.0, 0.0));

        let c = a.compose(&b).unwrap();
        assert_relative_eq!(c.angular_velocity(), Vector3::new(1.0, 0.0, 1.0), epsilon = 1e-12);
        // alpha + w x w_b
        assert_relative_eq!(
            c.angular_acceleration(),
            Vector3::new(0.0, 1.0, 2.0),
            epsilon = 1e-12
        );
        // alpha x p + w x (w x p)
        assert_relative_eq!(
            c.linear_acceleration(),
            Vector3::new(-1.0, 2.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_compose_coriolis() {
        let mut a = CartesianState::identity("base", "world");
        a.set_angular_velocity(Vector3::new(0.0, 0.0, 1.0));
        let mut b = CartesianState::identity("ee", "base");
        b.set_linear_velocity(Vector3::new(1.0, 0.0, 0.0));

        let c = a.compose(&b).unwrap();
        assert_relative_eq!(c.linear_velocity(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        // 2 w x v at the origin
        assert_relative_eq!(
            c.linear_acceleration(),
            Vector3::new(0.0, 2.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_state_variable_layout() {
        let state = sample("ee", "base");
        let pose = state.state_variable(CartesianStateVariable::Pose);
        assert_eq!(pose.len(), 7);
        assert_eq!(pose[0], 1.0);
        assert_eq!(pose[3], state.orientation().w);
        assert_eq!(pose[4], state.orientation().i);

        let all = state.data().unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(all[7], 0.3);
        assert_eq!(all[22], 0.0);
        assert_eq!(all[23], -1.0);

        let mut copy = CartesianState::new("copy", "base");
        copy.set_data(all.as_slice()).unwrap();
        assert_relative_eq!(copy.data().unwrap(), all, epsilon = 1e-12);
    }

    #[test]
    fn test_set_state_variable_size() {
        let mut state = CartesianState::new("ee", "base");
        let err = state
            .set_state_variable(&[1.0, 2.0], CartesianStateVariable::Twist)
            .unwrap_err();
        assert!(err.is_size_mismatch());
    }

    #[test]
    fn test_set_zero_keeps_identity() {
        let mut state = sample("ee", "base");
        state.set_zero();
        assert_eq!(state.name(), "ee");
        assert_eq!(state.reference_frame(), "base");
        assert!(!state.is_empty());
        assert_eq!(state.force(), Vector3::zeros());

        state.initialize();
        assert!(state.is_empty());
    }

    #[test]
    fn test_compose_poses() {
        let mut a = CartesianState::identity("base", "world");
        a.set_position(Vector3::new(1.0, 0.0, 0.0));
        a.set_orientation(UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2));
        let mut b = CartesianState::identity("ee", "base");
        b.set_position(Vector3::new(1.0, 0.0, 0.0));

        let c = a.compose(&b).unwrap();
        assert_eq!(c.name(), "ee");
        assert_eq!(c.reference_frame(), "world");
        assert_relative_eq!(c.position(), Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(c.orientation().angle(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_velocity_transport() {
        let mut a = CartesianState::identity("base", "world");
        a.set_angular_velocity(Vector3::new(0.0, 0.0, 1.0));
        let mut b = CartesianState::identity("ee", "base");
        b.set_position(Vector3::new(1.0, 0.0, 0.0));

        let c = a.compose(&b).unwrap();
        // rotating base drags ee along: omega x r
        assert_relative_eq!(c.linear_velocity(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        // centripetal acceleration
        assert_relative_eq!(
            c.linear_acceleration(),
            Vector3::new(-1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_compose_requires_parent() {
        let a = CartesianState::identity("base", "world");
        let b = CartesianState::identity("ee", "tool");
        assert!(a.compose(&b).unwrap_err().is_incompatible_states());

        let empty = CartesianState::new("ee", "base");
        assert!(a.compose(&empty).unwrap_err().is_empty_state());
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let a = sample("ee", "base");
        let identity = a.compose(&a.inverse().unwrap()).unwrap();
        assert_eq!(identity.name(), "base");
        assert_eq!(identity.reference_frame(), "base");
        assert_relative_eq!(identity.position(), Vector3::zeros(), epsilon = 1e-12);
        assert_same_rotation(&identity.orientation(), &UnitQuaternion::identity());
    }

    #[test]
    fn test_inverse_involution() {
        let a = sample("ee", "base");
        let inv = a.inverse().unwrap();
        assert_eq!(inv.name(), "base");
        assert_eq!(inv.reference_frame(), "ee");

        let back = inv.inverse().unwrap();
        assert_eq!(back.name(), "ee");
        assert_relative_eq!(back.data().unwrap(), a.data().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_add_sub() {
        let a = sample("ee", "base");
        let mut b = CartesianState::identity("tool", "base");
        b.set_position(Vector3::new(0.5, 0.5, 0.5));
        b.set_orientation(UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0));
        b.set_torque(Vector3::new(1.0, 1.0, 1.0));

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.name(), "ee");
        assert_relative_eq!(sum.position(), Vector3::new(1.5, 2.5, 3.5), epsilon = 1e-12);
        assert_same_rotation(
            &sum.orientation(),
            &(a.orientation() * b.orientation()),
        );

        let back = sum.checked_sub(&b).unwrap();
        assert_relative_eq!(back.position(), a.position(), epsilon = 1e-12);
        assert_relative_eq!(back.torque(), a.torque(), epsilon = 1e-12);
        assert_same_rotation(&back.orientation(), &a.orientation());
    }

    #[test]
    fn test_add_incompatible() {
        let a = sample("ee", "base");
        let b = CartesianState::identity("x", "world");
        let err = a.checked_add(&b).unwrap_err();
        assert!(err.is_incompatible_states());
    }

    #[test]
    fn test_negated() {
        let a = sample("ee", "base");
        let neg = a.negated().unwrap();
        assert_relative_eq!(neg.force(), -a.force());
        let zero = a.checked_add(&neg).unwrap();
        assert_relative_eq!(zero.position(), Vector3::zeros(), epsilon = 1e-12);
        assert_same_rotation(&zero.orientation(), &UnitQuaternion::identity());
    }

    #[test]
    fn test_scaled() {
        let mut a = CartesianState::identity("ee", "base");
        a.set_position(Vector3::new(1.0, -1.0, 2.0));
        a.set_orientation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.4));
        a.set_force(Vector3::new(0.0, 2.0, 0.0));

        let scaled = a.scaled(2.0).unwrap();
        assert_relative_eq!(scaled.position(), Vector3::new(2.0, -2.0, 4.0));
        assert_relative_eq!(scaled.force(), Vector3::new(0.0, 4.0, 0.0));
        assert_relative_eq!(scaled.orientation().angle(), 0.8, epsilon = 1e-12);

        let halved = a.divided(2.0).unwrap();
        assert_relative_eq!(halved.position(), Vector3::new(0.5, -0.5, 1.0));

        assert!(matches!(
            a.divided(0.0),
            Err(StateError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_scaled_empty_fails() {
        let a = CartesianState::new("ee", "base");
        assert!(a.scaled(2.0).unwrap_err().is_empty_state());
    }

    #[test]
    fn test_multiply_state_variable() {
        let mut a = sample("ee", "base");
        let gain = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0, 2.0, 1.0, 1.0, 1.0]));
        a.multiply_state_variable(&gain, CartesianStateVariable::Twist)
            .unwrap();
        assert_relative_eq!(a.linear_velocity(), Vector3::new(0.6, 0.0, -0.4));
        assert_relative_eq!(a.angular_velocity(), Vector3::new(0.0, 0.5, 0.1));

        let wrong = DMatrix::identity(3, 3);
        let err = a
            .multiply_state_variable(&wrong, CartesianStateVariable::Twist)
            .unwrap_err();
        assert!(err.is_size_mismatch());

        let err = a
            .multiply_state_variable(&DMatrix::identity(7, 7), CartesianStateVariable::Pose)
            .unwrap_err();
        assert!(matches!(err, StateError::NotImplemented(_)));
    }

    #[test]
    fn test_clamp_state_variable() {
        let mut a = CartesianState::identity("ee", "base");
        a.set_linear_velocity(Vector3::new(3.0, 4.0, 0.0));
        a.clamp_state_variable(1.0, CartesianStateVariable::LinearVelocity, 0.0)
            .unwrap();
        assert_relative_eq!(a.linear_velocity(), Vector3::new(0.6, 0.8, 0.0), epsilon = 1e-12);

        a.set_angular_velocity(Vector3::new(0.01, 0.0, 0.0));
        a.clamp_state_variable(1.0, CartesianStateVariable::AngularVelocity, 0.1)
            .unwrap();
        assert_eq!(a.angular_velocity(), Vector3::zeros());

        let err = a
            .clamp_state_variable(1.0, CartesianStateVariable::Orientation, 0.0)
            .unwrap_err();
        assert!(matches!(err, StateError::NotImplemented(_)));
    }

    #[test]
    fn test_norms_and_normalized() {
        let mut a = CartesianState::identity("ee", "base");
        a.set_position(Vector3::new(3.0, 4.0, 0.0));
        let norms = a.norms(CartesianStateVariable::Pose).unwrap();
        assert_eq!(norms.len(), 2);
        assert_relative_eq!(norms[0], 5.0);
        assert_relative_eq!(norms[1], 1.0);

        let all = a.norms(CartesianStateVariable::All).unwrap();
        assert_eq!(all.len(), 8);

        let normalized = a.normalized(CartesianStateVariable::All).unwrap();
        assert_relative_eq!(normalized.position(), Vector3::new(0.6, 0.8, 0.0));
        assert_eq!(normalized.force(), Vector3::zeros());
    }

    #[test]
    fn test_dist() {
        let mut a = CartesianState::identity("a", "world");
        a.set_position(Vector3::new(1.0, 0.0, 0.0));
        let mut b = CartesianState::identity("b", "world");
        b.set_orientation(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.5));

        assert_relative_eq!(
            a.dist(&b, CartesianStateVariable::Position).unwrap(),
            1.0
        );
        assert_relative_eq!(
            a.dist(&b, CartesianStateVariable::Orientation).unwrap(),
            0.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            cartesian_dist(&a, &b, CartesianStateVariable::Pose).unwrap(),
            1.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_spatial_capability() {
        let a = CartesianState::identity("ee", "base");
        assert!(a.as_spatial().is_some());
        let b = CartesianState::identity("tool", "base");
        assert!(!a.spatial().is_incompatible_with(&b).unwrap());
    }

    #[test]
    fn test_random_is_filled_unit() {
        let a = CartesianState::random("ee", "base");
        assert!(!a.is_empty());
        assert_relative_eq!(a.orientation().quaternion().norm(), 1.0, epsilon = 1e-12);
        assert!(a.position().iter().all(|x| (-1.0..=1.0).contains(x)));
    }
}
