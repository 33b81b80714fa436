//! The dense joint-space state record.

use std::collections::HashSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use crate::state::{State, StateLike, StateType};
use crate::{Result, StateError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selector for the fields of a [`JointState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointStateVariable {
    /// Joint positions.
    Positions,
    /// Joint velocities.
    Velocities,
    /// Joint accelerations.
    Accelerations,
    /// Joint torques.
    Torques,
    /// All four fields, in the order above.
    All,
}

impl JointStateVariable {
    fn field_range(self) -> Range<usize> {
        match self {
            Self::Positions => 0..1,
            Self::Velocities => 1..2,
            Self::Accelerations => 2..3,
            Self::Torques => 3..4,
            Self::All => 0..4,
        }
    }

    /// Length of the data vector for a state with `nb_joints` joints.
    #[must_use]
    pub fn size(self, nb_joints: usize) -> usize {
        self.field_range().len() * nb_joints
    }
}

impl std::fmt::Display for JointStateVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Positions => "positions",
            Self::Velocities => "velocities",
            Self::Accelerations => "accelerations",
            Self::Torques => "torques",
            Self::All => "all",
        };
        write!(f, "{name}")
    }
}

/// Generates whole-vector and per-joint accessors for one field.
macro_rules! joint_field_accessors {
    (
        $field:ident, $variable:expr, $doc:literal,
        $get_one:ident, $get_at:ident, $set_all:ident, $set_one:ident, $set_at:ident
    ) => {
        #[doc = concat!("All joint ", $doc, ".")]
        #[must_use]
        pub fn $field(&self) -> &DVector<f64> {
            &self.$field
        }

        #[doc = concat!("Joint ", $doc, " of the joint called `name`.")]
        pub fn $get_one(&self, name: &str) -> Result<f64> {
            let index = self.joint_index(name)?;
            Ok(self.$field[index])
        }

        #[doc = concat!("Joint ", $doc, " of the joint at `index`.")]
        pub fn $get_at(&self, index: usize) -> Result<f64> {
            self.check_index(index)?;
            Ok(self.$field[index])
        }

        #[doc = concat!("Set all joint ", $doc, "; the slice must have one value per joint.")]
        pub fn $set_all(&mut self, values: &[f64]) -> Result<()> {
            self.set_state_variable(values, $variable)
        }

        #[doc = concat!("Set the joint ", $doc, " of the joint called `name`.")]
        pub fn $set_one(&mut self, name: &str, value: f64) -> Result<()> {
            let index = self.joint_index(name)?;
            self.$field[index] = value;
            self.state.set_filled();
            Ok(())
        }

        #[doc = concat!("Set the joint ", $doc, " of the joint at `index`.")]
        pub fn $set_at(&mut self, index: usize, value: f64) -> Result<()> {
            self.check_index(index)?;
            self.$field[index] = value;
            self.state.set_filled();
            Ok(())
        }
    };
}

/// Positions, velocities, accelerations and torques of a named set of joints.
///
/// Two joint states are compatible when they have the same type and exactly
/// the same joint names in the same order.
///
/// # Example
///
/// ```
/// use state_types::{JointState, JointStateVariable};
///
/// let mut state = JointState::zero("arm", ["shoulder", "elbow", "wrist"]);
/// state.set_positions(&[1.0, 2.0, 3.0]).unwrap();
///
/// let doubled = state.scaled_state_variable(2.0, JointStateVariable::Positions).unwrap();
/// assert_eq!(doubled.positions().as_slice(), &[2.0, 4.0, 6.0]);
/// assert_eq!(doubled.position("elbow").unwrap(), 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct JointState {
    state: State,
    names: Vec<String>,
    positions: DVector<f64>,
    velocities: DVector<f64>,
    accelerations: DVector<f64>,
    torques: DVector<f64>,
}

impl Default for JointState {
    fn default() -> Self {
        Self::with_size("", 0)
    }
}

impl JointState {
    /// Create an empty state for the given joints.
    #[must_use]
    pub fn new<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_type(StateType::JointState, robot_name, joint_names)
    }

    pub(crate) fn with_type<I, S>(
        state_type: StateType,
        robot_name: impl Into<String>,
        joint_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = joint_names.into_iter().map(Into::into).collect();
        let size = names.len();
        let state = Self {
            state: State::new(state_type, robot_name),
            names,
            positions: DVector::zeros(size),
            velocities: DVector::zeros(size),
            accelerations: DVector::zeros(size),
            torques: DVector::zeros(size),
        };
        state.warn_duplicate_names();
        state
    }

    /// Create an empty state with joints named `joint0 .. joint{N-1}`.
    #[must_use]
    pub fn with_size(robot_name: impl Into<String>, nb_joints: usize) -> Self {
        Self::new(robot_name, default_joint_names(nb_joints))
    }

    /// Create a filled state with all values at zero.
    #[must_use]
    pub fn zero<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new(robot_name, joint_names);
        state.state.set_filled();
        state
    }

    /// Create a filled state with values drawn uniformly from `[-1, 1]`.
    #[must_use]
    pub fn random<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rng = rand::thread_rng();
        let mut state = Self::zero(robot_name, joint_names);
        for vector in state.vectors_mut() {
            vector.apply(|x| *x = rng.gen_range(-1.0..=1.0));
        }
        state
    }

    pub(crate) fn set_type(&mut self, state_type: StateType) {
        self.state.set_type(state_type);
    }

    /// Copy keeping only the fields selected by `variable`, retagged as
    /// `state_type`. Identity, emptiness and timestamp are preserved.
    pub(crate) fn projected(&self, state_type: StateType, variable: JointStateVariable) -> Self {
        let mut result = self.clone();
        result.set_type(state_type);
        let keep = variable.field_range();
        for (index, vector) in result.vectors_mut().into_iter().enumerate() {
            if !keep.contains(&index) {
                vector.fill(0.0);
            }
        }
        result
    }

    fn warn_duplicate_names(&self) {
        let mut seen = HashSet::with_capacity(self.names.len());
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                tracing::warn!(
                    robot = self.name(),
                    joint = name.as_str(),
                    "duplicate joint name, lookups by name return the first match"
                );
            }
        }
    }

    /// Get the type tag.
    #[must_use]
    pub fn state_type(&self) -> StateType {
        self.state.state_type()
    }

    /// Get the robot name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Set the robot name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.set_name(name);
    }

    /// Check if no field has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Set the empty flag.
    pub fn set_empty(&mut self, empty: bool) {
        self.state.set_empty(empty);
    }

    /// Get the creation (or last reset) time.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.state.timestamp()
    }

    /// Refresh the timestamp to now.
    pub fn reset_timestamp(&mut self) {
        self.state.reset_timestamp();
    }

    /// Time elapsed since the timestamp.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.state.age()
    }

    /// Check if the state is at least `threshold` old.
    #[must_use]
    pub fn is_deprecated(&self, threshold: Duration) -> bool {
        self.state.is_deprecated(threshold)
    }

    /// Fail with [`StateError::EmptyState`] if the state is empty.
    pub fn assert_filled(&self) -> Result<()> {
        self.state.assert_filled()
    }

    /// Number of joints.
    #[must_use]
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Joint names, in storage order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Rename the joints. The number of names must not change.
    pub fn set_names<I, S>(&mut self, joint_names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = joint_names.into_iter().map(Into::into).collect();
        if names.len() != self.size() {
            return Err(StateError::size_mismatch(
                "joint names",
                self.size(),
                names.len(),
            ));
        }
        self.names = names;
        self.warn_duplicate_names();
        Ok(())
    }

    /// Index of the first joint called `name`.
    pub fn joint_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|joint| joint == name)
            .ok_or_else(|| StateError::joint_not_found(name))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.size() {
            return Err(StateError::joint_index_out_of_range(index, self.size()));
        }
        Ok(())
    }

    joint_field_accessors!(
        positions,
        JointStateVariable::Positions,
        "positions",
        position,
        position_at,
        set_positions,
        set_position,
        set_position_at
    );

    joint_field_accessors!(
        velocities,
        JointStateVariable::Velocities,
        "velocities",
        velocity,
        velocity_at,
        set_velocities,
        set_velocity,
        set_velocity_at
    );

    joint_field_accessors!(
        accelerations,
        JointStateVariable::Accelerations,
        "accelerations",
        acceleration,
        acceleration_at,
        set_accelerations,
        set_acceleration,
        set_acceleration_at
    );

    joint_field_accessors!(
        torques,
        JointStateVariable::Torques,
        "torques",
        torque,
        torque_at,
        set_torques,
        set_torque,
        set_torque_at
    );

    fn vectors(&self) -> [&DVector<f64>; 4] {
        [
            &self.positions,
            &self.velocities,
            &self.accelerations,
            &self.torques,
        ]
    }

    fn vectors_mut(&mut self) -> [&mut DVector<f64>; 4] {
        [
            &mut self.positions,
            &mut self.velocities,
            &mut self.accelerations,
            &mut self.torques,
        ]
    }

    /// Reset every value to zero without touching the filled flag.
    pub fn set_zero(&mut self) {
        for vector in self.vectors_mut() {
            vector.fill(0.0);
        }
    }

    /// Reset every value to zero and mark the state empty.
    pub fn initialize(&mut self) {
        self.set_zero();
        self.state.initialize();
    }

    /// Check the type tag and the joint names, in order.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.state.is_compatible(&other.state) && self.names == other.names
    }

    /// Negation of [`JointState::is_compatible`].
    #[must_use]
    pub fn is_incompatible(&self, other: &Self) -> bool {
        !self.is_compatible(other)
    }

    /// Fail with [`StateError::IncompatibleStates`] unless the states are compatible.
    pub fn assert_compatible(&self, other: &Self) -> Result<()> {
        if self.is_incompatible(other) {
            tracing::debug!(
                name = self.name(),
                other_name = other.name(),
                "rejected operation between joint states with different joints"
            );
            return Err(StateError::incompatible(format!(
                "{} {} with joints {:?} does not match {} {} with joints {:?}",
                self.state_type(),
                self.name(),
                self.names,
                other.state_type(),
                other.name(),
                other.names
            )));
        }
        Ok(())
    }

    /// Raw values of the selected fields, concatenated in storage order.
    ///
    /// This reads storage directly and does not check the filled flag.
    #[must_use]
    pub fn state_variable(&self, variable: JointStateVariable) -> DVector<f64> {
        let vectors = self.vectors();
        let values: Vec<f64> = vectors[variable.field_range()]
            .iter()
            .flat_map(|vector| vector.iter().copied())
            .collect();
        DVector::from_vec(values)
    }

    /// Write the selected fields from a flat slice and mark the state filled.
    pub fn set_state_variable(&mut self, data: &[f64], variable: JointStateVariable) -> Result<()> {
        let size = self.size();
        let expected = variable.size(size);
        if data.len() != expected {
            return Err(StateError::size_mismatch(
                format!("{variable} data"),
                expected,
                data.len(),
            ));
        }
        let range = variable.field_range();
        for (index, vector) in self.vectors_mut()[range].iter_mut().enumerate() {
            let offset = index * size;
            vector.copy_from_slice(&data[offset..offset + size]);
        }
        self.state.set_filled();
        Ok(())
    }

    /// All `4N` values: positions, velocities, accelerations, torques.
    pub fn data(&self) -> Result<DVector<f64>> {
        self.assert_filled()?;
        Ok(self.state_variable(JointStateVariable::All))
    }

    /// All `4N` values as a `Vec`.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        Ok(self.data()?.as_slice().to_vec())
    }

    /// Set all `4N` values.
    pub fn set_data(&mut self, data: &[f64]) -> Result<()> {
        self.set_state_variable(data, JointStateVariable::All)
    }

    /// Clamp every selected value to `[-max_absolute, max_absolute]`, zeroing
    /// values inside the dead zone `noise_ratio * max_absolute`.
    pub fn clamp_state_variable(
        &mut self,
        max_absolute: f64,
        variable: JointStateVariable,
        noise_ratio: f64,
    ) -> Result<()> {
        let size = variable.size(self.size());
        self.clamp_state_variable_per_joint(
            &vec![max_absolute; size],
            variable,
            &vec![noise_ratio; size],
        )
    }

    /// Clamp each selected value against its own maximum and dead zone.
    ///
    /// Values with `|x| < noise_ratio * max` are set to zero when the ratio is
    /// non-zero; values with `|x| > max` are brought back to `±max`.
    pub fn clamp_state_variable_per_joint(
        &mut self,
        max_absolute: &[f64],
        variable: JointStateVariable,
        noise_ratio: &[f64],
    ) -> Result<()> {
        self.assert_filled()?;
        let expected = variable.size(self.size());
        if max_absolute.len() != expected {
            return Err(StateError::size_mismatch(
                "max absolute values",
                expected,
                max_absolute.len(),
            ));
        }
        if noise_ratio.len() != expected {
            return Err(StateError::size_mismatch(
                "noise ratios",
                expected,
                noise_ratio.len(),
            ));
        }
        let mut values = self.state_variable(variable);
        for ((value, max), ratio) in values.iter_mut().zip(max_absolute).zip(noise_ratio) {
            let magnitude = value.abs();
            if *ratio != 0.0 && magnitude < ratio * max {
                *value = 0.0;
            } else if magnitude > *max {
                *value *= max / magnitude;
            }
        }
        self.set_state_variable(values.as_slice(), variable)
    }

    /// Multiply the selected values by a square gain matrix.
    pub fn multiply_state_variable(
        &mut self,
        gain: &DMatrix<f64>,
        variable: JointStateVariable,
    ) -> Result<()> {
        self.assert_filled()?;
        let expected = variable.size(self.size());
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
        let values = gain * self.state_variable(variable);
        self.set_state_variable(values.as_slice(), variable)
    }

    /// Multiply the selected values element-wise by a gain vector.
    pub fn multiply_state_variable_elementwise(
        &mut self,
        gain: &DVector<f64>,
        variable: JointStateVariable,
    ) -> Result<()> {
        self.assert_filled()?;
        let expected = variable.size(self.size());
        if gain.len() != expected {
            return Err(StateError::size_mismatch("gain vector", expected, gain.len()));
        }
        let values = self.state_variable(variable).component_mul(gain);
        self.set_state_variable(values.as_slice(), variable)
    }

    /// Every value multiplied by `lambda`.
    pub fn scaled(&self, lambda: f64) -> Result<Self> {
        self.scaled_state_variable(lambda, JointStateVariable::All)
    }

    /// Copy with the selected values multiplied by `lambda`.
    pub fn scaled_state_variable(&self, lambda: f64, variable: JointStateVariable) -> Result<Self> {
        self.assert_filled()?;
        let mut result = self.clone();
        for vector in &mut result.vectors_mut()[variable.field_range()] {
            **vector *= lambda;
        }
        Ok(result)
    }

    /// Every value divided by a non-zero `lambda`.
    pub fn divided(&self, lambda: f64) -> Result<Self> {
        if lambda == 0.0 {
            return Err(StateError::division_by_zero(format!(
                "{} joint state divided by zero",
                self.name()
            )));
        }
        self.scaled(1.0 / lambda)
    }

    /// All `4N` values multiplied by a `4N x 4N` gain matrix.
    pub fn scaled_by_matrix(&self, gain: &DMatrix<f64>) -> Result<Self> {
        let mut result = self.clone();
        result.multiply_state_variable(gain, JointStateVariable::All)?;
        Ok(result)
    }

    /// All `4N` values multiplied element-wise by a gain vector.
    pub fn scaled_elementwise(&self, gain: &DVector<f64>) -> Result<Self> {
        let mut result = self.clone();
        result.multiply_state_variable_elementwise(gain, JointStateVariable::All)?;
        Ok(result)
    }

    /// Value-wise sum with a compatible state.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.combine(other, 1.0)
    }

    /// Value-wise difference with a compatible state.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, -1.0)
    }

    fn combine(&self, other: &Self, sign: f64) -> Result<Self> {
        self.assert_filled()?;
        other.assert_filled()?;
        self.assert_compatible(other)?;
        let mut result = self.clone();
        for (vector, rhs) in result.vectors_mut().into_iter().zip(other.vectors()) {
            vector.axpy(sign, rhs, 1.0);
        }
        Ok(result)
    }

    /// Sum of the Euclidean norms of the differences of the selected fields.
    pub fn dist(&self, other: &Self, variable: JointStateVariable) -> Result<f64> {
        self.assert_filled()?;
        other.assert_filled()?;
        self.assert_compatible(other)?;
        let range = variable.field_range();
        Ok(self.vectors()[range.clone()]
            .iter()
            .zip(&other.vectors()[range])
            .map(|(a, b)| (*a - *b).norm())
            .sum())
    }
}

impl StateLike for JointState {
    fn state(&self) -> &State {
        &self.state
    }
}

/// Free-function form of [`JointState::dist`].
pub fn joint_dist(a: &JointState, b: &JointState, variable: JointStateVariable) -> Result<f64> {
    a.dist(b, variable)
}

pub(crate) fn default_joint_names(nb_joints: usize) -> Vec<String> {
    (0..nb_joints).map(|i| format!("joint{i}")).collect()
}
