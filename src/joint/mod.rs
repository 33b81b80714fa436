//! Joint-space states.
//!
//! [`JointState`] holds all four joint quantities. [`JointPositions`],
//! [`JointVelocities`], [`JointAccelerations`] and [`JointTorques`] are typed
//! projections that dereference to it for reads and keep their own field only.

mod accelerations;
mod positions;
mod state;
mod torques;
mod velocities;

pub use accelerations::JointAccelerations;
pub use positions::JointPositions;
pub use state::{joint_dist, JointState, JointStateVariable};
pub use torques::JointTorques;
pub use velocities::JointVelocities;

pub(crate) use state::default_joint_names;

use std::ops::Deref;

use crate::state::StateType;

/// Shared behavior of the typed joint projections.
pub trait JointProjection: Deref<Target = JointState> + Sized {
    /// Type tag carried by the projection.
    const STATE_TYPE: StateType;
    /// Field exposed by `data()`.
    const VARIABLE: JointStateVariable;

    /// Project a general joint state, keeping only this projection's field.
    fn from_joint_state(state: &JointState) -> Self;

    /// Unwrap into the general joint state.
    fn into_joint_state(self) -> JointState;

    /// Borrow the general joint state.
    fn as_joint_state(&self) -> &JointState {
        self
    }
}

/// Implements the projection plumbing for a newtype over [`JointState`].
macro_rules! joint_projection {
    ($ty:ident, $state_type:expr, $variable:expr) => {
        impl $crate::joint::JointProjection for $ty {
            const STATE_TYPE: $crate::StateType = $state_type;
            const VARIABLE: $crate::joint::JointStateVariable = $variable;

            fn from_joint_state(state: &$crate::joint::JointState) -> Self {
                Self(state.projected($state_type, $variable))
            }

            fn into_joint_state(self) -> $crate::joint::JointState {
                self.0
            }
        }

        impl ::std::ops::Deref for $ty {
            type Target = $crate::joint::JointState;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl $crate::StateLike for $ty {
            fn state(&self) -> &$crate::State {
                $crate::StateLike::state(&self.0)
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::with_size("", 0)
            }
        }

        impl From<&$crate::joint::JointState> for $ty {
            fn from(state: &$crate::joint::JointState) -> Self {
                <Self as $crate::joint::JointProjection>::from_joint_state(state)
            }
        }

        impl From<$ty> for $crate::joint::JointState {
            fn from(projection: $ty) -> Self {
                projection.0
            }
        }

        impl $ty {
            /// Create an empty state for the given joints.
            #[must_use]
            pub fn new<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Self($crate::joint::JointState::with_type(
                    $state_type,
                    robot_name,
                    joint_names,
                ))
            }

            /// Create an empty state with joints named `joint0 .. joint{N-1}`.
            #[must_use]
            pub fn with_size(robot_name: impl Into<String>, nb_joints: usize) -> Self {
                Self::new(robot_name, $crate::joint::default_joint_names(nb_joints))
            }

            /// Create a filled state with all values at zero.
            #[must_use]
            pub fn zero<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let mut projection = Self::new(robot_name, joint_names);
                projection.0.set_empty(false);
                projection
            }

            /// Create a filled state with values drawn uniformly from `[-1, 1]`.
            #[must_use]
            pub fn random<I, S>(robot_name: impl Into<String>, joint_names: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Self::project($crate::joint::JointState::random(robot_name, joint_names))
            }

            fn project(state: $crate::joint::JointState) -> Self {
                <Self as $crate::joint::JointProjection>::from_joint_state(&state)
            }

            /// Set the robot name.
            pub fn set_name(&mut self, name: impl Into<String>) {
                self.0.set_name(name);
            }

            /// Rename the joints. The number of names must not change.
            pub fn set_names<I, S>(&mut self, joint_names: I) -> $crate::Result<()>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.0.set_names(joint_names)
            }

            /// Set the empty flag.
            pub fn set_empty(&mut self, empty: bool) {
                self.0.set_empty(empty);
            }

            /// Refresh the timestamp to now.
            pub fn reset_timestamp(&mut self) {
                self.0.reset_timestamp();
            }

            /// Reset every value to zero without touching the filled flag.
            pub fn set_zero(&mut self) {
                self.0.set_zero();
            }

            /// Reset every value to zero and mark the state empty.
            pub fn initialize(&mut self) {
                self.0.initialize();
            }

            /// Values of this projection's field.
            pub fn data(&self) -> $crate::Result<::nalgebra::DVector<f64>> {
                self.0.assert_filled()?;
                Ok(self.0.state_variable($variable))
            }

            /// Values of this projection's field as a `Vec`.
            pub fn to_vec(&self) -> $crate::Result<Vec<f64>> {
                Ok(self.data()?.as_slice().to_vec())
            }

            /// Set this projection's field; one value per joint.
            pub fn set_data(&mut self, data: &[f64]) -> $crate::Result<()> {
                self.0.set_state_variable(data, $variable)
            }

            /// Value-wise sum with a compatible state.
            pub fn checked_add(&self, other: &Self) -> $crate::Result<Self> {
                self.0.checked_add(&other.0).map(Self::project)
            }

            /// Value-wise difference with a compatible state.
            pub fn checked_sub(&self, other: &Self) -> $crate::Result<Self> {
                self.0.checked_sub(&other.0).map(Self::project)
            }

            /// Every value multiplied by `lambda`.
            pub fn scaled(&self, lambda: f64) -> $crate::Result<Self> {
                self.0.scaled(lambda).map(Self::project)
            }

            /// Every value divided by a non-zero `lambda`.
            pub fn divided(&self, lambda: f64) -> $crate::Result<Self> {
                self.0.divided(lambda).map(Self::project)
            }

            /// Values multiplied by an `N x N` gain matrix.
            pub fn scaled_by_matrix(
                &self,
                gain: &::nalgebra::DMatrix<f64>,
            ) -> $crate::Result<Self> {
                let mut result = self.clone();
                result.0.multiply_state_variable(gain, $variable)?;
                Ok(result)
            }

            /// Values multiplied element-wise by an `N` gain vector.
            pub fn scaled_elementwise(
                &self,
                gain: &::nalgebra::DVector<f64>,
            ) -> $crate::Result<Self> {
                let mut result = self.clone();
                result.0.multiply_state_variable_elementwise(gain, $variable)?;
                Ok(result)
            }
        }
    };
}

/// Per-joint clamping for a projection.
macro_rules! joint_clamp {
    ($ty:ident, $variable:expr) => {
        impl $ty {
            /// Clamp every joint to `[-max_absolute, max_absolute]`, zeroing
            /// values below `noise_ratio * max_absolute` when the ratio is
            /// non-zero.
            pub fn clamp(&mut self, max_absolute: f64, noise_ratio: f64) -> $crate::Result<()> {
                self.0
                    .clamp_state_variable(max_absolute, $variable, noise_ratio)
            }

            /// Clamped copy, see `clamp`.
            pub fn clamped(&self, max_absolute: f64, noise_ratio: f64) -> $crate::Result<Self> {
                let mut result = self.clone();
                result.clamp(max_absolute, noise_ratio)?;
                Ok(result)
            }

            /// Clamp each joint against its own limit and dead zone.
            pub fn clamp_per_joint(
                &mut self,
                max_absolute: &[f64],
                noise_ratio: &[f64],
            ) -> $crate::Result<()> {
                self.0
                    .clamp_state_variable_per_joint(max_absolute, $variable, noise_ratio)
            }

            /// Clamp with validated per-joint limits.
            pub fn clamp_with(&mut self, limits: &$crate::JointLimits) -> $crate::Result<()> {
                limits.validate()?;
                self.clamp_per_joint(&limits.max_absolute, &limits.noise_ratio)
            }
        }
    };
}

pub(crate) use joint_clamp;
pub(crate) use joint_projection;
