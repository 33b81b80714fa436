//! Cartesian (task-space) states.
//!
//! [`CartesianState`] is the dense record. [`CartesianPose`], [`CartesianTwist`],
//! [`CartesianAcceleration`] and [`CartesianWrench`] are typed projections over
//! it: they dereference to the general state for reads, only expose setters
//! for their own fields, and re-project every arithmetic result.

mod acceleration;
mod pose;
mod state;
mod twist;
mod wrench;

pub use acceleration::CartesianAcceleration;
pub use pose::CartesianPose;
pub use state::{cartesian_dist, CartesianState, CartesianStateVariable};
pub use twist::CartesianTwist;
pub use wrench::CartesianWrench;

pub(crate) use state::unit_quaternion;

use std::ops::Deref;

use crate::state::StateType;

/// Shared behavior of the typed Cartesian projections.
pub trait CartesianProjection: Deref<Target = CartesianState> + Sized {
    /// Type tag carried by the projection.
    const STATE_TYPE: StateType;
    /// Fields exposed by `data()`.
    const VARIABLE: CartesianStateVariable;

    /// Project a general state, keeping only this projection's fields.
    fn from_cartesian(state: &CartesianState) -> Self;

    /// Unwrap into the general state.
    fn into_cartesian(self) -> CartesianState;

    /// Borrow the general state.
    fn as_cartesian(&self) -> &CartesianState {
        self
    }
}

/// Implements the projection plumbing for a newtype over [`CartesianState`].
macro_rules! cartesian_projection {
    ($ty:ident, $state_type:expr, $variable:expr) => {
        impl $crate::cartesian::CartesianProjection for $ty {
            const STATE_TYPE: $crate::StateType = $state_type;
            const VARIABLE: $crate::cartesian::CartesianStateVariable = $variable;

            fn from_cartesian(state: &$crate::cartesian::CartesianState) -> Self {
                Self(state.projected($state_type, $variable))
            }

            fn into_cartesian(self) -> $crate::cartesian::CartesianState {
                self.0
            }
        }

        impl ::std::ops::Deref for $ty {
            type Target = $crate::cartesian::CartesianState;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl $crate::StateLike for $ty {
            fn state(&self) -> &$crate::State {
                $crate::StateLike::state(&self.0)
            }

            fn as_spatial(&self) -> Option<&$crate::SpatialState> {
                Some(self.0.spatial())
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new("", $crate::WORLD_FRAME)
            }
        }

        impl From<&$crate::cartesian::CartesianState> for $ty {
            fn from(state: &$crate::cartesian::CartesianState) -> Self {
                <Self as $crate::cartesian::CartesianProjection>::from_cartesian(state)
            }
        }

        impl From<$ty> for $crate::cartesian::CartesianState {
            fn from(projection: $ty) -> Self {
                projection.0
            }
        }

        impl $ty {
            /// Create an empty state.
            #[must_use]
            pub fn new(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
                Self($crate::cartesian::CartesianState::with_type(
                    $state_type,
                    name,
                    reference_frame,
                ))
            }

            fn project(state: $crate::cartesian::CartesianState) -> Self {
                <Self as $crate::cartesian::CartesianProjection>::from_cartesian(&state)
            }

            /// Set the name.
            pub fn set_name(&mut self, name: impl Into<String>) {
                self.0.set_name(name);
            }

            /// Set the reference frame.
            pub fn set_reference_frame(&mut self, reference_frame: impl Into<String>) {
                self.0.set_reference_frame(reference_frame);
            }

            /// Set the empty flag.
            pub fn set_empty(&mut self, empty: bool) {
                self.0.set_empty(empty);
            }

            /// Refresh the timestamp to now.
            pub fn reset_timestamp(&mut self) {
                self.0.reset_timestamp();
            }

            /// Reset the fields to identity without touching the filled flag.
            pub fn set_zero(&mut self) {
                self.0.set_zero();
            }

            /// Reset the fields to identity and mark the state empty.
            pub fn initialize(&mut self) {
                self.0.initialize();
            }

            /// Values of this projection's fields.
            pub fn data(&self) -> $crate::Result<::nalgebra::DVector<f64>> {
                self.0.assert_filled()?;
                Ok(self.0.state_variable($variable))
            }

            /// Values of this projection's fields as a `Vec`.
            pub fn to_vec(&self) -> $crate::Result<Vec<f64>> {
                Ok(self.data()?.as_slice().to_vec())
            }

            /// Set this projection's fields from a flat slice of exact length.
            pub fn set_data(&mut self, data: &[f64]) -> $crate::Result<()> {
                self.0.set_state_variable(data, $variable)
            }

            /// Inverse transform, swapping name and reference frame.
            pub fn inverse(&self) -> $crate::Result<Self> {
                self.0.inverse().map(Self::project)
            }

            /// Field-wise sum with a compatible state.
            pub fn checked_add(&self, other: &Self) -> $crate::Result<Self> {
                self.0.checked_add(&other.0).map(Self::project)
            }

            /// Field-wise difference with a compatible state.
            pub fn checked_sub(&self, other: &Self) -> $crate::Result<Self> {
                self.0.checked_sub(&other.0).map(Self::project)
            }

            /// Negated state.
            pub fn negated(&self) -> $crate::Result<Self> {
                self.0.negated().map(Self::project)
            }

            /// Scaled state.
            pub fn scaled(&self, lambda: f64) -> $crate::Result<Self> {
                self.0.scaled(lambda).map(Self::project)
            }

            /// State divided by a non-zero scalar.
            pub fn divided(&self, lambda: f64) -> $crate::Result<Self> {
                self.0.divided(lambda).map(Self::project)
            }

            /// Copy with the selected fields normalized.
            pub fn normalized(
                &self,
                variable: $crate::cartesian::CartesianStateVariable,
            ) -> $crate::Result<Self> {
                self.0.normalized(variable).map(Self::project)
            }
        }
    };
}

/// Clamping of the linear and angular blocks of a 6-dimensional projection.
macro_rules! cartesian_clamp {
    ($ty:ident, $linear:expr, $angular:expr) => {
        impl $ty {
            /// Clamp the linear and angular blocks independently.
            ///
            /// Each block is zeroed when its norm falls in the dead zone given
            /// by its noise ratio, and scaled down when it exceeds its maximum.
            pub fn clamp(
                &mut self,
                max_linear: f64,
                max_angular: f64,
                linear_noise_ratio: f64,
                angular_noise_ratio: f64,
            ) -> $crate::Result<()> {
                self.0
                    .clamp_state_variable(max_linear, $linear, linear_noise_ratio)?;
                self.0
                    .clamp_state_variable(max_angular, $angular, angular_noise_ratio)
            }

            /// Clamped copy, see `clamp`.
            pub fn clamped(
                &self,
                max_linear: f64,
                max_angular: f64,
                linear_noise_ratio: f64,
                angular_noise_ratio: f64,
            ) -> $crate::Result<Self> {
                let mut result = self.clone();
                result.clamp(max_linear, max_angular, linear_noise_ratio, angular_noise_ratio)?;
                Ok(result)
            }

            /// Clamp with validated limits.
            pub fn clamp_with(&mut self, limits: &$crate::CartesianLimits) -> $crate::Result<()> {
                limits.validate()?;
                self.clamp(
                    limits.max_linear,
                    limits.max_angular,
                    limits.linear_noise_ratio,
                    limits.angular_noise_ratio,
                )
            }
        }
    };
}

pub(crate) use cartesian_clamp;
pub(crate) use cartesian_projection;
