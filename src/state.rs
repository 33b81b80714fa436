//! Base state identity: type tag, name, filled flag and timestamp.
//!
//! Every concrete state in this crate embeds a [`State`]. It carries no numeric
//! content; it only answers "what is this, is it filled, and how old is it".

use std::time::{Duration, Instant};

use crate::spatial::SpatialState;
use crate::{Result, StateError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed set of concrete state kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StateType {
    /// Bare state with no numeric content.
    State,
    /// State with a reference frame but no numeric content.
    SpatialState,
    /// Full Cartesian state.
    CartesianState,
    /// Cartesian pose (position and orientation).
    CartesianPose,
    /// Cartesian twist (linear and angular velocity).
    CartesianTwist,
    /// Cartesian acceleration (linear and angular).
    CartesianAcceleration,
    /// Cartesian wrench (force and torque).
    CartesianWrench,
    /// Full joint state.
    JointState,
    /// Joint positions.
    JointPositions,
    /// Joint velocities.
    JointVelocities,
    /// Joint accelerations.
    JointAccelerations,
    /// Joint torques.
    JointTorques,
    /// Geometric shape.
    GeometryShape,
    /// Ellipsoid shape.
    Ellipsoid,
    /// Named parameter.
    Parameter,
}

impl StateType {
    /// Check if states of this kind carry a reference frame.
    #[must_use]
    pub const fn is_spatial(self) -> bool {
        matches!(
            self,
            Self::SpatialState
                | Self::CartesianState
                | Self::CartesianPose
                | Self::CartesianTwist
                | Self::CartesianAcceleration
                | Self::CartesianWrench
        )
    }

    /// Check if states of this kind live in joint space.
    #[must_use]
    pub const fn is_joint(self) -> bool {
        matches!(
            self,
            Self::JointState
                | Self::JointPositions
                | Self::JointVelocities
                | Self::JointAccelerations
                | Self::JointTorques
        )
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::State => "State",
            Self::SpatialState => "SpatialState",
            Self::CartesianState => "CartesianState",
            Self::CartesianPose => "CartesianPose",
            Self::CartesianTwist => "CartesianTwist",
            Self::CartesianAcceleration => "CartesianAcceleration",
            Self::CartesianWrench => "CartesianWrench",
            Self::JointState => "JointState",
            Self::JointPositions => "JointPositions",
            Self::JointVelocities => "JointVelocities",
            Self::JointAccelerations => "JointAccelerations",
            Self::JointTorques => "JointTorques",
            Self::GeometryShape => "Shape",
            Self::Ellipsoid => "Ellipsoid",
            Self::Parameter => "Parameter",
        };
        write!(f, "{name}")
    }
}

/// Identity and bookkeeping shared by all states.
///
/// A freshly constructed state is empty: it has a name and a type but no
/// meaningful numeric content. The first explicit field write marks it filled.
///
/// Cloning copies the timestamp as well, so a clone is exactly as old as its
/// source. Call [`State::reset_timestamp`] to refresh it.
///
/// # Example
///
/// ```
/// use state_types::{State, StateType};
/// use std::time::Duration;
///
/// let mut state = State::new(StateType::State, "robot");
/// assert!(state.is_empty());
///
/// state.set_filled();
/// assert!(!state.is_empty());
/// assert!(!state.is_deprecated(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone)]
pub struct State {
    state_type: StateType,
    name: String,
    empty: bool,
    timestamp: Instant,
}

impl Default for State {
    fn default() -> Self {
        Self::new(StateType::State, "")
    }
}

impl State {
    /// Create an empty state of the given kind.
    #[must_use]
    pub fn new(state_type: StateType, name: impl Into<String>) -> Self {
        Self {
            state_type,
            name: name.into(),
            empty: true,
            timestamp: Instant::now(),
        }
    }

    /// Get the type tag.
    #[must_use]
    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    pub(crate) fn set_type(&mut self, state_type: StateType) {
        self.state_type = state_type;
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Check if no meaningful data has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Set the empty flag.
    pub fn set_empty(&mut self, empty: bool) {
        self.empty = empty;
    }

    /// Mark the state as holding meaningful data.
    pub fn set_filled(&mut self) {
        self.empty = false;
    }

    /// Put the state back to its empty condition.
    pub fn initialize(&mut self) {
        self.empty = true;
    }

    /// Get the creation (or last reset) time.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Refresh the timestamp to now.
    pub fn reset_timestamp(&mut self) {
        self.timestamp = Instant::now();
    }

    /// Time elapsed since the timestamp.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    /// Check if the state is at least `threshold` old.
    #[must_use]
    pub fn is_deprecated(&self, threshold: Duration) -> bool {
        self.age() >= threshold
    }

    /// Check if two states may be combined. Base states only need equal types.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.state_type == other.state_type
    }

    /// Negation of [`State::is_compatible`].
    #[must_use]
    pub fn is_incompatible(&self, other: &Self) -> bool {
        !self.is_compatible(other)
    }

    /// Fail with [`StateError::EmptyState`] if the state is empty.
    pub fn assert_filled(&self) -> Result<()> {
        if self.empty {
            return Err(StateError::empty(&self.name));
        }
        Ok(())
    }
}

/// Capability seam implemented by every concrete state.
///
/// Callers holding heterogeneous states use [`StateLike::as_spatial`] to ask
/// whether a reference frame is available instead of casting.
pub trait StateLike {
    /// Access the base state.
    fn state(&self) -> &State;

    /// Access the spatial part, if this state carries a reference frame.
    fn as_spatial(&self) -> Option<&SpatialState> {
        None
    }
}

impl StateLike for State {
    fn state(&self) -> &State {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = State::new(StateType::State, "robot");
        assert!(state.is_empty());
        assert_eq!(state.name(), "robot");
        assert_eq!(state.state_type(), StateType::State);
        assert!(state.assert_filled().unwrap_err().is_empty_state());
    }

    #[test]
    fn test_fill_and_initialize() {
        let mut state = State::new(StateType::State, "robot");
        state.set_filled();
        assert!(state.assert_filled().is_ok());
        state.initialize();
        assert!(state.is_empty());
    }

    #[test]
    fn test_deprecation() {
        let state = State::new(StateType::State, "robot");
        assert!(state.is_deprecated(Duration::ZERO));
        assert!(!state.is_deprecated(Duration::from_secs(3600)));
    }

    #[test]
    fn test_clone_keeps_timestamp() {
        let state = State::new(StateType::State, "robot");
        let copy = state.clone();
        assert_eq!(copy.timestamp(), state.timestamp());

        let mut reset = copy;
        reset.reset_timestamp();
        assert!(reset.timestamp() >= state.timestamp());
    }

    #[test]
    fn test_type_compatibility() {
        let a = State::new(StateType::JointState, "a");
        let b = State::new(StateType::JointState, "b");
        let c = State::new(StateType::CartesianPose, "c");
        assert!(a.is_compatible(&b));
        assert!(a.is_incompatible(&c));
    }

    #[test]
    fn test_type_tags() {
        assert!(StateType::CartesianTwist.is_spatial());
        assert!(!StateType::JointState.is_spatial());
        assert!(StateType::JointTorques.is_joint());
        assert_eq!(StateType::CartesianPose.to_string(), "CartesianPose");
    }

    #[test]
    fn test_plain_state_has_no_spatial_capability() {
        let state = State::new(StateType::State, "robot");
        assert!(state.as_spatial().is_none());
    }
}
