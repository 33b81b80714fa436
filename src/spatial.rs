//! Reference frames and the frame compatibility protocol.

use crate::state::{State, StateLike, StateType};
use crate::{Result, StateError};

/// Reference frame used when none is given.
pub const WORLD_FRAME: &str = "world";

/// A state expressed in a named reference frame.
///
/// Two spatial states are compatible when one is the parent of the other,
/// the child of the other, or when both are expressed in the same frame.
///
/// # Example
///
/// ```
/// use state_types::SpatialState;
///
/// let ee = SpatialState::new("ee", "base");
/// let base = SpatialState::new("base", "world");
/// let tool = SpatialState::new("tool", "base");
///
/// assert!(ee.is_compatible(&base)); // ee is expressed in base
/// assert!(ee.is_compatible(&tool)); // siblings in base
/// assert!(!base.is_compatible(&SpatialState::new("x", "y")));
/// ```
#[derive(Debug, Clone)]
pub struct SpatialState {
    state: State,
    reference_frame: String,
}

impl Default for SpatialState {
    fn default() -> Self {
        Self::new("", WORLD_FRAME)
    }
}

impl SpatialState {
    /// Create an empty spatial state.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::with_type(StateType::SpatialState, name, reference_frame)
    }

    pub(crate) fn with_type(
        state_type: StateType,
        name: impl Into<String>,
        reference_frame: impl Into<String>,
    ) -> Self {
        Self {
            state: State::new(state_type, name),
            reference_frame: reference_frame.into(),
        }
    }

    /// Access the base state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable access to the base state.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Set the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.set_name(name);
    }

    /// Get the reference frame.
    #[must_use]
    pub fn reference_frame(&self) -> &str {
        &self.reference_frame
    }

    /// Set the reference frame.
    pub fn set_reference_frame(&mut self, reference_frame: impl Into<String>) {
        self.reference_frame = reference_frame.into();
    }

    /// Check if the state is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Check the parent / child / sibling frame relation.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        // parent of other
        self.name() == other.reference_frame
            // child of other
            || self.reference_frame == other.name()
            // sibling of other
            || self.reference_frame == other.reference_frame
    }

    /// Negation of [`SpatialState::is_compatible`].
    #[must_use]
    pub fn is_incompatible(&self, other: &Self) -> bool {
        !self.is_compatible(other)
    }

    /// Frame incompatibility against any state.
    ///
    /// Fails with [`StateError::InvalidCast`] if `other` has no reference frame.
    pub fn is_incompatible_with(&self, other: &dyn StateLike) -> Result<bool> {
        let spatial = other.as_spatial().ok_or_else(|| {
            StateError::InvalidCast(format!(
                "{} of type {} has no reference frame",
                other.state().name(),
                other.state().state_type()
            ))
        })?;
        Ok(self.is_incompatible(spatial))
    }

    /// Fail with [`StateError::IncompatibleStates`] unless the frames are related.
    pub fn assert_compatible(&self, other: &Self) -> Result<()> {
        if self.is_incompatible(other) {
            tracing::debug!(
                name = self.name(),
                frame = self.reference_frame(),
                other_name = other.name(),
                other_frame = other.reference_frame(),
                "rejected operation between unrelated frames"
            );
            return Err(StateError::incompatible(format!(
                "{} expressed in {} is not related to {} expressed in {}",
                self.name(),
                self.reference_frame,
                other.name(),
                other.reference_frame
            )));
        }
        Ok(())
    }
}

impl StateLike for SpatialState {
    fn state(&self) -> &State {
        &self.state
    }

    fn as_spatial(&self) -> Option<&SpatialState> {
        Some(self)
    }
}
