//! Error types for state operations.

use thiserror::Error;

/// Errors that can occur when reading or combining states.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The operation needs numeric content that has not been written yet.
    #[error("{name} state is empty")]
    EmptyState {
        /// Name of the empty state.
        name: String,
    },

    /// The operands fail the reference frame or joint name compatibility check.
    #[error("incompatible states: {reason}")]
    IncompatibleStates {
        /// Description of the mismatch.
        reason: String,
    },

    /// A vector or matrix operand does not have the expected dimension.
    #[error("{context} is of incorrect size: expected {expected}, got {actual}")]
    IncompatibleSize {
        /// What was being sized.
        context: String,
        /// Expected dimension.
        expected: usize,
        /// Provided dimension.
        actual: usize,
    },

    /// Joint lookup by name missed, or a joint index is out of range.
    #[error("joint not found: {joint}")]
    JointNotFound {
        /// The joint name, or a description of the offending index.
        joint: String,
    },

    /// A spatial capability check was attempted on a non-spatial state.
    #[error("invalid cast: {0}")]
    InvalidCast(String),

    /// A parameter was read or written with a type it does not hold.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation is not defined for the requested state variable.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Division by a zero scalar or a zero duration.
    #[error("division by zero: {context}")]
    DivisionByZero {
        /// Where the division occurred.
        context: String,
    },

    /// Invalid limits or other configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl StateError {
    /// Create an empty state error.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::EmptyState { name: name.into() }
    }

    /// Create an incompatible states error.
    #[must_use]
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::IncompatibleStates {
            reason: reason.into(),
        }
    }

    /// Create a size mismatch error.
    #[must_use]
    pub fn size_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::IncompatibleSize {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a joint not found error for a joint name.
    #[must_use]
    pub fn joint_not_found(joint: impl Into<String>) -> Self {
        Self::JointNotFound {
            joint: joint.into(),
        }
    }

    /// Create a joint not found error for an out of range index.
    #[must_use]
    pub fn joint_index_out_of_range(index: usize, size: usize) -> Self {
        Self::JointNotFound {
            joint: format!("index {index} is out of range for joint state of size {size}"),
        }
    }

    /// Create a division by zero error.
    #[must_use]
    pub fn division_by_zero(context: impl Into<String>) -> Self {
        Self::DivisionByZero {
            context: context.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is an empty state error.
    #[must_use]
    pub fn is_empty_state(&self) -> bool {
        matches!(self, Self::EmptyState { .. })
    }

    /// Check if this is an incompatible states error.
    #[must_use]
    pub fn is_incompatible_states(&self) -> bool {
        matches!(self, Self::IncompatibleStates { .. })
    }

    /// Check if this is a size mismatch error.
    #[must_use]
    pub fn is_size_mismatch(&self) -> bool {
        matches!(self, Self::IncompatibleSize { .. })
    }
}
