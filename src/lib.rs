//! Typed kinematic state algebra for robotic systems.
//!
//! This crate provides Cartesian and joint-space states with physically
//! meaningful, self-checking arithmetic:
//!
//! - [`CartesianState`] - Pose, twist, acceleration and wrench of a frame
//! - [`CartesianPose`], [`CartesianTwist`], [`CartesianAcceleration`],
//!   [`CartesianWrench`] - Typed projections of the Cartesian state
//! - [`JointState`] - Positions, velocities, accelerations, torques of named joints
//! - [`JointPositions`], [`JointVelocities`], [`JointAccelerations`],
//!   [`JointTorques`] - Typed projections of the joint state
//! - [`Parameter`], [`ParameterMap`] - Named values of a closed set of kinds
//! - [`Ellipsoid`] - Planar ellipse anchored on a pose
//!
//! # Safety Checks
//!
//! Every state starts **empty** and becomes filled on its first field write.
//! Reading numeric content from an empty state fails with
//! [`StateError::EmptyState`]. Binary operations check compatibility first:
//!
//! - Cartesian states must be related by frame: one is expressed in the other,
//!   or both are expressed in the same frame.
//! - Joint states must have the same joint names in the same order.
//!
//! Operations that can fail return [`Result`]; nothing panics on bad input.
//!
//! # Conventions
//!
//! - Quaternions are laid out as `[w, x, y, z]` in data vectors.
//! - Pose data is `[position, quaternion]` (7), twist, acceleration and wrench
//!   data is `[linear, angular]` (6).
//! - Time steps are [`std::time::Duration`].
//!
//! # Example
//!
//! ```
//! use state_types::{CartesianPose, CartesianTwist};
//! use nalgebra::Vector3;
//! use std::time::Duration;
//!
//! let twist = CartesianTwist::from_parts(
//!     "ee",
//!     Vector3::new(0.1, 0.0, 0.0),
//!     Vector3::zeros(),
//!     "base",
//! );
//! let displacement = twist.integrate(Duration::from_secs(2)).unwrap();
//!
//! let start = CartesianPose::from_position("base", Vector3::new(0.0, 0.0, 1.0), "world");
//! let end = start.compose(&displacement).unwrap();
//!
//! assert_eq!(end.reference_frame(), "world");
//! assert!((end.position() - Vector3::new(0.2, 0.0, 1.0)).norm() < 1e-12);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::cast_precision_loss,       // usize to f64 is fine for sample counts
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

pub mod cartesian;
mod config;
mod error;
mod geometry;
pub mod joint;
pub mod math;
mod parameter;
mod spatial;
mod state;

pub use cartesian::{
    cartesian_dist, CartesianAcceleration, CartesianPose, CartesianProjection, CartesianState,
    CartesianStateVariable, CartesianTwist, CartesianWrench,
};
pub use config::{CartesianLimits, JointLimits};
pub use error::StateError;
pub use geometry::{Ellipsoid, Shape};
pub use joint::{
    joint_dist, JointAccelerations, JointPositions, JointProjection, JointState,
    JointStateVariable, JointTorques, JointVelocities,
};
pub use parameter::{Parameter, ParameterMap, ParameterPayload, ParameterType, ParameterValue};
pub use spatial::{SpatialState, WORLD_FRAME};
pub use state::{State, StateLike, StateType};

// Re-export math types for convenience
pub use nalgebra::{DMatrix, DVector, Isometry3, Matrix6, UnitQuaternion, Vector3};

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
