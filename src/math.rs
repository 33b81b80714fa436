//! Unit quaternion logarithm and exponential maps.
//!
//! `log` maps a unit quaternion `(cos(θ/2), sin(θ/2) n)` to the pure
//! quaternion `(0, θ/2 n)`; `exp` goes back.

use std::f64::consts::TAU;
use std::time::Duration;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::Rng;

use crate::{Result, StateError};

/// Below this norm a rotation vector is treated as the identity rotation.
pub const ROTATION_EPSILON: f64 = 1e-12;

/// Logarithm of a unit quaternion as a pure quaternion.
///
/// # Example
///
/// ```
/// use state_types::math::quaternion_log;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0);
/// let log = quaternion_log(&q);
/// assert!(log.w.abs() < 1e-12);
/// assert!((log.k - 0.5).abs() < 1e-12);
/// ```
#[must_use]
pub fn quaternion_log(q: &UnitQuaternion<f64>) -> Quaternion<f64> {
    let imag = q.imag();
    let norm = imag.norm();
    if norm < ROTATION_EPSILON {
        return Quaternion::new(0.0, 0.0, 0.0, 0.0);
    }
    let half_angle = norm.atan2(q.w);
    Quaternion::from_imag(imag * (half_angle / norm))
}

/// Exponential of the pure quaternion `(0, scale * v)`.
#[must_use]
pub fn quaternion_exp(v: &Vector3<f64>, scale: f64) -> UnitQuaternion<f64> {
    let norm = v.norm();
    if norm < ROTATION_EPSILON {
        return UnitQuaternion::identity();
    }
    let half_angle = norm * scale;
    UnitQuaternion::from_quaternion(Quaternion::from_parts(
        half_angle.cos(),
        v * (half_angle.sin() / norm),
    ))
}

/// Uniformly distributed random rotation (Shoemake's method).
pub(crate) fn random_unit_quaternion<R: Rng + ?Sized>(rng: &mut R) -> UnitQuaternion<f64> {
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen::<f64>() * TAU;
    let u3: f64 = rng.gen::<f64>() * TAU;
    let (a, b) = ((1.0 - u1).sqrt(), u1.sqrt());
    UnitQuaternion::new_normalize(Quaternion::new(
        b * u3.cos(),
        a * u2.sin(),
        a * u2.cos(),
        b * u3.sin(),
    ))
}

/// Return `q` or `-q`, whichever lies in the same hemisphere as `reference`.
#[must_use]
pub(crate) fn align_sign(
    q: &UnitQuaternion<f64>,
    reference: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    if reference.coords.dot(&q.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        *q
    }
}

/// Duration in seconds, rejecting zero for differentiation.
pub(crate) fn nonzero_seconds(dt: Duration, name: &str) -> Result<f64> {
    let seconds = dt.as_secs_f64();
    if seconds == 0.0 {
        return Err(StateError::division_by_zero(format!(
            "{name} differentiated over a zero duration"
        )));
    }
    Ok(seconds)
}
