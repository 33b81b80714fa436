//! Clamping limits for Cartesian and joint states.
//!
//! Limits describe the maximum magnitude a state variable may take and an
//! optional dead zone, expressed as a fraction of that maximum, below which
//! the variable is snapped to zero.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Limits for the linear and angular blocks of a Cartesian state variable.
///
/// # Example
///
/// ```
/// use state_types::CartesianLimits;
///
/// let limits = CartesianLimits::new(0.5, 1.0).dead_zone(0.1, 0.05);
/// assert!(limits.validate().is_ok());
/// assert_eq!(limits.max_linear, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CartesianLimits {
    /// Maximum norm of the linear block.
    pub max_linear: f64,
    /// Maximum norm of the angular block.
    pub max_angular: f64,
    /// Dead zone of the linear block, as a fraction of `max_linear`.
    pub linear_noise_ratio: f64,
    /// Dead zone of the angular block, as a fraction of `max_angular`.
    pub angular_noise_ratio: f64,
}

impl Default for CartesianLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl CartesianLimits {
    /// Create limits without a dead zone.
    #[must_use]
    pub fn new(max_linear: f64, max_angular: f64) -> Self {
        Self {
            max_linear,
            max_angular,
            linear_noise_ratio: 0.0,
            angular_noise_ratio: 0.0,
        }
    }

    /// Limits that never clamp.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY)
    }

    /// Set the dead zone ratios.
    #[must_use]
    pub fn dead_zone(mut self, linear_noise_ratio: f64, angular_noise_ratio: f64) -> Self {
        self.linear_noise_ratio = linear_noise_ratio;
        self.angular_noise_ratio = angular_noise_ratio;
        self
    }

    /// Validate the limits.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_linear.is_nan() || self.max_linear < 0.0 {
            return Err(crate::StateError::invalid_config(
                "max_linear must be non-negative",
            ));
        }
        if self.max_angular.is_nan() || self.max_angular < 0.0 {
            return Err(crate::StateError::invalid_config(
                "max_angular must be non-negative",
            ));
        }
        validate_dead_zone(self.max_linear, self.linear_noise_ratio)?;
        validate_dead_zone(self.max_angular, self.angular_noise_ratio)?;
        Ok(())
    }
}

/// Per-joint limits for a joint state variable.
///
/// # Example
///
/// ```
/// use state_types::JointLimits;
///
/// let limits = JointLimits::uniform(3, 2.0, 0.0);
/// assert_eq!(limits.len(), 3);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Maximum absolute value per joint.
    pub max_absolute: Vec<f64>,
    /// Dead zone per joint, as a fraction of the joint's maximum.
    pub noise_ratio: Vec<f64>,
}

impl JointLimits {
    /// Create per-joint limits without a dead zone.
    #[must_use]
    pub fn new(max_absolute: Vec<f64>) -> Self {
        let noise_ratio = vec![0.0; max_absolute.len()];
        Self {
            max_absolute,
            noise_ratio,
        }
    }

    /// Same limit and dead zone for every joint.
    #[must_use]
    pub fn uniform(nb_joints: usize, max_absolute: f64, noise_ratio: f64) -> Self {
        Self {
            max_absolute: vec![max_absolute; nb_joints],
            noise_ratio: vec![noise_ratio; nb_joints],
        }
    }

    /// Set the per-joint dead zone ratios.
    #[must_use]
    pub fn dead_zone(mut self, noise_ratio: Vec<f64>) -> Self {
        self.noise_ratio = noise_ratio;
        self
    }

    /// Number of joints covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max_absolute.len()
    }

    /// Check if no joint is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_absolute.is_empty()
    }

    /// Validate the limits.
    pub fn validate(&self) -> crate::Result<()> {
        if self.noise_ratio.len() != self.max_absolute.len() {
            return Err(crate::StateError::invalid_config(format!(
                "{} noise ratios given for {} joints",
                self.noise_ratio.len(),
                self.max_absolute.len()
            )));
        }
        if self.max_absolute.iter().any(|m| m.is_nan() || *m < 0.0) {
            return Err(crate::StateError::invalid_config(
                "joint limits must be non-negative",
            ));
        }
        self.max_absolute
            .iter()
            .zip(&self.noise_ratio)
            .try_for_each(|(max, ratio)| validate_dead_zone(*max, *ratio))
    }
}

fn validate_dead_zone(max: f64, ratio: f64) -> crate::Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(crate::StateError::invalid_config(format!(
            "noise ratio {ratio} must be between 0 and 1"
        )));
    }
    // an unbounded maximum would put every value inside the dead zone
    if ratio != 0.0 && max.is_infinite() {
        return Err(crate::StateError::invalid_config(
            "a dead zone needs a finite maximum",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_defaults() {
        let limits = CartesianLimits::default();
        assert!(limits.max_linear.is_infinite());
        assert_eq!(limits.linear_noise_ratio, 0.0);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_cartesian_validation() {
        assert!(CartesianLimits::new(-1.0, 1.0).validate().is_err());
        assert!(CartesianLimits::new(1.0, f64::NAN).validate().is_err());
        assert!(CartesianLimits::new(1.0, 1.0)
            .dead_zone(1.5, 0.0)
            .validate()
            .is_err());
        assert!(CartesianLimits::unlimited()
            .dead_zone(0.1, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_joint_validation() {
        let limits = JointLimits::new(vec![1.0, 2.0]);
        assert_eq!(limits.noise_ratio, vec![0.0, 0.0]);
        assert!(limits.validate().is_ok());

        let mismatched = JointLimits::new(vec![1.0, 2.0]).dead_zone(vec![0.1]);
        assert!(mismatched.validate().is_err());

        let negative = JointLimits::uniform(2, -1.0, 0.0);
        assert!(negative.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_limits_serialization() {
        let limits = CartesianLimits::new(0.5, 1.0);
        let json = serde_json::to_string(&limits).unwrap();
        let back: CartesianLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(back, limits);
    }
}
