//! Geometric shapes anchored on a Cartesian pose.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::ops::Deref;

use nalgebra::{UnitQuaternion, Vector3};

use crate::cartesian::CartesianPose;
use crate::spatial::WORLD_FRAME;
use crate::state::{State, StateLike, StateType};
use crate::{Result, StateError};

/// A named shape with a center pose.
#[derive(Debug, Clone)]
pub struct Shape {
    state: State,
    center: CartesianPose,
}

impl Default for Shape {
    fn default() -> Self {
        Self::new("", WORLD_FRAME)
    }
}

impl Shape {
    /// Create an empty shape centered at the origin of `reference_frame`.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self::with_type(StateType::GeometryShape, name, reference_frame)
    }

    fn with_type(
        state_type: StateType,
        name: impl Into<String>,
        reference_frame: impl Into<String>,
    ) -> Self {
        let state = State::new(state_type, name);
        let center = CartesianPose::identity(state.name(), reference_frame);
        Self { state, center }
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

    /// Frame the center pose is expressed in.
    #[must_use]
    pub fn reference_frame(&self) -> &str {
        self.center.reference_frame()
    }

    /// Check if the shape has not been set yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Center pose.
    #[must_use]
    pub fn center_pose(&self) -> &CartesianPose {
        &self.center
    }

    /// Center position.
    #[must_use]
    pub fn center_position(&self) -> Vector3<f64> {
        self.center.position()
    }

    /// Center orientation.
    #[must_use]
    pub fn center_orientation(&self) -> UnitQuaternion<f64> {
        self.center.orientation()
    }

    /// Set the center pose. Fails with [`StateError::EmptyState`] for an
    /// empty pose.
    pub fn set_center_pose(&mut self, pose: CartesianPose) -> Result<()> {
        pose.assert_filled()?;
        self.center = pose;
        self.state.set_filled();
        Ok(())
    }

    /// Set the center position.
    pub fn set_center_position(&mut self, position: Vector3<f64>) {
        self.center.set_position(position);
        self.state.set_filled();
    }

    /// Set the center orientation.
    pub fn set_center_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.center.set_orientation(orientation);
        self.state.set_filled();
    }
}

impl StateLike for Shape {
    fn state(&self) -> &State {
        &self.state
    }
}

/// An ellipse in the xy-plane of its center pose, rotated about z.
///
/// The data vector layout is
/// `[center_x, center_y, center_z, rotation_angle, axis_length_x, axis_length_y]`.
///
/// # Example
///
/// ```
/// use state_types::Ellipsoid;
///
/// // x^2 / 4 + y^2 - 1 = 0
/// let ellipse = Ellipsoid::from_algebraic_equation("e", &[0.25, 0.0, 1.0, 0.0, 0.0, -1.0], "world")
///     .unwrap();
/// let [a, b] = ellipse.axis_lengths();
/// assert!((a - 2.0).abs() < 1e-12 && (b - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    shape: Shape,
    axis_lengths: [f64; 2],
    rotation_angle: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::new("", WORLD_FRAME)
    }
}

impl Deref for Ellipsoid {
    type Target = Shape;

    fn deref(&self) -> &Self::Target {
        &self.shape
    }
}

impl Ellipsoid {
    /// Create an empty ellipsoid with unit axes.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        Self {
            shape: Shape::with_type(StateType::Ellipsoid, name, reference_frame),
            axis_lengths: [1.0, 1.0],
            rotation_angle: 0.0,
        }
    }

    /// Filled unit circle at the origin.
    #[must_use]
    pub fn unit(name: impl Into<String>, reference_frame: impl Into<String>) -> Self {
        let mut ellipsoid = Self::new(name, reference_frame);
        ellipsoid.shape.state.set_filled();
        ellipsoid
    }

    /// Ellipse satisfying `a x^2 + b xy + c y^2 + d x + e y + f = 0`.
    ///
    /// `coefficients` is `[a, b, c, d, e, f]`. Non-elliptic or degenerate
    /// conics fail with [`StateError::InvalidParameter`].
    pub fn from_algebraic_equation(
        name: impl Into<String>,
        coefficients: &[f64],
        reference_frame: impl Into<String>,
    ) -> Result<Self> {
        let &[a, b, c, d, e, f] = coefficients else {
            return Err(StateError::size_mismatch(
                "ellipse coefficients",
                6,
                coefficients.len(),
            ));
        };
        let discriminant = b * b - 4.0 * a * c;
        if discriminant >= 0.0 {
            return Err(StateError::InvalidParameter(format!(
                "conic with discriminant {discriminant} is not an ellipse"
            )));
        }
        let determinant = 2.0 * (a * e * e + c * d * d - b * d * e + discriminant * f);
        let spread = ((a - c).powi(2) + b * b).sqrt();
        let major = -(determinant * (a + c + spread)).sqrt() / discriminant;
        let minor = -(determinant * (a + c - spread)).sqrt() / discriminant;
        if !(major.is_finite() && minor.is_finite() && major > 0.0 && minor > 0.0) {
            return Err(StateError::InvalidParameter(
                "conic coefficients describe a degenerate ellipse".into(),
            ));
        }

        let center_x = (2.0 * c * d - b * e) / discriminant;
        let center_y = (2.0 * a * e - b * d) / discriminant;
        let rotation_angle = if b != 0.0 {
            (c - a - spread).atan2(b)
        } else if a > c {
            FRAC_PI_2
        } else {
            0.0
        };

        let mut ellipsoid = Self::new(name, reference_frame);
        ellipsoid.set_center_position(Vector3::new(center_x, center_y, 0.0));
        ellipsoid.set_axis_lengths(major, minor);
        ellipsoid.set_rotation_angle(rotation_angle);
        Ok(ellipsoid)
    }

    /// Axis lengths along x and y.
    #[must_use]
    pub fn axis_lengths(&self) -> [f64; 2] {
        self.axis_lengths
    }

    /// Set the axis lengths.
    pub fn set_axis_lengths(&mut self, x: f64, y: f64) {
        self.axis_lengths = [x, y];
        self.shape.state.set_filled();
    }

    /// Rotation about the z axis of the center frame, in radians.
    #[must_use]
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Set the rotation angle.
    pub fn set_rotation_angle(&mut self, rotation_angle: f64) {
        self.rotation_angle = rotation_angle;
        self.shape.state.set_filled();
    }

    /// Set the center pose.
    pub fn set_center_pose(&mut self, pose: CartesianPose) -> Result<()> {
        self.shape.set_center_pose(pose)
    }

    /// Set the center position.
    pub fn set_center_position(&mut self, position: Vector3<f64>) {
        self.shape.set_center_position(position);
    }

    /// Set the center orientation.
    pub fn set_center_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.shape.set_center_orientation(orientation);
    }

    /// The in-plane rotation as a pose named `<center>_rotated`, expressed in
    /// the center frame.
    pub fn rotation(&self) -> Result<CartesianPose> {
        self.shape.state.assert_filled()?;
        let center_name = self.center.name();
        Ok(CartesianPose::from_parts(
            format!("{center_name}_rotated"),
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.rotation_angle),
            center_name,
        ))
    }

    /// `nb_samples` poses evenly spaced in angle along the contour, expressed
    /// in the reference frame of the center.
    pub fn sample_from_parameterization(&self, nb_samples: usize) -> Result<Vec<CartesianPose>> {
        let rotation = self.rotation()?;
        let frame = self.center.compose(&rotation)?;
        let [a, b] = self.axis_lengths;
        (0..nb_samples)
            .map(|i| {
                let theta = TAU * i as f64 / nb_samples as f64;
                let point = CartesianPose::from_position(
                    format!("{}_point{i}", self.name()),
                    Vector3::new(a * theta.cos(), b * theta.sin(), 0.0),
                    rotation.name(),
                );
                frame.compose(&point)
            })
            .collect()
    }

    /// The six parameters of the ellipse.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        self.shape.state.assert_filled()?;
        let center = self.center_position();
        Ok(vec![
            center.x,
            center.y,
            center.z,
            self.rotation_angle,
            self.axis_lengths[0],
            self.axis_lengths[1],
        ])
    }

    /// Set the six parameters of the ellipse.
    pub fn set_data(&mut self, data: &[f64]) -> Result<()> {
        let &[x, y, z, rotation_angle, axis_x, axis_y] = data else {
            return Err(StateError::size_mismatch("ellipsoid data", 6, data.len()));
        };
        self.set_center_position(Vector3::new(x, y, z));
        self.set_rotation_angle(rotation_angle);
        self.set_axis_lengths(axis_x, axis_y);
        Ok(())
    }
}

impl StateLike for Ellipsoid {
    fn state(&self) -> &State {
        &self.shape.state
    }
}
