//! Named, typed parameters and a name-keyed parameter map.
//!
//! A parameter holds one value out of a closed set of payload kinds. The kind
//! is fixed when the parameter is declared; writing a value of another kind
//! is rejected.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};

use crate::cartesian::{CartesianPose, CartesianState};
use crate::joint::{JointPositions, JointState};
use crate::state::{State, StateLike, StateType};
use crate::{Result, StateError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParameterType {
    /// Integer.
    Int,
    /// List of integers.
    IntArray,
    /// Floating point number.
    Double,
    /// List of floating point numbers.
    DoubleArray,
    /// Boolean.
    Bool,
    /// List of booleans.
    BoolArray,
    /// String.
    String,
    /// List of strings.
    StringArray,
    /// Full Cartesian state.
    CartesianState,
    /// Cartesian pose.
    CartesianPose,
    /// Full joint state.
    JointState,
    /// Joint positions.
    JointPositions,
    /// Dense matrix.
    Matrix,
    /// Dense vector.
    Vector,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Tagged payload of a parameter.
#[derive(Debug, Clone)]
pub enum ParameterValue {
    /// Integer.
    Int(i32),
    /// List of integers.
    IntArray(Vec<i32>),
    /// Floating point number.
    Double(f64),
    /// List of floating point numbers.
    DoubleArray(Vec<f64>),
    /// Boolean.
    Bool(bool),
    /// List of booleans.
    BoolArray(Vec<bool>),
    /// String.
    String(String),
    /// List of strings.
    StringArray(Vec<String>),
    /// Full Cartesian state.
    CartesianState(CartesianState),
    /// Cartesian pose.
    CartesianPose(CartesianPose),
    /// Full joint state.
    JointState(JointState),
    /// Joint positions.
    JointPositions(JointPositions),
    /// Dense matrix.
    Matrix(DMatrix<f64>),
    /// Dense vector.
    Vector(DVector<f64>),
}

impl ParameterValue {
    /// Kind of this value.
    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Int(_) => ParameterType::Int,
            Self::IntArray(_) => ParameterType::IntArray,
            Self::Double(_) => ParameterType::Double,
            Self::DoubleArray(_) => ParameterType::DoubleArray,
            Self::Bool(_) => ParameterType::Bool,
            Self::BoolArray(_) => ParameterType::BoolArray,
            Self::String(_) => ParameterType::String,
            Self::StringArray(_) => ParameterType::StringArray,
            Self::CartesianState(_) => ParameterType::CartesianState,
            Self::CartesianPose(_) => ParameterType::CartesianPose,
            Self::JointState(_) => ParameterType::JointState,
            Self::JointPositions(_) => ParameterType::JointPositions,
            Self::Matrix(_) => ParameterType::Matrix,
            Self::Vector(_) => ParameterType::Vector,
        }
    }
}

/// Rust types that can be stored in a [`Parameter`].
pub trait ParameterPayload: Sized {
    /// Kind this type maps to.
    const PARAMETER_TYPE: ParameterType;

    /// Wrap into a tagged value.
    fn into_value(self) -> ParameterValue;

    /// Copy out of a tagged value of the matching kind.
    fn from_value(value: &ParameterValue) -> Option<Self>;
}

macro_rules! parameter_payload {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ParameterPayload for $ty {
                const PARAMETER_TYPE: ParameterType = ParameterType::$variant;

                fn into_value(self) -> ParameterValue {
                    ParameterValue::$variant(self)
                }

                fn from_value(value: &ParameterValue) -> Option<Self> {
                    match value {
                        ParameterValue::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    ParameterValue::$variant(value)
                }
            }
        )*
    };
}

parameter_payload!(
    i32 => Int,
    Vec<i32> => IntArray,
    f64 => Double,
    Vec<f64> => DoubleArray,
    bool => Bool,
    Vec<bool> => BoolArray,
    String => String,
    Vec<String> => StringArray,
    CartesianState => CartesianState,
    CartesianPose => CartesianPose,
    JointState => JointState,
    JointPositions => JointPositions,
    DMatrix<f64> => Matrix,
    DVector<f64> => Vector,
);

/// A named value of a declared kind.
///
/// # Example
///
/// ```
/// use state_types::{Parameter, ParameterType};
///
/// let mut gain = Parameter::new("gain", ParameterType::Double);
/// assert!(gain.is_empty());
///
/// gain.set(0.5).unwrap();
/// assert_eq!(gain.get::<f64>().unwrap(), 0.5);
/// assert!(gain.get::<i32>().is_err());
/// assert!(gain.set(true).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Parameter {
    state: State,
    parameter_type: ParameterType,
    value: Option<ParameterValue>,
}

impl Parameter {
    /// Declare an empty parameter of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        Self {
            state: State::new(StateType::Parameter, name),
            parameter_type,
            value: None,
        }
    }

    /// Create a filled parameter; the kind follows the value.
    #[must_use]
    pub fn from_value(name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        let value = value.into();
        let mut state = State::new(StateType::Parameter, name);
        state.set_filled();
        Self {
            state,
            parameter_type: value.parameter_type(),
            value: Some(value),
        }
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

    /// Declared kind.
    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }

    /// Check if no value has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// The stored value. Fails with [`StateError::EmptyState`] if unset.
    pub fn value(&self) -> Result<&ParameterValue> {
        self.value
            .as_ref()
            .ok_or_else(|| StateError::empty(self.name()))
    }

    /// The stored value as `T`.
    pub fn get<T: ParameterPayload>(&self) -> Result<T> {
        let value = self.value()?;
        T::from_value(value).ok_or_else(|| {
            StateError::InvalidParameter(format!(
                "parameter {} holds a {}, not a {}",
                self.name(),
                self.parameter_type,
                T::PARAMETER_TYPE
            ))
        })
    }

    /// Replace the value. The kind must match the declared kind.
    pub fn set_value(&mut self, value: impl Into<ParameterValue>) -> Result<()> {
        let value = value.into();
        if value.parameter_type() != self.parameter_type {
            return Err(StateError::InvalidParameter(format!(
                "parameter {} of type {} cannot hold a {}",
                self.name(),
                self.parameter_type,
                value.parameter_type()
            )));
        }
        self.value = Some(value);
        self.state.set_filled();
        Ok(())
    }

    /// Typed form of [`Parameter::set_value`].
    pub fn set<T: ParameterPayload>(&mut self, value: T) -> Result<()> {
        self.set_value(value.into_value())
    }

    /// Drop the value, keeping the declared kind.
    pub fn initialize(&mut self) {
        self.value = None;
        self.state.initialize();
    }
}

impl StateLike for Parameter {
    fn state(&self) -> &State {
        &self.state
    }
}

/// Parameters keyed by name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct ParameterMap {
    parameters: BTreeMap<String, Parameter>,
}

impl ParameterMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a list of parameters.
    pub fn from_parameters(parameters: impl IntoIterator<Item = Parameter>) -> Result<Self> {
        let mut map = Self::new();
        map.set_parameters(parameters)?;
        Ok(map)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the map holds no parameter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check if a parameter called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// The parameter called `name`.
    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| unknown_parameter(name))
    }

    /// All parameters keyed by name.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    /// All parameters in name order.
    #[must_use]
    pub fn parameter_list(&self) -> Vec<Parameter> {
        self.parameters.values().cloned().collect()
    }

    /// Insert or replace a parameter.
    ///
    /// Replacing an existing parameter with one of another kind fails with
    /// [`StateError::InvalidParameter`].
    pub fn set_parameter(&mut self, parameter: Parameter) -> Result<()> {
        if let Some(existing) = self.parameters.get(parameter.name()) {
            if existing.parameter_type() != parameter.parameter_type() {
                return Err(StateError::InvalidParameter(format!(
                    "parameter {} of type {} cannot be replaced by a {}",
                    parameter.name(),
                    existing.parameter_type(),
                    parameter.parameter_type()
                )));
            }
            tracing::debug!(name = parameter.name(), "replacing parameter");
        }
        self.parameters
            .insert(parameter.name().to_owned(), parameter);
        Ok(())
    }

    /// Insert or replace several parameters, stopping at the first failure.
    pub fn set_parameters(&mut self, parameters: impl IntoIterator<Item = Parameter>) -> Result<()> {
        parameters
            .into_iter()
            .try_for_each(|parameter| self.set_parameter(parameter))
    }

    /// Insert or replace every parameter of another map.
    pub fn set_parameter_map(&mut self, other: &ParameterMap) -> Result<()> {
        self.set_parameters(other.parameters.values().cloned())
    }

    /// The value of the parameter called `name` as `T`.
    pub fn parameter_value<T: ParameterPayload>(&self, name: &str) -> Result<T> {
        self.parameter(name)?.get()
    }

    /// Set the value of a parameter, declaring it if absent.
    pub fn set_parameter_value<T: ParameterPayload>(&mut self, name: &str, value: T) -> Result<()> {
        match self.parameters.get_mut(name) {
            Some(parameter) => parameter.set(value),
            None => self.set_parameter(Parameter::from_value(name, value.into_value())),
        }
    }

    /// Remove and return the parameter called `name`.
    pub fn remove_parameter(&mut self, name: &str) -> Result<Parameter> {
        self.parameters
            .remove(name)
            .ok_or_else(|| unknown_parameter(name))
    }
}

fn unknown_parameter(name: &str) -> StateError {
    StateError::InvalidParameter(format!("no parameter called {name}"))
}
