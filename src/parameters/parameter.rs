//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the fundamental building block
//! of the parameter system. Parameters can be varied during optimization, can
//! be held fixed, and can have bounds constraints.

use crate::parameters::bounds::{Bounds, BoundsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },
}

/// A parameter for curve-fitting problems
///
/// Parameters have an initial value, can be varied during optimization or
/// held fixed, and can carry bounds constraints. After a fit, the standard
/// error estimated by the solver integration is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    /// Current value of the parameter
    value: f64,

    /// Initial value when created (for reset operations)
    init_value: f64,

    /// Whether this parameter can be varied during optimization
    pub vary: bool,

    /// Minimum and maximum bounds for the parameter value
    bounds: Bounds,

    /// Standard error of the parameter (set after fitting)
    pub stderr: Option<f64>,
}

impl Parameter {
    /// Create a new parameter with the given name and value
    ///
    /// The parameter will be varied during optimization and has no bounds
    /// constraints.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabfit::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::new("amplitude", 10.0);
    /// assert_eq!(param.name(), "amplitude");
    /// assert_eq!(param.value(), 10.0);
    /// assert!(param.vary());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Create a new parameter with the given name, value, and bounds
    ///
    /// The value is clamped into the bounded interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabfit::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::with_bounds("amplitude", 10.0, 0.0, 20.0).unwrap();
    /// assert_eq!(param.min(), 0.0);
    /// assert_eq!(param.max(), 20.0);
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        let value = bounds.clamp(value);

        Ok(Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds,
            stderr: None,
        })
    }

    /// Create a new fixed parameter with the given name and value
    ///
    /// Fixed parameters keep their value during optimization.
    pub fn fixed(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: false,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Get the current value of the parameter
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// # Returns
    ///
    /// `Ok(())` if the value was set successfully, or an error if the value
    /// is outside bounds
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !self.bounds.is_within_bounds(value) {
            return Err(ParameterError::BoundsError(
                BoundsError::ValueOutsideBounds {
                    value,
                    min: self.bounds.min,
                    max: self.bounds.max,
                },
            ));
        }

        self.value = value;
        Ok(())
    }

    /// Set the value of the parameter, clamping it into bounds
    pub fn set_value_clamped(&mut self, value: f64) {
        self.value = self.bounds.clamp(value);
    }

    /// Get the initial value of the parameter
    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value and clear its standard error
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
        self.stderr = None;
    }

    /// Get the name of the parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name of the parameter
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Check if the parameter is varied during optimization
    pub fn vary(&self) -> bool {
        self.vary
    }

    /// Set whether the parameter is varied during optimization
    pub fn set_vary(&mut self, vary: bool) {
        self.vary = vary;
    }

    /// Get the minimum allowed value for the parameter
    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    /// Get the maximum allowed value for the parameter
    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Get the bounds of the parameter
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Set the bounds for the parameter
    ///
    /// The current value is clamped into the new interval.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);

        Ok(())
    }
}
