//! Parameters collection implementation
//!
//! This module provides the Parameters struct, an insertion-ordered
//! collection of Parameter objects. The insertion order is significant: it
//! defines the column order of the aggregate values and standard-error
//! tables produced by a fit.

use crate::error::Result;
use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// An ordered collection of parameters for curve-fitting problems
///
/// Similar in spirit to the Parameters class in lmfit-py: a named collection
/// with per-parameter bounds and vary flags, preserving insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    /// Map of parameter names to Parameter objects
    params: HashMap<String, Parameter>,

    /// Parameter names in insertion order
    order: Vec<String>,
}

impl Parameters {
    /// Create a new empty parameters collection
    ///
    /// # Examples
    ///
    /// ```
    /// use tabfit::parameters::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the collection
    ///
    /// If a parameter with the same name already exists it is replaced in
    /// place, keeping its original position in the insertion order.
    pub fn add(&mut self, param: Parameter) {
        let name = param.name().to_string();

        if self.params.insert(name.clone(), param).is_none() {
            self.order.push(name);
        }
    }

    /// Add a new varying parameter with the given name and value
    ///
    /// # Examples
    ///
    /// ```
    /// use tabfit::parameters::parameters::Parameters;
    ///
    /// let mut params = Parameters::new();
    /// params.add_param("amplitude", 10.0);
    /// assert_eq!(params.len(), 1);
    /// ```
    pub fn add_param(&mut self, name: &str, value: f64) {
        self.add(Parameter::new(name, value));
    }

    /// Add a new parameter with the given name, value, and bounds
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> std::result::Result<(), ParameterError> {
        let param = Parameter::with_bounds(name, value, min, max)?;
        self.add(param);
        Ok(())
    }

    /// Add a new fixed parameter with the given name and value
    pub fn add_fixed_param(&mut self, name: &str, value: f64) {
        self.add(Parameter::fixed(name, value));
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Get a mutable reference to a parameter by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.get_mut(name)
    }

    /// Get the current value of a named parameter
    ///
    /// # Returns
    ///
    /// The value, or an error if no parameter with that name exists
    pub fn value_of(&self, name: &str) -> std::result::Result<f64, ParameterError> {
        self.params
            .get(name)
            .map(|p| p.value())
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a parameter with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Remove a parameter by name
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let removed = self.params.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Get the number of parameters in the collection
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get the parameter names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Iterate over parameter names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Iterate over (name, parameter) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Parameter)> {
        self.order.iter().map(move |name| (name, &self.params[name]))
    }

    /// Get all parameter values in insertion order
    pub fn values(&self) -> Vec<f64> {
        self.order.iter().map(|name| self.params[name].value()).collect()
    }

    /// Get the varying parameters in insertion order
    pub fn varying(&self) -> Vec<&Parameter> {
        self.order
            .iter()
            .map(|name| &self.params[name])
            .filter(|p| p.vary())
            .collect()
    }

    /// Get (name, value) pairs for the varying parameters in insertion order
    pub fn varying_values(&self) -> Vec<(String, f64)> {
        self.varying()
            .into_iter()
            .map(|p| (p.name().to_string(), p.value()))
            .collect()
    }

    /// Get the fixed parameters in insertion order
    pub fn fixed(&self) -> Vec<&Parameter> {
        self.order
            .iter()
            .map(|name| &self.params[name])
            .filter(|p| !p.vary())
            .collect()
    }

    /// Update the varying parameters from a flat slice of values
    ///
    /// Values are assigned to the varying parameters in insertion order and
    /// clamped into each parameter's bounds. The slice length must equal the
    /// number of varying parameters.
    pub fn update_varying(&mut self, values: &[f64]) -> std::result::Result<(), ParameterError> {
        let varying_names: Vec<String> = self
            .varying()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();

        assert_eq!(
            varying_names.len(),
            values.len(),
            "value count must match the number of varying parameters"
        );

        for (name, &value) in varying_names.iter().zip(values.iter()) {
            self.params
                .get_mut(name)
                .ok_or_else(|| ParameterError::ParameterNotFound { name: name.clone() })?
                .set_value_clamped(value);
        }

        Ok(())
    }

    /// Reset all parameters to their initial values and clear standard errors
    pub fn reset(&mut self) {
        for param in self.params.values_mut() {
            param.reset();
        }
    }

    /// Serialize the collection to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a collection from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the collection to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load a collection from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut json = String::new();
        file.read_to_string(&mut json)?;
        Self::from_json(&json)
    }
}
