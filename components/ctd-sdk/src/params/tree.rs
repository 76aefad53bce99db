//! Ordered, key-indexed collection of parameters.

use super::parameter::Parameter;
use crate::error::ParameterError;
use std::collections::HashMap;

/// All parameters of a tool, in descriptor order, indexed by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTree {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl ParameterTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::DuplicateKey`] if the key is already taken.
    pub fn insert(&mut self, parameter: Parameter) -> Result<(), ParameterError> {
        if self.index.contains_key(parameter.key()) {
            return Err(ParameterError::DuplicateKey {
                key: parameter.key().to_string(),
            });
        }
        self.index
            .insert(parameter.key().to_string(), self.params.len());
        self.params.push(parameter);
        Ok(())
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.index.get(key).map(|&i| &self.params[i])
    }

    /// Looks up a parameter for mutation.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Parameter> {
        self.index.get(key).map(|&i| &mut self.params[i])
    }

    /// Looks up a parameter, failing on unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists.
    pub fn parameter(&self, key: &str) -> Result<&Parameter, ParameterError> {
        self.get(key).ok_or_else(|| unknown(key))
    }

    fn parameter_mut(&mut self, key: &str) -> Result<&mut Parameter, ParameterError> {
        self.get_mut(key).ok_or_else(|| unknown(key))
    }

    /// Whether a parameter with `key` exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Parses and stores a value; see [`Parameter::set_value_from_string`].
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] or
    /// [`ParameterError::Validation`].
    pub fn set_value_from_string(&mut self, key: &str, raw: &str) -> Result<(), ParameterError> {
        self.parameter_mut(key)?.set_value_from_string(raw)
    }

    /// Appends a list element; see [`Parameter::set_multi_value`].
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`],
    /// [`ParameterError::NotAList`] or [`ParameterError::Validation`].
    pub fn set_multi_value(&mut self, key: &str, raw: &str) -> Result<(), ParameterError> {
        self.parameter_mut(key)?.set_multi_value(raw)
    }

    /// Serialised value of a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists.
    pub fn string_representation(&self, key: &str) -> Result<String, ParameterError> {
        Ok(self.parameter(key)?.string_representation())
    }

    /// Whether a parameter is advanced.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists.
    pub fn is_advanced(&self, key: &str) -> Result<bool, ParameterError> {
        Ok(self.parameter(key)?.is_advanced())
    }

    /// Whether a parameter is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists.
    pub fn is_optional(&self, key: &str) -> Result<bool, ParameterError> {
        Ok(self.parameter(key)?.is_optional())
    }

    /// Restores one parameter to its default.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists.
    pub fn reset(&mut self, key: &str) -> Result<(), ParameterError> {
        self.parameter_mut(key)?.reset();
        Ok(())
    }

    /// Clears the value of an optional parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameter`] if no such key exists and
    /// [`ParameterError::Validation`] if the parameter is required.
    pub fn unset(&mut self, key: &str) -> Result<(), ParameterError> {
        let parameter = self.parameter_mut(key)?;
        if !parameter.is_optional() {
            return Err(ParameterError::validation(
                key,
                "",
                "required parameter cannot be unset",
            ));
        }
        parameter.unset();
        Ok(())
    }

    /// Restores every parameter to its default.
    pub fn reset_all(&mut self) {
        self.params.iter_mut().for_each(Parameter::reset);
    }

    /// Iterates parameters in descriptor order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Keys in descriptor order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(Parameter::key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the tree holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn unknown(key: &str) -> ParameterError {
    ParameterError::UnknownParameter {
        key: key.to_string(),
    }
}

impl<'a> IntoIterator for &'a ParameterTree {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
