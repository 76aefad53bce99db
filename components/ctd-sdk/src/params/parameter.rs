//! A single named, typed parameter.

use super::kind::ValueKind;
use crate::error::ParameterError;

/// Token that follows every element of a serialised list parameter.
///
/// Because the token terminates rather than separates elements, empty
/// elements (including a trailing empty slot) survive a round trip.
pub const LIST_SEPARATOR: &str = "@@@__@@@";

/// Current or default value of a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParameterValue {
    /// No value; serialised as the empty string.
    #[default]
    Unset,
    /// A single validated value in canonical form.
    Scalar(String),
    /// An ordered list of validated values in canonical form.
    List(Vec<String>),
}

/// A named, typed leaf of the parameter tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    key: String,
    description: String,
    kind: ValueKind,
    is_list: bool,
    value: ParameterValue,
    default: ParameterValue,
    advanced: bool,
    required: bool,
    declared_size: Option<usize>,
}

impl Parameter {
    /// Creates an unset scalar parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            description: String::new(),
            kind,
            is_list: false,
            value: ParameterValue::Unset,
            default: ParameterValue::Unset,
            advanced: false,
            required: false,
            declared_size: None,
        }
    }

    /// Creates an empty list parameter whose elements are of `kind`.
    #[must_use]
    pub fn list(key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            is_list: true,
            value: ParameterValue::List(Vec::new()),
            default: ParameterValue::List(Vec::new()),
            ..Self::new(key, kind)
        }
    }

    /// Sets the human readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the parameter as advanced.
    #[must_use]
    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced = advanced;
        self
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the declared number of list slots.
    #[must_use]
    pub fn with_declared_size(mut self, size: Option<usize>) -> Self {
        self.declared_size = size;
        self
    }

    /// Sets the current value from `raw` and records it as the default.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Validation`] if `raw` is not acceptable.
    pub fn with_default(mut self, raw: &str) -> Result<Self, ParameterError> {
        self.set_value_from_string(raw)?;
        self.default = self.value.clone();
        Ok(self)
    }

    /// Dot-separated hierarchical key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last segment of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.key.rsplit('.').next().unwrap_or(&self.key)
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Type tag and restrictions.
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Whether this is a list parameter.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.is_list
    }

    /// Whether the parameter is hidden behind an "advanced" toggle.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    /// Whether the parameter may be left empty.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        !self.required
    }

    /// Declared number of list slots, if any.
    #[must_use]
    pub fn declared_size(&self) -> Option<usize> {
        self.declared_size
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    /// Default value.
    #[must_use]
    pub fn default_value(&self) -> &ParameterValue {
        &self.default
    }

    /// Mnemonic type tag, with a `-list` suffix for list parameters.
    #[must_use]
    pub fn mnemonic(&self) -> String {
        if self.is_list {
            format!("{}-list", self.kind.mnemonic())
        } else {
            self.kind.mnemonic().to_string()
        }
    }

    /// Whether the parameter carries no value.
    ///
    /// Lists count as empty when every element is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.value {
            ParameterValue::Unset => true,
            ParameterValue::Scalar(s) => s.is_empty(),
            ParameterValue::List(items) => items.iter().all(String::is_empty),
        }
    }

    /// Values in order: one for a set scalar, every element for a list.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match &self.value {
            ParameterValue::Unset => Vec::new(),
            ParameterValue::Scalar(s) => vec![s.as_str()],
            ParameterValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Parses `raw` according to the parameter's type and stores it.
    ///
    /// For lists, `raw` is the serialised form produced by
    /// [`Parameter::string_representation`]. An empty scalar unsets the
    /// parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Validation`] if any value violates the
    /// parameter's type, bounds or allowed set. The current value is left
    /// untouched on error.
    pub fn set_value_from_string(&mut self, raw: &str) -> Result<(), ParameterError> {
        let value = if self.is_list {
            let elements = split_list(raw)
                .into_iter()
                .map(|element| self.canonical_element(element))
                .collect::<Result<Vec<_>, _>>()?;
            ParameterValue::List(elements)
        } else if raw.is_empty() {
            ParameterValue::Unset
        } else {
            ParameterValue::Scalar(self.canonical(raw)?)
        };

        self.value = value;
        Ok(())
    }

    /// Appends one element to a list parameter.
    ///
    /// Calling this N times on an empty list yields exactly N elements in
    /// call order. Empty elements are kept as empty slots.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NotAList`] for scalar parameters and
    /// [`ParameterError::Validation`] if the element is not acceptable.
    pub fn set_multi_value(&mut self, raw: &str) -> Result<(), ParameterError> {
        if !self.is_list {
            return Err(ParameterError::NotAList {
                key: self.key.clone(),
            });
        }
        let element = self.canonical_element(raw)?;
        match &mut self.value {
            ParameterValue::List(items) => items.push(element),
            other => *other = ParameterValue::List(vec![element]),
        }
        Ok(())
    }

    /// Extends a list with empty slots up to `size` elements.
    pub fn pad_list(&mut self, size: usize) {
        if let ParameterValue::List(items) = &mut self.value
            && items.len() < size
        {
            items.resize(size, String::new());
        }
    }

    /// Serialised form of the current value.
    ///
    /// Scalars serialise to their canonical text, unset values to the empty
    /// string and lists to every element followed by [`LIST_SEPARATOR`].
    #[must_use]
    pub fn string_representation(&self) -> String {
        represent(&self.value)
    }

    /// Serialised form of the default value.
    #[must_use]
    pub fn default_representation(&self) -> String {
        represent(&self.default)
    }

    /// Records the current value as the default.
    pub fn store_as_default(&mut self) {
        self.default = self.value.clone();
    }

    /// Restores the default value.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// Clears the value; lists become empty.
    pub fn unset(&mut self) {
        self.value = if self.is_list {
            ParameterValue::List(Vec::new())
        } else {
            ParameterValue::Unset
        };
    }

    fn canonical(&self, raw: &str) -> Result<String, ParameterError> {
        self.kind
            .canonicalize(raw)
            .map_err(|reason| ParameterError::validation(&self.key, raw, reason))
    }

    fn canonical_element(&self, raw: &str) -> Result<String, ParameterError> {
        if raw.is_empty() {
            return Ok(String::new());
        }
        // The element must end exactly where its own separator starts.
        if format!("{raw}{LIST_SEPARATOR}").find(LIST_SEPARATOR) != Some(raw.len()) {
            return Err(ParameterError::validation(
                &self.key,
                raw,
                "list elements may not contain the list separator",
            ));
        }
        self.canonical(raw)
    }
}

fn represent(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Unset => String::new(),
        ParameterValue::Scalar(s) => s.clone(),
        ParameterValue::List(items) => items
            .iter()
            .map(|item| format!("{item}{LIST_SEPARATOR}"))
            .collect(),
    }
}

/// Splits a serialised list, dropping only the remainder after the final
/// separator when it is empty.
fn split_list(raw: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = raw.split(LIST_SEPARATOR).collect();
    if parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::kind::{Bounds, FileDirection};

    fn threshold() -> Parameter {
        Parameter::new(
            "tool.1.algorithm.threshold",
            ValueKind::Int {
                bounds: Bounds::parse("0:10").unwrap(),
            },
        )
    }

    #[test]
    fn test_name_is_last_segment() {
        assert_eq!(threshold().name(), "threshold");
    }

    #[test]
    fn test_set_value_rejects_without_mutation() {
        let mut p = threshold().with_default("5").unwrap();
        let err = p.set_value_from_string("11").unwrap_err();
        assert!(matches!(err, ParameterError::Validation { .. }));
        assert_eq!(p.string_representation(), "5");
    }

    #[test]
    fn test_empty_scalar_unsets() {
        let mut p = threshold().with_default("5").unwrap();
        p.set_value_from_string("").unwrap();
        assert_eq!(p.value(), &ParameterValue::Unset);
        assert!(p.is_empty());
        p.reset();
        assert_eq!(p.string_representation(), "5");
    }

    #[test]
    fn test_string_list_serialisation() {
        let mut p = Parameter::list("tool.names", ValueKind::String);
        for v in ["A", "B", "C"] {
            p.set_multi_value(v).unwrap();
        }
        let sep = LIST_SEPARATOR;
        let text = p.string_representation();
        assert_eq!(text, format!("A{sep}B{sep}C{sep}"));

        let mut copy = Parameter::list("tool.names", ValueKind::String);
        copy.set_value_from_string(&text).unwrap();
        assert_eq!(copy.values(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_multi_value_appends_in_order() {
        let mut p = Parameter::list(
            "tool.sizes",
            ValueKind::Int {
                bounds: Bounds::unbounded(),
            },
        );
        for i in 0..5 {
            p.set_multi_value(&i.to_string()).unwrap();
        }
        assert_eq!(p.values(), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_trailing_empty_slot_survives() {
        let mut p = Parameter::list("tool.slots", ValueKind::String).with_declared_size(Some(3));
        p.set_multi_value("x").unwrap();
        p.set_multi_value("y").unwrap();
        p.pad_list(3);
        assert_eq!(p.values(), vec!["x", "y", ""]);

        let mut copy = Parameter::list("tool.slots", ValueKind::String);
        copy.set_value_from_string(&p.string_representation()).unwrap();
        assert_eq!(copy.values(), vec!["x", "y", ""]);
    }

    #[test]
    fn test_multi_value_on_scalar_fails() {
        let mut p = threshold();
        assert!(matches!(
            p.set_multi_value("1"),
            Err(ParameterError::NotAList { .. })
        ));
    }

    #[test]
    fn test_list_elements_validated() {
        let mut p = Parameter::list(
            "tool.weights",
            ValueKind::Double {
                bounds: Bounds::parse("0:1").unwrap(),
            },
        );
        p.set_multi_value("0.5").unwrap();
        assert!(p.set_multi_value("1.5").is_err());
        assert_eq!(p.values(), vec!["0.5"]);

        let sep = LIST_SEPARATOR;
        assert!(p.set_value_from_string(&format!("0.1{sep}2{sep}")).is_err());
        assert_eq!(p.values(), vec!["0.5"]);
    }

    #[test]
    fn test_element_with_separator_rejected() {
        let sep = LIST_SEPARATOR;
        let mut p = Parameter::list("tool.names", ValueKind::String);
        p.set_multi_value("a").unwrap();

        let err = p.set_multi_value(&format!("b{sep}c")).unwrap_err();
        assert!(matches!(err, ParameterError::Validation { .. }));
        assert!(p.set_multi_value("d@@@__@@").is_err());
        assert_eq!(p.values(), vec!["a"]);

        let mut scalar = Parameter::new("tool.note", ValueKind::String);
        scalar.set_value_from_string(&format!("x{sep}y")).unwrap();
        assert_eq!(scalar.string_representation(), format!("x{sep}y"));
    }

    #[test]
    fn test_file_parameter_mnemonic() {
        let p = Parameter::list(
            "tool.in",
            ValueKind::File {
                direction: FileDirection::Input,
                formats: vec!["fasta".to_string()],
            },
        );
        assert_eq!(p.mnemonic(), "input-file-list");
    }
}
