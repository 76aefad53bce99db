//! Descriptor model: the aggregate built from one CTD document.

use crate::error::{DescriptorError, ParameterError};
use crate::params::{FileDirection, Parameter, ParameterTree, ValueKind};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const TOOL_NAME_EXPECTED: &str = "a name matching ^[A-Za-z][A-Za-z0-9]*$";

static TOOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"^[A-Za-z][A-Za-z0-9]*$") {
        Ok(rx) => rx,
        Err(e) => panic!("tool name pattern should be valid: {e}"),
    });

/// Checks a tool name against the host's naming grammar: letters and
/// digits only, not starting with a digit.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidNodeName`] if the name does not match.
pub fn validate_tool_name(name: &str) -> Result<(), DescriptorError> {
    if TOOL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidNodeName {
            name: name.to_string(),
            expected: TOOL_NAME_EXPECTED,
        })
    }
}

/// A literature reference for the tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Citation {
    /// Digital object identifier.
    pub doi: String,
    /// Link to the publication.
    pub url: String,
}

/// One input or output slot of the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Port name; equal to the key of the backing parameter.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Accepted extensions without the `*.` prefix.
    pub formats: Vec<String>,
    /// Whether the port may stay unconnected.
    pub optional: bool,
    /// Whether the port takes several files.
    pub multiple: bool,
    /// Key of the file-valued parameter this port feeds.
    pub parameter_key: String,
}

impl Port {
    /// Derives a port from a file-valued parameter.
    ///
    /// Returns `None` for parameters that are not input or output files.
    #[must_use]
    pub fn from_parameter(parameter: &Parameter) -> Option<(FileDirection, Self)> {
        let ValueKind::File { direction, formats } = parameter.kind() else {
            return None;
        };
        if *direction == FileDirection::Unspecified {
            return None;
        }
        Some((
            *direction,
            Self {
                name: parameter.key().to_string(),
                description: parameter.description().to_string(),
                formats: formats.clone(),
                optional: parameter.is_optional(),
                multiple: parameter.is_list(),
                parameter_key: parameter.key().to_string(),
            },
        ))
    }

    /// Whether a file name carries one of the accepted extensions.
    ///
    /// A port without declared formats accepts everything.
    #[must_use]
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.formats.is_empty() {
            return true;
        }
        let lower = file_name.to_ascii_lowercase();
        self.formats
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.to_ascii_lowercase())))
    }
}

/// Association of a command-line element with one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Key of the referenced parameter.
    pub reference_name: String,
}

impl Mapping {
    /// Creates a mapping to `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            reference_name: key.into(),
        }
    }
}

/// One switch, positional or text-only element of the command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliElement {
    /// Literal switch text such as `-i`; empty for positional elements.
    pub option_identifier: String,
    /// Whether the switch repeats once per list element.
    pub is_list: bool,
    /// Whether at least one mapped parameter must carry a value.
    pub is_required: bool,
    /// Mapped parameters in emission order.
    pub mappings: Vec<Mapping>,
}

impl CliElement {
    /// Creates an element for `option` mapped to `keys`.
    #[must_use]
    pub fn new<I, K>(option: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            option_identifier: option.into(),
            mappings: keys.into_iter().map(Mapping::new).collect(),
            ..Self::default()
        }
    }

    /// Marks the element as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the element as repeating per list element.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }
}

/// Everything one descriptor says about a tool.
///
/// Built once by the descriptor reader, mutated in place as values are
/// set, and read by the command mapper and descriptor writer. Callers must
/// not mutate it while a process built from it is running.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfiguration {
    /// Tool name.
    pub name: String,
    /// Tool version.
    pub version: String,
    /// Category used to group tools in the host.
    pub category: String,
    /// One-line description.
    pub description: String,
    /// Manual text.
    pub manual: String,
    /// Documentation link.
    pub doc_url: String,
    /// Executable name as declared by the descriptor.
    pub executable_name: String,
    /// Executable path as declared by the descriptor; may use `$ROOT`.
    pub executable_path: String,
    /// Literature references.
    pub citations: Vec<Citation>,
    /// Input ports in descriptor order.
    pub inputs: Vec<Port>,
    /// Output ports in descriptor order.
    pub outputs: Vec<Port>,
    /// All parameters keyed by path.
    pub parameters: ParameterTree,
    /// Descriptions of the `NODE` sections, keyed by their path.
    pub node_descriptions: BTreeMap<String, String>,
    /// Command-line elements in emission order.
    pub cli: Vec<CliElement>,
}

impl NodeConfiguration {
    /// Creates an empty configuration for a tool.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidNodeName`] if `name` violates the
    /// naming grammar.
    pub fn new(name: impl Into<String>) -> Result<Self, DescriptorError> {
        let name = name.into();
        validate_tool_name(&name)?;
        Ok(Self {
            name,
            ..Self::default()
        })
    }

    /// Adds a parameter and derives its port, if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::DuplicateKey`] if the key is taken.
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), ParameterError> {
        let port = Port::from_parameter(&parameter);
        self.parameters.insert(parameter)?;
        match port {
            Some((FileDirection::Input, port)) => self.inputs.push(port),
            Some((FileDirection::Output, port)) => self.outputs.push(port),
            _ => {}
        }
        Ok(())
    }

    /// Parses and stores a parameter value.
    ///
    /// # Errors
    ///
    /// See [`ParameterTree::set_value_from_string`].
    pub fn set_value_from_string(&mut self, key: &str, raw: &str) -> Result<(), ParameterError> {
        self.parameters.set_value_from_string(key, raw)
    }

    /// Appends a list element.
    ///
    /// # Errors
    ///
    /// See [`ParameterTree::set_multi_value`].
    pub fn set_multi_value(&mut self, key: &str, raw: &str) -> Result<(), ParameterError> {
        self.parameters.set_multi_value(key, raw)
    }

    /// Serialised value of a parameter.
    ///
    /// # Errors
    ///
    /// See [`ParameterTree::string_representation`].
    pub fn string_representation(&self, key: &str) -> Result<String, ParameterError> {
        self.parameters.string_representation(key)
    }

    /// Looks up an input or output port by name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|p| p.name == name)
    }
}
