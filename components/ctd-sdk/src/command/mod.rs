//! Command-line generation from a populated [`NodeConfiguration`].
//!
//! Both encodings, the flat switch/value token stream and the
//! configuration file, are rendered from the same [`resolve_arguments`]
//! pass, so they always expose the same parameters and values.

pub mod config_file;

use crate::error::CommandError;
use crate::model::{CliElement, NodeConfiguration};
use crate::params::{Parameter, ValueKind};
use tracing::debug;

pub use config_file::{ConfigFileCommandGenerator, ConfigFileFormat};

/// Turns a configuration into an argument vector.
pub trait CommandGenerator {
    /// Produces the ordered argument tokens, excluding the executable.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MissingRequiredArgument`] if a required
    /// element has no value, or another [`CommandError`] if the command
    /// cannot be produced.
    fn generate_command(&self, config: &NodeConfiguration) -> Result<Vec<String>, CommandError>;
}

/// Values contributed by one mapped parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue<'c> {
    /// The mapped parameter.
    pub parameter: &'c Parameter,
    /// Its non-empty values in order.
    pub values: Vec<&'c str>,
}

/// A command-line element together with the values it will emit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArgument<'c> {
    /// The element.
    pub element: &'c CliElement,
    /// One entry per mapping, in mapping order.
    pub values: Vec<ResolvedValue<'c>>,
}

impl ResolvedArgument<'_> {
    /// Whether every mapped parameter is a scalar bool, making the element
    /// a flag that is emitted alone when true.
    fn is_flag(&self) -> bool {
        !self.element.option_identifier.is_empty()
            && !self.values.is_empty()
            && self
                .values
                .iter()
                .all(|v| !v.parameter.is_list() && matches!(v.parameter.kind(), ValueKind::Bool))
    }

    fn all_values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().flat_map(|v| v.values.iter().copied())
    }
}

/// Resolves every element's mappings against the current values.
///
/// Elements whose mapped parameters are all empty are dropped, unless they
/// are required. Flags set to `false` are dropped too, so neither encoding
/// exposes them. Elements without mappings are kept as literal text.
///
/// # Errors
///
/// Returns [`CommandError::UnknownParameter`] for a dangling mapping and
/// [`CommandError::MissingRequiredArgument`] for a required element with no
/// values.
pub fn resolve_arguments(
    config: &NodeConfiguration,
) -> Result<Vec<ResolvedArgument<'_>>, CommandError> {
    let mut resolved = Vec::with_capacity(config.cli.len());

    for element in &config.cli {
        let mut values = Vec::with_capacity(element.mappings.len());
        for mapping in &element.mappings {
            let parameter = config
                .parameters
                .get(&mapping.reference_name)
                .ok_or_else(|| CommandError::UnknownParameter {
                    option: element.option_identifier.clone(),
                    key: mapping.reference_name.clone(),
                })?;
            values.push(ResolvedValue {
                parameter,
                values: parameter
                    .values()
                    .into_iter()
                    .filter(|v| !v.is_empty())
                    .collect(),
            });
        }

        let is_empty = values.iter().all(|v| v.values.is_empty());
        if !element.mappings.is_empty() && is_empty {
            if element.is_required {
                return Err(CommandError::MissingRequiredArgument {
                    option: element.option_identifier.clone(),
                    keys: element
                        .mappings
                        .iter()
                        .map(|m| m.reference_name.clone())
                        .collect(),
                });
            }
            debug!(option = %element.option_identifier, "Skipping element without values");
            continue;
        }

        let mut argument = ResolvedArgument { element, values };
        if argument.is_flag() {
            for value in &mut argument.values {
                value.values.retain(|v| *v == "true");
            }
            if argument.all_values().next().is_none() {
                debug!(option = %element.option_identifier, "Skipping flag that is off");
                continue;
            }
        }
        resolved.push(argument);
    }

    Ok(resolved)
}

/// Renders the flat switch/value token stream.
///
/// # Example
///
/// ```
/// use ctd_sdk::command::{CommandGenerator, SwitchCommandGenerator};
/// use ctd_sdk::model::{CliElement, NodeConfiguration};
/// use ctd_sdk::params::{Parameter, ValueKind};
///
/// let mut config = NodeConfiguration::new("Blast").unwrap();
/// config.add_parameter(Parameter::new("tool.i", ValueKind::String)).unwrap();
/// config.add_parameter(Parameter::new("tool.d", ValueKind::String)).unwrap();
/// config.cli.push(CliElement::new("-i", ["tool.i"]));
/// config.cli.push(CliElement::new("-d", ["tool.d"]));
/// config.set_value_from_string("tool.i", "in1.FASTA").unwrap();
/// config.set_value_from_string("tool.d", "in2.FASTA").unwrap();
///
/// let tokens = SwitchCommandGenerator.generate_command(&config).unwrap();
/// assert_eq!(tokens, ["-i", "in1.FASTA", "-d", "in2.FASTA"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchCommandGenerator;

impl CommandGenerator for SwitchCommandGenerator {
    fn generate_command(&self, config: &NodeConfiguration) -> Result<Vec<String>, CommandError> {
        let resolved = resolve_arguments(config)?;
        let tokens = render_tokens(&resolved);
        debug!(tool = %config.name, tokens = tokens.len(), "Generated command line");
        Ok(tokens)
    }
}

fn render_tokens(resolved: &[ResolvedArgument<'_>]) -> Vec<String> {
    let mut tokens = Vec::new();

    for argument in resolved {
        let switch = argument.element.option_identifier.as_str();

        if argument.values.is_empty() {
            if !switch.is_empty() {
                tokens.push(switch.to_string());
            }
        } else if argument.is_flag() {
            if argument.all_values().any(|v| v == "true") {
                tokens.push(switch.to_string());
            }
        } else if argument.element.is_list {
            for value in argument.all_values() {
                if !switch.is_empty() {
                    tokens.push(switch.to_string());
                }
                tokens.push(value.to_string());
            }
        } else {
            if !switch.is_empty() {
                tokens.push(switch.to_string());
            }
            tokens.extend(argument.all_values().map(str::to_string));
        }
    }

    tokens
}
