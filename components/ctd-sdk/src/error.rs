//! Error types for the CTD SDK.
//!
//! This module provides a structured error hierarchy using `thiserror`.
//! Each stage of the descriptor → parameters → command → process chain has
//! its own error enum; [`CtdError`] wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by errors that wrap an arbitrary failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for CTD operations.
#[derive(Error, Debug)]
pub enum CtdError {
    /// A parameter could not be read or mutated.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A descriptor document could not be read or written.
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// The command line could not be generated.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// The tool could not be executed.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Incoming files could not be assigned to a port.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    Context {
        /// Context message describing what was happening.
        context: String,
        /// The underlying source error.
        #[source]
        source: BoxError,
    },
}

/// Errors raised by the parameter model.
///
/// A failed mutation never leaves a partially updated value behind.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// The value violates the parameter's type, bounds or allowed set.
    #[error("Invalid value '{value}' for parameter '{key}': {reason}")]
    Validation {
        /// Key of the parameter.
        key: String,
        /// The rejected raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No parameter with the given key exists.
    #[error("Unknown parameter '{key}'")]
    UnknownParameter {
        /// The key that was looked up.
        key: String,
    },

    /// A list operation was applied to a scalar parameter.
    #[error("Parameter '{key}' is not a list parameter")]
    NotAList {
        /// Key of the scalar parameter.
        key: String,
    },

    /// Two parameters share the same key.
    #[error("Duplicate parameter key '{key}'")]
    DuplicateKey {
        /// The colliding key.
        key: String,
    },

    /// A bounds or restriction string could not be parsed.
    #[error("Invalid restriction '{restriction}': {reason}")]
    InvalidRestriction {
        /// The raw restriction text.
        restriction: String,
        /// Why it could not be parsed.
        reason: String,
    },
}

impl ParameterError {
    pub(crate) fn validation(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to reading and writing descriptor documents.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The document is malformed or does not conform to the CTD layout.
    #[error("Invalid descriptor at '{path}': {source}")]
    Invalid {
        /// Element path of the offending element, e.g. `tool/PARAMETERS/NODE[1]`.
        path: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },

    /// A tool or node name violates the naming grammar.
    #[error("Invalid node name '{name}': expected {expected}")]
    InvalidNodeName {
        /// The rejected name.
        name: String,
        /// Description of the accepted grammar.
        expected: &'static str,
    },

    /// The same node identifier occurs twice.
    #[error("Duplicate node '{path}'")]
    DuplicateNode {
        /// Dot-joined path of the duplicated node.
        path: String,
    },

    /// IO error while reading or writing a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DescriptorError {
    pub(crate) fn invalid(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Invalid {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Errors related to command-line generation.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A required element has no value in any of its mapped parameters.
    #[error("Missing required argument '{option}' (parameters: {})", keys.join(", "))]
    MissingRequiredArgument {
        /// Option identifier of the element, empty for positional elements.
        option: String,
        /// Keys of the mapped parameters.
        keys: Vec<String>,
    },

    /// A mapping references a parameter that does not exist.
    #[error("Element '{option}' references unknown parameter '{key}'")]
    UnknownParameter {
        /// Option identifier of the element.
        option: String,
        /// The dangling key.
        key: String,
    },

    /// The configuration file could not be written.
    #[error("Failed to write configuration file {path}: {source}")]
    ConfigFile {
        /// Destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: BoxError,
    },
}

/// Errors related to running the external tool.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The process could not be started at all.
    ///
    /// A nonzero exit code is not reported through this variant.
    #[error("Tool '{tool}' execution failed: {source}")]
    ToolExecutionFailed {
        /// Executable that failed to start.
        tool: String,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("Illegal state: {reason}")]
    IllegalState {
        /// What was wrong.
        reason: String,
    },
}

/// Errors raised while assigning incoming files to ports.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Files in one batch resolve to different content types.
    #[error("Mixed content types: '{file}' is {found}, expected {expected}")]
    MixedContentTypes {
        /// Content type of the first file.
        expected: String,
        /// Content type of the offending file.
        found: String,
        /// The offending file.
        file: PathBuf,
    },

    /// No content type is registered for a file.
    #[error("Unknown content type for '{file}'")]
    UnknownContentType {
        /// The file that could not be resolved.
        file: PathBuf,
    },

    /// The batch does not match what the port accepts.
    #[error("Port '{port}' does not accept '{file}'")]
    UnsupportedFormat {
        /// Name of the port.
        port: String,
        /// The rejected file.
        file: PathBuf,
    },

    /// A single-file port received several files.
    #[error("Port '{port}' accepts a single file, got {count}")]
    TooManyFiles {
        /// Name of the port.
        port: String,
        /// Number of files offered.
        count: usize,
    },

    /// The port does not exist.
    #[error("Unknown port '{port}'")]
    UnknownPort {
        /// Name of the port.
        port: String,
    },

    /// The batch is empty.
    #[error("No files to import")]
    NoFiles,

    /// Setting the port's parameter failed.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Errors related to engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration for '{key}': {value}")]
    InvalidConfiguration {
        /// The configuration key.
        key: String,
        /// The invalid value.
        value: String,
    },
}

/// Convenience extension trait for adding context to errors.
///
/// The SDK itself returns the concern-specific errors. This trait is for
/// callers that chain several SDK steps and want one [`CtdError`] that
/// says which step failed.
///
/// # Example
///
/// ```
/// use ctd_sdk::{CommandGenerator, CtdError, DescriptorReader, ResultExt, SwitchCommandGenerator};
///
/// fn command_for(xml: &str) -> Result<Vec<String>, CtdError> {
///     let config = DescriptorReader::new(xml)
///         .read()
///         .with_context(|| "reading descriptor")?;
///     SwitchCommandGenerator
///         .generate_command(&config)
///         .with_context(|| format!("mapping {}", config.name))
/// }
///
/// let err = command_for("<tool/>").unwrap_err();
/// assert!(matches!(err, CtdError::Context { .. }));
/// assert!(err.to_string().starts_with("reading descriptor: "));
/// ```
pub trait ResultExt<T, E> {
    /// Add context to an error.
    ///
    /// # Errors
    ///
    /// Returns [`CtdError::Context`] wrapping the original error.
    fn with_context<C, F>(self, f: F) -> Result<T, CtdError>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<C, F>(self, f: F) -> Result<T, CtdError>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| CtdError::Context {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ParameterError::validation("tool.threshold", "11", "above upper bound 10");
        assert_eq!(
            err.to_string(),
            "Invalid value '11' for parameter 'tool.threshold': above upper bound 10"
        );
    }

    #[test]
    fn test_missing_required_display() {
        let err = CommandError::MissingRequiredArgument {
            option: "-in".to_string(),
            keys: vec!["tool.in".to_string(), "tool.extra".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required argument '-in' (parameters: tool.in, tool.extra)"
        );
    }

    #[test]
    fn test_invalid_descriptor_keeps_path() {
        let err = DescriptorError::invalid("tool/PARAMETERS/NODE[0]", "missing name");
        assert!(err.to_string().contains("tool/PARAMETERS/NODE[0]"));
        assert!(err.to_string().contains("missing name"));
    }

    #[test]
    fn test_with_context() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("disk full"));
        let err = result.with_context(|| "writing params").unwrap_err();
        assert_eq!(err.to_string(), "writing params: disk full");
    }
}
