//! CTD SDK - Common Tool Descriptor engine.
//!
//! This crate reads tool descriptors, holds their typed parameters, maps
//! parameter values onto a command line and runs the external tool.
//!
//! # Features
//!
//! - **Parameter Model**: Typed, validated values in a keyed tree
//! - **Descriptors**: CTD XML reading and writing with value round trip
//! - **Command Mapping**: Flat switch tokens or a generated config file
//! - **Execution**: Synchronous process runs with output capture and kill
//! - **Async Wrapper**: Worker-thread runs with multi-waiter completion
//! - **Import**: Content-type checked assignment of files to ports
//!
//! # Example
//!
//! ```rust
//! use ctd_sdk::{CommandGenerator, DescriptorReader, SwitchCommandGenerator};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = r#"<tool name="Echo">
//!   <executableName>echo</executableName>
//!   <cli>
//!     <clielement optionIdentifier="" isList="false" isRequired="true">
//!       <mapping referenceName="echo.text"/>
//!     </clielement>
//!   </cli>
//!   <PARAMETERS>
//!     <NODE name="echo">
//!       <ITEM name="text" value="" type="string"/>
//!     </NODE>
//!   </PARAMETERS>
//! </tool>"#;
//!
//! let mut config = DescriptorReader::new(xml).read()?;
//! config.set_value_from_string("echo.text", "hello")?;
//!
//! let args = SwitchCommandGenerator.generate_command(&config)?;
//! assert_eq!(args, vec!["hello"]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod import;
pub mod model;
pub mod params;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use command::{
    CommandGenerator, ConfigFileCommandGenerator, ConfigFileFormat, SwitchCommandGenerator,
    resolve_arguments,
};
pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use descriptor::{DescriptorReader, DescriptorWriter, write_descriptor, write_parameters};
pub use error::{
    CommandError, ConfigError, CtdError, DescriptorError, ExecutionError, ImportError,
    ParameterError, ResultExt,
};
pub use executor::{AsyncToolExecutor, ProcessExecutor, ToolExecutor};
pub use import::{ContentTypeResolver, ExtensionRegistry, FileBatch, FileImporter, populate_port};
pub use model::{CliElement, Citation, Mapping, NodeConfiguration, Port};
pub use params::{Bounds, FileDirection, Parameter, ParameterTree, ParameterValue, ValueKind};
pub use registry::{ToolInstallation, ToolRegistry};
pub use types::ExecutionResult;

/// Version of the CTD SDK.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes logging for the SDK.
///
/// Honours `RUST_LOG`. This should be called once at the start of the
/// application.
///
/// # Errors
///
/// Returns an error if the tracing subscriber has already been set.
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
