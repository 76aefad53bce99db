//! Layered runner settings.
//!
//! Defaults, then an optional settings file, then `CTD_RUNNER__*`
//! environment variables. Command-line flags are applied on top by the
//! caller.

use config::{Config, ConfigError, Environment, File};
use ctd_sdk::{ExecutorConfig, ToolInstallation, ToolRegistry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file read when none is given on the command line.
pub const DEFAULT_SETTINGS_FILE: &str = "ctd-runner.toml";

/// Runner settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Working directory of the tool; the executor default when absent.
    pub work_dir: Option<PathBuf>,
    /// Installation root substituted for `$ROOT`.
    pub tool_root: Option<PathBuf>,
    /// Whether the tool inherits the runner's environment.
    pub inherit_environment: bool,
    /// Poll interval of the process executor in milliseconds.
    pub poll_interval_ms: u64,
    /// File name of the generated configuration file.
    pub config_file_name: String,
    /// Extra environment variables for the tool.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Installation roots by tool name.
    #[serde(default)]
    pub tools: BTreeMap<String, PathBuf>,
}

impl Settings {
    /// Loads settings from `file` (or [`DEFAULT_SETTINGS_FILE`]) and the
    /// environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

        let s = Config::builder()
            .set_default("inherit_environment", true)?
            .set_default("poll_interval_ms", 50)?
            .set_default("config_file_name", "params.ini")?
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix("CTD_RUNNER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Executor configuration built from these settings.
    pub fn executor_config(&self) -> Result<ExecutorConfig, ctd_sdk::ConfigError> {
        let mut builder = ExecutorConfig::builder()
            .inherit_environment(self.inherit_environment)
            .poll_interval(Duration::from_millis(self.poll_interval_ms))
            .config_file_name(&self.config_file_name);
        if let Some(dir) = &self.work_dir {
            builder = builder.work_dir(dir);
        }
        if let Some(root) = &self.tool_root {
            builder = builder.tool_root(root);
        }
        for (key, value) in &self.environment {
            builder = builder.env(key, value);
        }
        builder.build()
    }

    /// Tool registry holding the configured installations.
    pub fn registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for (name, root) in &self.tools {
            registry.register(name, ToolInstallation::new(root));
        }
        registry
    }
}
