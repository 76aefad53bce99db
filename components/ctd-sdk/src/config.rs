//! Configuration for running external tools.
//!
//! Provides a strongly-typed configuration with environment variable
//! support and sensible defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder replaced by [`ExecutorConfig::tool_root`] in executable
/// paths, arguments and environment values.
pub const ROOT_PLACEHOLDER: &str = "$ROOT";

/// Executor configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Working directory of the tool; created if missing.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Installation root substituted for `$ROOT`.
    #[serde(default)]
    pub tool_root: Option<PathBuf>,

    /// Whether the tool inherits the caller's environment.
    #[serde(default = "default_true")]
    pub inherit_environment: bool,

    /// Extra environment variables, applied after inheritance.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// How often a running process is checked for exit or kill.
    #[serde(default = "default_poll_interval", with = "millis_serde")]
    pub poll_interval: Duration,

    /// File name used by the configuration-file command encoding.
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,
}

impl ExecutorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables are prefixed with `CTD_`.
    /// For example: `CTD_POLL_INTERVAL_MS=20`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] if a variable cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CTD_WORK_DIR") {
            config.work_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CTD_TOOL_ROOT") {
            config.tool_root = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("CTD_INHERIT_ENV") {
            config.inherit_environment = match val.to_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(ConfigError::InvalidConfiguration {
                        key: "inherit_environment".to_string(),
                        value: val,
                    });
                }
            };
        }

        if let Ok(val) = std::env::var("CTD_POLL_INTERVAL_MS") {
            let millis: u64 = val.parse().map_err(|_| ConfigError::InvalidConfiguration {
                key: "poll_interval_ms".to_string(),
                value: val.clone(),
            })?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Ok(val) = std::env::var("CTD_CONFIG_FILE_NAME") {
            config.config_file_name = val;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] for an empty work
    /// directory or file name, or a zero poll interval.
    pub fn validate(&self) -> Result<&Self, ConfigError> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                key: "work_dir".to_string(),
                value: "empty".to_string(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidConfiguration {
                key: "poll_interval".to_string(),
                value: "0".to_string(),
            });
        }

        if self.config_file_name.trim().is_empty()
            || self.config_file_name.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidConfiguration {
                key: "config_file_name".to_string(),
                value: self.config_file_name.clone(),
            });
        }

        Ok(self)
    }

    /// Replaces `$ROOT` in `value` with the tool root, if one is set.
    #[must_use]
    pub fn substitute_root(&self, value: &str) -> String {
        match &self.tool_root {
            Some(root) => value.replace(ROOT_PLACEHOLDER, &root.to_string_lossy()),
            None => value.to_string(),
        }
    }

    /// Returns a builder for creating configuration.
    #[must_use]
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            tool_root: None,
            inherit_environment: default_true(),
            environment: BTreeMap::new(),
            poll_interval: default_poll_interval(),
            config_file_name: default_config_file_name(),
        }
    }
}

/// Builder for constructing [`ExecutorConfig`].
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    work_dir: Option<PathBuf>,
    tool_root: Option<PathBuf>,
    inherit_environment: Option<bool>,
    environment: BTreeMap<String, String>,
    poll_interval: Option<Duration>,
    config_file_name: Option<String>,
}

impl ExecutorConfigBuilder {
    /// Sets the working directory.
    #[must_use]
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Sets the installation root substituted for `$ROOT`.
    #[must_use]
    pub fn tool_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.tool_root = Some(root.into());
        self
    }

    /// Sets whether the caller's environment is inherited.
    #[must_use]
    pub fn inherit_environment(mut self, inherit: bool) -> Self {
        self.inherit_environment = Some(inherit);
        self
    }

    /// Adds one environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the configuration file name.
    #[must_use]
    pub fn config_file_name(mut self, name: impl Into<String>) -> Self {
        self.config_file_name = Some(name.into());
        self
    }

    /// Builds the configuration, validating all values.
    ///
    /// # Errors
    ///
    /// See [`ExecutorConfig::validate`].
    pub fn build(self) -> Result<ExecutorConfig, ConfigError> {
        let mut config = ExecutorConfig::default();

        if let Some(v) = self.work_dir {
            config.work_dir = v;
        }
        config.tool_root = self.tool_root;
        if let Some(v) = self.inherit_environment {
            config.inherit_environment = v;
        }
        config.environment = self.environment;
        if let Some(v) = self.poll_interval {
            config.poll_interval = v;
        }
        if let Some(v) = self.config_file_name {
            config.config_file_name = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("ctd-work")
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(50)
}

fn default_config_file_name() -> String {
    "params.ini".to_string()
}

// Durations are written as whole milliseconds
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert!(config.inherit_environment);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.config_file_name, "params.ini");
        assert!(config.work_dir.ends_with("ctd-work"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ExecutorConfig::builder()
            .work_dir("/tmp/run")
            .tool_root("/opt/blast")
            .inherit_environment(false)
            .env("BLASTDB", "$ROOT/db")
            .poll_interval(Duration::from_millis(5))
            .build()
            .unwrap();

        assert_eq!(config.work_dir, PathBuf::from("/tmp/run"));
        assert!(!config.inherit_environment);
        assert_eq!(config.environment["BLASTDB"], "$ROOT/db");
    }

    #[test]
    fn test_invalid_config() {
        assert!(
            ExecutorConfig::builder()
                .poll_interval(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            ExecutorConfig::builder()
                .config_file_name("dir/params.ini")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_substitute_root() {
        let config = ExecutorConfig::builder()
            .tool_root("/opt/tool")
            .build()
            .unwrap();
        assert_eq!(config.substitute_root("$ROOT/bin/run"), "/opt/tool/bin/run");
        assert_eq!(
            ExecutorConfig::default().substitute_root("$ROOT/bin"),
            "$ROOT/bin"
        );
    }

    #[test]
    fn test_serde_uses_millis() {
        let config = ExecutorConfig::builder()
            .poll_interval(Duration::from_millis(75))
            .build()
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["poll_interval"], 75);

        let parsed: ExecutorConfig =
            serde_json::from_str(r#"{"work_dir": "/w", "poll_interval": 10}"#).unwrap();
        assert_eq!(parsed.poll_interval, Duration::from_millis(10));
        assert!(parsed.inherit_environment);
    }
}
