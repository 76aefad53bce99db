//! Explicitly constructed registry of installed tools.

use crate::config::ExecutorConfig;
use crate::model::NodeConfiguration;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Where one tool is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstallation {
    /// Installation directory, substituted for `$ROOT`.
    pub root: PathBuf,
    /// Executable relative to `root`; the descriptor's executable name is
    /// used when absent.
    pub executable: Option<String>,
}

impl ToolInstallation {
    /// Creates an installation rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            executable: None,
        }
    }

    /// Sets the executable path relative to the root.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }
}

/// Registry mapping tool names to installations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    installations: HashMap<String, ToolInstallation>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an installation, replacing any previous one for `name`.
    pub fn register(&mut self, name: impl Into<String>, installation: ToolInstallation) {
        let name = name.into();
        debug!(tool = %name, root = %installation.root.display(), "Registered tool");
        self.installations.insert(name, installation);
    }

    /// Looks up an installation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolInstallation> {
        self.installations.get(name)
    }

    /// Executable to launch for `config`.
    ///
    /// A registered installation wins; otherwise the descriptor's
    /// `executablePath`, then its `executableName`, is used. Returns `None`
    /// if none of them is available.
    #[must_use]
    pub fn resolve(&self, config: &NodeConfiguration) -> Option<String> {
        if let Some(installation) = self.installations.get(&config.name) {
            let executable = installation
                .executable
                .as_deref()
                .unwrap_or(&config.executable_name);
            if !executable.is_empty() {
                return Some(installation.root.join(executable).display().to_string());
            }
        }
        [&config.executable_path, &config.executable_name]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .cloned()
    }

    /// Copy of `base` whose tool root points at the installation of
    /// `config`, when one is registered.
    #[must_use]
    pub fn executor_config(&self, config: &NodeConfiguration, base: &ExecutorConfig) -> ExecutorConfig {
        let mut resolved = base.clone();
        if let Some(installation) = self.installations.get(&config.name) {
            resolved.tool_root = Some(installation.root.clone());
        }
        resolved
    }
}
