//! Core types shared by the executors.

use serde::{Deserialize, Serialize};

/// Outcome of one tool run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code of the process; `-1` if it ended without one.
    pub exit_code: i32,
    /// Lines written to standard output.
    pub stdout: Vec<String>,
    /// Lines written to standard error.
    pub stderr: Vec<String>,
    /// Whether the process ran to its own end.
    pub completed: bool,
    /// Whether the run was stopped by a kill request.
    pub killed: bool,
}

impl ExecutionResult {
    /// Creates a result for a process that exited on its own.
    #[must_use]
    pub fn exited(exit_code: i32, stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            completed: true,
            killed: false,
        }
    }

    /// Creates a result for a killed run.
    #[must_use]
    pub fn killed(stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self {
            exit_code: -1,
            stdout,
            stderr,
            completed: false,
            killed: true,
        }
    }

    /// Whether the process exited on its own with code zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.completed && self.exit_code == 0
    }
}
