//! Running the external tool.
//!
//! [`ProcessExecutor`] runs one process synchronously. [`AsyncToolExecutor`]
//! wraps any [`ToolExecutor`] to run it on a worker thread with
//! multi-waiter completion and cooperative kill.

pub mod async_exec;
pub mod process;

use crate::error::ExecutionError;
use crate::types::ExecutionResult;

pub use async_exec::AsyncToolExecutor;
pub use process::ProcessExecutor;

/// A single, non-reusable tool run.
///
/// `kill` may be called from any thread while `execute` is blocked on
/// another one.
pub trait ToolExecutor: Send + Sync {
    /// Runs the tool to its end and returns the exit code.
    ///
    /// A nonzero exit code is a normal result. A killed run returns
    /// without error and is flagged in [`ToolExecutor::result`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::ToolExecutionFailed`] if the tool cannot
    /// be started at all.
    fn execute(&self) -> Result<i32, ExecutionError>;

    /// Requests termination; a no-op once the run has ended.
    fn kill(&self);

    /// Outcome of the run, once it has ended.
    fn result(&self) -> Option<ExecutionResult>;

    /// Standard output lines captured so far.
    fn tool_output(&self) -> Vec<String>;

    /// Standard error lines captured so far.
    fn tool_error_output(&self) -> Vec<String>;
}
