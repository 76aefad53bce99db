//! Fire-and-forget execution with blocking completion notification.
//!
//! One mutex guards the whole run state and one condition variable
//! broadcasts every transition to finished, so any number of threads can
//! park in [`AsyncToolExecutor::wait_until_finished`]. A waiter that wakes
//! up sees the exit code and the captured result together.

use super::ToolExecutor;
use crate::error::ExecutionError;
use crate::types::ExecutionResult;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    NotStarted,
    Running,
    Finished,
}

#[derive(Debug, Default)]
struct RunState {
    phase: Phase,
    completed: bool,
    killed: bool,
    exit_code: Option<i32>,
    result: Option<ExecutionResult>,
    failure: Option<String>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<RunState>,
    finished: Condvar,
}

impl Shared {
    fn finish(&self, outcome: Result<i32, ExecutionError>, result: Option<ExecutionResult>) {
        let mut state = self.state.lock();
        match outcome {
            Ok(code) => {
                let killed = state.killed || result.as_ref().is_some_and(|r| r.killed);
                state.killed = killed;
                state.completed = !killed;
                state.exit_code = Some(code);
            }
            Err(e) => {
                warn!(error = %e, "Tool run failed");
                state.completed = false;
                state.failure = Some(e.to_string());
            }
        }
        state.result = result;
        state.phase = Phase::Finished;
        drop(state);
        self.finished.notify_all();
    }
}

/// Runs a [`ToolExecutor`] on its own worker thread.
///
/// An instance runs at most once. [`AsyncToolExecutor::kill`] may be called
/// from any thread at any time; killing an instance that was never invoked
/// finishes it immediately.
///
/// # Example
///
/// ```no_run
/// use ctd_sdk::config::ExecutorConfig;
/// use ctd_sdk::executor::{AsyncToolExecutor, ProcessExecutor};
///
/// let process = ProcessExecutor::new("sleep", vec!["1".to_string()], &ExecutorConfig::default());
/// let run = AsyncToolExecutor::new(process);
/// run.invoke().unwrap();
/// run.wait_until_finished();
/// assert!(run.is_completed());
/// assert_eq!(run.exit_code(), Some(0));
/// ```
#[derive(Debug)]
pub struct AsyncToolExecutor<E: ToolExecutor + 'static> {
    executor: Arc<E>,
    shared: Arc<Shared>,
}

impl<E: ToolExecutor + 'static> AsyncToolExecutor<E> {
    /// Wraps an executor that has not run yet.
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
            shared: Arc::default(),
        }
    }

    /// Starts the run on a new thread and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::IllegalState`] if the instance was already
    /// invoked or killed, and [`ExecutionError::ToolExecutionFailed`] if the
    /// worker thread cannot be spawned. Launch failures of the tool itself
    /// are not returned here; see [`AsyncToolExecutor::failure`].
    pub fn invoke(&self) -> Result<(), ExecutionError> {
        {
            let mut state = self.shared.state.lock();
            if state.phase != Phase::NotStarted {
                let reason = if state.killed {
                    "executor was killed and is not reusable"
                } else {
                    "executor already invoked and is not reusable"
                };
                return Err(ExecutionError::IllegalState {
                    reason: reason.to_string(),
                });
            }
            state.phase = Phase::Running;
        }

        let executor = Arc::clone(&self.executor);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("ctd-tool-run".to_string())
            .spawn(move || {
                let outcome = executor.execute();
                shared.finish(outcome, executor.result());
            });

        if let Err(e) = spawned {
            let message = e.to_string();
            self.shared.finish(
                Err(ExecutionError::IllegalState {
                    reason: message.clone(),
                }),
                None,
            );
            return Err(ExecutionError::ToolExecutionFailed {
                tool: "worker thread".to_string(),
                source: message.into(),
            });
        }

        debug!("Tool run started");
        Ok(())
    }

    /// Blocks until the run has finished.
    ///
    /// Returns immediately for a killed instance that was never invoked.
    /// Must not be called on an instance that is never invoked nor killed.
    pub fn wait_until_finished(&self) {
        let mut state = self.shared.state.lock();
        while state.phase != Phase::Finished {
            self.shared.finished.wait(&mut state);
        }
    }

    /// Blocks until the run has finished or `timeout` has elapsed.
    ///
    /// Returns whether the run finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.phase != Phase::Finished {
            if self
                .shared
                .finished
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.phase == Phase::Finished;
            }
        }
        true
    }

    /// Requests termination of the run.
    ///
    /// Wakes every waiter once the executor has stopped. Killing an
    /// instance that was never invoked finishes it immediately.
    pub fn kill(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.phase == Phase::Finished {
                return;
            }
            state.killed = true;
            if state.phase == Phase::NotStarted {
                state.phase = Phase::Finished;
            }
        }

        warn!("Kill requested for tool run");
        self.executor.kill();
        self.shared.finished.notify_all();
    }

    /// Whether the run has finished.
    pub fn is_done(&self) -> bool {
        self.shared.state.lock().phase == Phase::Finished
    }

    /// Whether the run finished on its own, without kill or launch failure.
    pub fn is_completed(&self) -> bool {
        self.shared.state.lock().completed
    }

    /// Whether a kill was requested.
    pub fn is_killed(&self) -> bool {
        self.shared.state.lock().killed
    }

    /// Exit code returned by the executor, once finished.
    pub fn exit_code(&self) -> Option<i32> {
        self.shared.state.lock().exit_code
    }

    /// Result published when the run finished.
    pub fn result(&self) -> Option<ExecutionResult> {
        self.shared.state.lock().result.clone()
    }

    /// Message of a launch failure swallowed by the worker.
    pub fn failure(&self) -> Option<String> {
        self.shared.state.lock().failure.clone()
    }

    /// The wrapped executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }
}
