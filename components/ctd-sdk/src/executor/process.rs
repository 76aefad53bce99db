//! Synchronous execution of one external process.

use super::ToolExecutor;
use crate::config::ExecutorConfig;
use crate::error::ExecutionError;
use crate::types::ExecutionResult;
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type Lines = Arc<Mutex<Vec<String>>>;

/// Runs an executable with arguments in a working directory, capturing
/// its output line by line.
///
/// # Example
///
/// ```no_run
/// use ctd_sdk::config::ExecutorConfig;
/// use ctd_sdk::executor::{ProcessExecutor, ToolExecutor};
///
/// let config = ExecutorConfig::default();
/// let executor = ProcessExecutor::new("echo", vec!["hello".to_string()], &config);
/// let code = executor.execute().unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(executor.tool_output(), vec!["hello"]);
/// ```
#[derive(Debug)]
pub struct ProcessExecutor {
    executable: String,
    args: Vec<String>,
    config: ExecutorConfig,
    kill_requested: AtomicBool,
    stdout: Lines,
    stderr: Lines,
    result: Mutex<Option<ExecutionResult>>,
}

impl ProcessExecutor {
    /// Creates an executor; `$ROOT` in the executable and arguments is
    /// replaced with the configured tool root.
    #[must_use]
    pub fn new(executable: impl AsRef<str>, args: Vec<String>, config: &ExecutorConfig) -> Self {
        Self {
            executable: config.substitute_root(executable.as_ref()),
            args: args.iter().map(|arg| config.substitute_root(arg)).collect(),
            config: config.clone(),
            kill_requested: AtomicBool::new(false),
            stdout: Arc::default(),
            stderr: Arc::default(),
            result: Mutex::new(None),
        }
    }

    /// The executable after `$ROOT` substitution.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// The arguments after `$ROOT` substitution.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn failed(&self, source: std::io::Error) -> ExecutionError {
        ExecutionError::ToolExecutionFailed {
            tool: self.executable.clone(),
            source: source.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(&self.args)
            .current_dir(&self.config.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if !self.config.inherit_environment {
            command.env_clear();
        }
        for (key, value) in &self.config.environment {
            command.env(key, self.config.substitute_root(value));
        }
        command
    }

    fn finish(&self, result: ExecutionResult) -> i32 {
        let code = result.exit_code;
        *self.result.lock() = Some(result);
        code
    }

    fn snapshot(&self) -> (Vec<String>, Vec<String>) {
        (self.stdout.lock().clone(), self.stderr.lock().clone())
    }

    fn kill_child(&self, child: &mut Child) -> i32 {
        warn!(tool = %self.executable, pid = child.id(), "Killing tool process");
        if let Err(e) = child.kill() {
            debug!(error = %e, "Process already gone");
        }
        let _ = child.wait();
        let (stdout, stderr) = self.snapshot();
        self.finish(ExecutionResult::killed(stdout, stderr))
    }

    /// Waits for the output pipes to close after the child exited.
    ///
    /// A background process started by the tool may keep the pipes open;
    /// a kill during that wait abandons the readers.
    fn collect_output(&self, exit_code: i32, readers: Vec<JoinHandle<()>>) -> i32 {
        while !readers.iter().all(JoinHandle::is_finished) {
            if self.kill_requested.load(Ordering::SeqCst) {
                warn!(tool = %self.executable, "Killed while tool output was still open");
                let (stdout, stderr) = self.snapshot();
                return self.finish(ExecutionResult::killed(stdout, stderr));
            }
            thread::sleep(self.config.poll_interval);
        }
        for reader in readers {
            let _ = reader.join();
        }
        let (stdout, stderr) = self.snapshot();
        self.finish(ExecutionResult::exited(exit_code, stdout, stderr))
    }
}

impl ToolExecutor for ProcessExecutor {
    fn execute(&self) -> Result<i32, ExecutionError> {
        if self.kill_requested.load(Ordering::SeqCst) {
            info!(tool = %self.executable, "Kill requested before launch");
            return Ok(self.finish(ExecutionResult::killed(Vec::new(), Vec::new())));
        }

        std::fs::create_dir_all(&self.config.work_dir).map_err(|e| self.failed(e))?;

        info!(
            tool = %self.executable,
            args = ?self.args,
            work_dir = %self.config.work_dir.display(),
            "Launching tool"
        );
        let mut child = self.command().spawn().map_err(|e| self.failed(e))?;

        let readers = [
            child.stdout.take().map(|out| drain(out, Arc::clone(&self.stdout))),
            child.stderr.take().map(|err| drain(err, Arc::clone(&self.stderr))),
        ];

        loop {
            if self.kill_requested.load(Ordering::SeqCst) {
                // Reader threads end once the pipes close; they are not
                // joined so that a lingering grandchild cannot block us.
                return Ok(self.kill_child(&mut child));
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    let exit_code = status.code().unwrap_or(-1);
                    info!(tool = %self.executable, exit_code, "Tool finished");
                    let readers = readers.into_iter().flatten().collect();
                    return Ok(self.collect_output(exit_code, readers));
                }
                Ok(None) => thread::sleep(self.config.poll_interval),
                Err(e) => {
                    let _ = child.kill();
                    return Err(self.failed(e));
                }
            }
        }
    }

    fn kill(&self) {
        self.kill_requested.store(true, Ordering::SeqCst);
    }

    fn result(&self) -> Option<ExecutionResult> {
        self.result.lock().clone()
    }

    fn tool_output(&self) -> Vec<String> {
        self.stdout.lock().clone()
    }

    fn tool_error_output(&self) -> Vec<String> {
        self.stderr.lock().clone()
    }
}

fn drain(stream: impl Read + Send + 'static, sink: Lines) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                    let line = line.strip_suffix(b"\r").unwrap_or(line);
                    sink.lock().push(String::from_utf8_lossy(line).into_owned());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!(error = %e, "Stopped reading tool output");
                    break;
                }
            }
        }
    })
}
