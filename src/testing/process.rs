//! Timed execution of the UI Conductor CLI
//!
//! The runner sees every execution as exactly one of four outcomes and never
//! retries.

use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::command::CommandInvocation;

/// How a CLI execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Process exited with status zero
    Success,
    /// Process ran and exited unsuccessfully
    Failed { exit_code: Option<i32> },
    /// Process could not be run, or the runner itself failed
    Error(String),
    /// Process did not finish before the deadline and was killed
    TimedOut(Duration),
}

impl CommandStatus {
    /// Status label used in logs and case metadata
    pub fn label(&self) -> &'static str {
        match self {
            CommandStatus::Success => "SUCCESS",
            CommandStatus::Failed { .. } => "FAILED",
            CommandStatus::Error(_) => "EXCEPTION",
            CommandStatus::TimedOut(_) => "TIMED_OUT",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Success => write!(f, "completed successfully"),
            CommandStatus::Failed {
                exit_code: Some(code),
            } => write!(f, "exited with code {}", code),
            CommandStatus::Failed { exit_code: None } => write!(f, "was terminated by a signal"),
            CommandStatus::Error(message) => write!(f, "could not be run: {}", message),
            CommandStatus::TimedOut(timeout) => {
                write!(f, "timed out after {} seconds", timeout.as_secs_f64())
            }
        }
    }
}

/// Result of one CLI execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutcome {
    /// An outcome with no captured output
    pub fn with_status(status: CommandStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Executes a command under a deadline
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` and wait at most `timeout` for it to finish
    async fn run(&self, invocation: &CommandInvocation, timeout: Duration) -> ExecutionOutcome;
}

#[async_trait]
impl<'a, T: ProcessRunner + ?Sized> ProcessRunner for &'a T {
    async fn run(&self, invocation: &CommandInvocation, timeout: Duration) -> ExecutionOutcome {
        (**self).run(invocation, timeout).await
    }
}

/// How long to keep reading a child's pipes once it has exited or been killed
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs commands as child processes on the tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &CommandInvocation, timeout: Duration) -> ExecutionOutcome {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::with_status(CommandStatus::Error(format!(
                    "failed to spawn '{}': {}",
                    invocation.program.to_string_lossy(),
                    e
                )))
            }
        };

        let mut stdout = Capture::start(child.stdout.take());
        let mut stderr = Capture::start(child.stderr.take());

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(exit)) if exit.success() => CommandStatus::Success,
            Ok(Ok(exit)) => CommandStatus::Failed {
                exit_code: exit.code(),
            },
            Ok(Err(e)) => CommandStatus::Error(format!("failed to wait for process: {}", e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out process: {}", e);
                }
                CommandStatus::TimedOut(timeout)
            }
        };

        // Descendants may still hold the pipes open
        let _ = tokio::time::timeout(DRAIN_GRACE, async {
            tokio::join!(&mut stdout.task, &mut stderr.task)
        })
        .await;

        ExecutionOutcome {
            status,
            stdout: stdout.finish(),
            stderr: stderr.finish(),
        }
    }
}

/// Collects a child pipe in the background, keeping whatever arrived so far
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl Capture {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else { return };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => match sink.lock() {
                        Ok(mut buffer) => buffer.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                }
            }
        });
        Self { buffer, task }
    }

    fn finish(self) -> String {
        self.task.abort();
        self.buffer
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default()
    }
}
