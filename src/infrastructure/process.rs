//! # Process Runner
//!
//! Spawns external commands and returns raw output. No parsing, no business
//! logic; the command builder decides what to run and the parsers decide what
//! it meant.

use crate::domain::errors::BridgeError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

/// Raw output of a completed command.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl RawOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A spawned streaming process: line reader over stdout plus the child
/// handle so the caller owns timeout and kill decisions.
pub struct StreamingChild {
    pub child: Child,
    pub lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<tokio::process::ChildStderr>,
}

impl StreamingChild {
    /// Hand the stderr pipe to the caller, who must drain it concurrently
    /// with the stdout loop; a full pipe buffer blocks the child.
    pub fn take_stderr(&mut self) -> Option<tokio::process::ChildStderr> {
        self.stderr.take()
    }
}

/// Executes subprocess commands with piped stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, bin: &str, args: &[String], cwd: Option<&Path>) -> Result<Child, BridgeError> {
        let mut cmd = Command::new(bin);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BridgeError::NotInstalled,
            _ => BridgeError::io("spawn", bin, e),
        })
    }

    /// Run to completion under a timeout, gathering stdout and stderr.
    /// The child is killed if the timeout elapses.
    pub async fn run(
        &self,
        bin: &str,
        args: &[String],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<RawOutput, BridgeError> {
        tracing::debug!(bin, cwd = ?cwd, "spawning command");
        let mut child = self.spawn(bin, args, cwd)?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let gather = async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            let stdout_read = async {
                if let Some(pipe) = stdout_pipe.as_mut() {
                    pipe.read_to_string(&mut stdout).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            let stderr_read = async {
                if let Some(pipe) = stderr_pipe.as_mut() {
                    pipe.read_to_string(&mut stderr).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            let (out_res, err_res) = tokio::join!(stdout_read, stderr_read);
            out_res?;
            err_res?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(RawOutput {
                stdout,
                stderr,
                code: status.code(),
            })
        };

        match tokio::time::timeout(timeout, gather).await {
            Ok(Ok(output)) => {
                tracing::debug!(bin, code = ?output.code, "command completed");
                Ok(output)
            }
            Ok(Err(e)) => Err(BridgeError::io("run", bin, e)),
            Err(_) => Err(BridgeError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    /// Start a streaming process and hand back the line reader.
    pub fn spawn_stream(
        &self,
        bin: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<StreamingChild, BridgeError> {
        tracing::debug!(bin, cwd = ?cwd, "spawning streaming command");
        let mut child = self.spawn(bin, args, cwd)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::io("pipe", bin, std::io::Error::other("stdout not piped")))?;
        let stderr = child.stderr.take();

        Ok(StreamingChild {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr,
        })
    }
}
