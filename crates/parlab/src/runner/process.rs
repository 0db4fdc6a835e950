//! Process spawning and I/O for job execution
//!
//! Handles running toolchain and program commands with bounded lifetimes
//! and full output capture. Children are placed in their own process group
//! so that termination reaches the whole tree (mpirun spawns one child per
//! rank; killing only the launcher would orphan them).

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, instrument, warn};

use crate::types::RunOutput;

/// Errors that occur while running a child process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("process exceeded its {}s budget", limit.as_secs())]
    Timeout { limit: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stdin is closed")]
    StdinClosed,
}

fn build_command(command: &[String], env: &[(String, String)]) -> Result<Command, ProcessError> {
    let program = command.first().ok_or(ProcessError::EmptyCommand)?;
    let mut cmd = Command::new(program);
    cmd.args(&command[1..])
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .process_group(0);
    Ok(cmd)
}

/// SIGKILL the child's process group, falling back to the child itself.
///
/// Already-exited processes are a no-op, never an error.
pub(crate) async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => debug!(pid, "killed process group"),
            Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => warn!(pid, error = %e, "killpg failed, falling back to child kill"),
        }
    }
    if let Err(e) = child.kill().await
        && e.kind() != std::io::ErrorKind::InvalidInput
    {
        debug!(error = %e, "child kill after group kill");
    }
}

/// Run a command to completion with full output capture.
///
/// Stdout and stderr are captured completely and returned as one atomic
/// result; nothing is streamed. On timeout the process tree is killed,
/// partial output is discarded, and [`ProcessError::Timeout`] carries the
/// configured limit.
#[instrument(skip(command, env), fields(program = %command.first().map(String::as_str).unwrap_or("")))]
pub async fn run_captured(
    command: &[String],
    env: &[(String, String)],
    timeout: Duration,
) -> Result<RunOutput, ProcessError> {
    let mut cmd = build_command(command, env)?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

    // Read both pipes concurrently with the wait: a child that fills its
    // pipe before exiting would otherwise deadlock against us.
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(drain_pipe(stdout_pipe));
    let stderr_task = tokio::spawn(drain_pipe(stderr_pipe));

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = tokio::time::sleep(timeout) => {
            kill_tree(&mut child).await;
            // Reap before returning so no zombie outlives the job
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ProcessError::Timeout { limit: timeout });
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    debug!(
        exit_code = ?status.code(),
        signal = ?status.signal(),
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "process complete"
    );

    Ok(RunOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code: status.code(),
        signal: status.signal(),
    })
}

async fn drain_pipe(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

/// Handle for a child process with piped standard streams
///
/// Used by interactive sessions: the caller takes ownership of stdout and
/// stderr for the relay loop and pushes stdin through this handle.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl ChildProcess {
    /// Spawn a process with stdin/stdout/stderr as independent pipes
    #[instrument(skip(command, env), fields(program = %command.first().map(String::as_str).unwrap_or("")))]
    pub fn spawn(command: &[String], env: &[(String, String)]) -> Result<Self, ProcessError> {
        let mut cmd = build_command(command, env)?;
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        debug!(pid = ?child.id(), "spawned interactive process");

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
        })
    }

    /// Write a line to the process stdin, newline-terminated and flushed
    pub async fn write_line(&mut self, line: &str) -> Result<(), ProcessError> {
        let Some(ref mut stdin) = self.stdin else {
            return Err(ProcessError::StdinClosed);
        };
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        debug!(len = line.len(), "wrote line to stdin");
        Ok(())
    }

    /// Close stdin to signal EOF
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Take ownership of stdout
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Take ownership of stderr
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Terminate the process tree. No-op if already exited.
    pub async fn kill(&mut self) {
        kill_tree(&mut self.child).await;
    }

    /// Wait for the process to exit and reap it
    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        // Drop stdin so a program blocked on a read sees EOF
        self.stdin = None;
        Ok(self.child.wait().await?)
    }

    /// Check for exit without blocking
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        Ok(self.child.try_wait()?)
    }
}
