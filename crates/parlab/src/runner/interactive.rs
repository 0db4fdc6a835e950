//! Interactive session handling
//!
//! Provides long-lived sessions for programs that require back-and-forth
//! communication. Output is relayed as it is produced while the caller may
//! push input at any time until the process ends. One relay task per
//! session owns the child process and the workspace; teardown happens on
//! that task's single exit path, so it runs exactly once no matter how the
//! session ends.

use std::os::unix::process::ExitStatusExt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::runner::SessionError;
use crate::runner::process::ChildProcess;
use crate::workspace::Workspace;

const READ_CHUNK: usize = 4096;

/// Event from an interactive session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Data received on stdout
    Stdout(Vec<u8>),

    /// Data received on stderr
    Stderr(Vec<u8>),

    /// An unexpected I/O failure inside the session. The session still
    /// tears down and emits a final [`SessionEvent::Exited`].
    Fault(String),

    /// The process ended and all remaining output has been relayed.
    /// Always the last event of a session.
    Exited(SessionExit),
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The child process exited on its own
    Completed,

    /// Explicit stop request or client disconnect
    Stopped,

    /// The session-lifetime cap expired
    TimedOut,
}

/// Final state of a finished session
#[derive(Debug, Clone)]
pub struct SessionExit {
    /// Exit code if the program exited normally
    pub exit_code: Option<i32>,

    /// Signal number if the program was killed by a signal
    pub signal: Option<i32>,

    pub reason: ExitReason,
}

/// A compiled program running with piped standard streams
///
/// Created by [`Runner::start_session`](crate::runner::Runner::start_session);
/// consumed by [`into_stream`](Self::into_stream) which moves it, along
/// with the workspace it owns, into the relay task.
#[derive(Debug)]
pub struct InteractiveSession {
    process: ChildProcess,
    workspace: Workspace,
    lifetime: Duration,
}

impl InteractiveSession {
    pub(crate) fn new(process: ChildProcess, workspace: Workspace, lifetime: Duration) -> Self {
        Self {
            process,
            workspace,
            lifetime,
        }
    }

    /// Split the session into an event stream and an input/control handle.
    ///
    /// Spawns the relay task. The task forwards output as soon as it is
    /// available (per-stream order preserved), drains both streams to EOF
    /// before reporting exit, and always removes the workspace on the way
    /// out.
    pub fn into_stream(self) -> (SessionStream, SessionHandle) {
        let (event_tx, event_rx) = mpsc::channel(100);
        let (stdin_tx, stdin_rx) = mpsc::channel(100);
        let (stop_tx, stop_rx) = mpsc::channel(1);

        let task = tokio::spawn(relay(self, event_tx, stdin_rx, stop_rx));

        (
            SessionStream {
                rx: event_rx,
                _task: task,
            },
            SessionHandle { stdin_tx, stop_tx },
        )
    }
}

/// Receiving side of a session: yields [`SessionEvent`]s in order
pub struct SessionStream {
    rx: mpsc::Receiver<SessionEvent>,
    _task: tokio::task::JoinHandle<()>,
}

impl SessionStream {
    /// Receive the next event. `None` after the final
    /// [`SessionEvent::Exited`] has been consumed.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }
}

/// Handle for writing input to and terminating a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    stdin_tx: mpsc::Sender<String>,
    stop_tx: mpsc::Sender<()>,
}

impl SessionHandle {
    /// Queue a line for the process stdin; it is written
    /// newline-terminated and flushed without buffering delay.
    ///
    /// Fails with [`SessionError::NotRunning`] once the session is over.
    pub async fn send_line(&self, line: &str) -> Result<(), SessionError> {
        self.stdin_tx
            .send(line.to_string())
            .await
            .map_err(|_| SessionError::NotRunning)
    }

    /// Request termination of the session.
    ///
    /// Idempotent and always safe: terminating a session that already
    /// ended (or was already asked to stop) is a no-op.
    pub fn terminate(&self) {
        let _ = self.stop_tx.try_send(());
    }
}

async fn read_chunk<R: AsyncRead + Unpin>(
    stream: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match stream {
        Some(r) => r.read(buf).await,
        None => Ok(0),
    }
}

async fn relay(
    session: InteractiveSession,
    events: mpsc::Sender<SessionEvent>,
    mut stdin_rx: mpsc::Receiver<String>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let InteractiveSession {
        mut process,
        mut workspace,
        lifetime,
    } = session;

    let deadline = Instant::now() + lifetime;
    let mut stdout = process.take_stdout();
    let mut stderr = process.take_stderr();
    let mut stdout_open = stdout.is_some();
    let mut stderr_open = stderr.is_some();
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];
    let mut reason = ExitReason::Completed;
    // Once a stop is in flight the loop only drains; no second kill,
    // no further input.
    let mut stopping = false;
    // All handles dropped closes the stop channel; that is not a stop
    // request, the deadline still bounds the session.
    let mut stop_closed = false;

    while stdout_open || stderr_open {
        tokio::select! {
            biased;

            Some(line) = stdin_rx.recv(), if !stopping => {
                if let Err(e) = process.write_line(&line).await {
                    debug!(error = %e, "stdin write failed");
                    let _ = events.send(SessionEvent::Fault(format!(
                        "Failed to send input: {e}"
                    ))).await;
                }
            }

            stop = stop_rx.recv(), if !stopping && !stop_closed => {
                match stop {
                    Some(()) => {
                        stopping = true;
                        reason = ExitReason::Stopped;
                        process.kill().await;
                    }
                    None => stop_closed = true,
                }
            }

            _ = tokio::time::sleep_until(deadline), if !stopping => {
                stopping = true;
                reason = ExitReason::TimedOut;
                debug!("session lifetime expired");
                process.kill().await;
            }

            result = read_chunk(&mut stdout, &mut out_buf), if stdout_open => {
                match result {
                    Ok(0) => {
                        stdout = None;
                        stdout_open = false;
                    }
                    Ok(n) => {
                        let _ = events.send(SessionEvent::Stdout(out_buf[..n].to_vec())).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdout read error");
                        let _ = events.send(SessionEvent::Fault(e.to_string())).await;
                        stdout = None;
                        stdout_open = false;
                    }
                }
            }

            result = read_chunk(&mut stderr, &mut err_buf), if stderr_open => {
                match result {
                    Ok(0) => {
                        stderr = None;
                        stderr_open = false;
                    }
                    Ok(n) => {
                        let _ = events.send(SessionEvent::Stderr(err_buf[..n].to_vec())).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "stderr read error");
                        let _ = events.send(SessionEvent::Fault(e.to_string())).await;
                        stderr = None;
                        stderr_open = false;
                    }
                }
            }
        }
    }

    // Both streams drained: reap the child and report its fate
    let exit = match process.wait().await {
        Ok(status) => SessionExit {
            exit_code: status.code(),
            signal: status.signal(),
            reason,
        },
        Err(e) => {
            warn!(error = %e, "failed to reap session process");
            let _ = events.send(SessionEvent::Fault(e.to_string())).await;
            SessionExit {
                exit_code: None,
                signal: None,
                reason,
            }
        }
    };

    // Teardown before the final event: by the time the client sees
    // `Exited`, no filesystem state from this job remains.
    if let Err(e) = workspace.remove().await {
        warn!(error = %e, "session workspace removal failed");
    }

    debug!(?exit, "session finished");
    let _ = events.send(SessionEvent::Exited(exit)).await;
}
