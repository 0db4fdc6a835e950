//! WebSocket endpoint for interactive sessions
//!
//! One connection holds at most one live session. Client events are JSON
//! objects tagged by `type` (`start`, `input`, `stop`); server events
//! mirror the session lifecycle (`connected`, `compiled`, `compile_error`,
//! `output`, `stderr`, `finished`, `error`). A second `start` on a live
//! connection preempts the existing session; disconnect triggers the same
//! teardown as an explicit stop.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use parlab::{ExitReason, JobError, SessionEvent, SessionStream, ValidationError};

use crate::http::SubmitRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientEvent {
    /// Compile and start a program for this connection
    Start {
        #[serde(flatten)]
        request: SubmitRequest,
    },

    /// Forward a line to the running program's stdin
    Input { input: String },

    /// Terminate the running program
    Stop,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerEvent {
    Connected {
        status: &'static str,
    },
    Compiled {
        message: String,
    },
    CompileError {
        error: &'static str,
        stderr: String,
        stdout: String,
    },
    Output {
        data: String,
    },
    Stderr {
        data: String,
    },
    Finished {
        returncode: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Error {
        message: String,
    },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    let (mut sink, mut source) = socket.split();

    // All server events funnel through one channel so session output and
    // direct replies cannot interleave mid-frame.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(100);

    let writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let _ = out_tx
        .send(ServerEvent::Connected {
            status: "connected",
        })
        .await;
    debug!(conn_id, "client connected");

    while let Some(message) = source.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                debug!(conn_id, error = %e, "websocket receive error");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                handle_client_event(&text, &conn_id, &state, &out_tx).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Disconnect: same teardown as an explicit stop. The relay task does
    // the actual cleanup; terminating twice is harmless.
    if let Some(handle) = state.registry.take(&conn_id).await {
        handle.terminate();
    }
    debug!(conn_id, "client disconnected");
    writer.abort();
}

async fn handle_client_event(
    text: &str,
    conn_id: &str,
    state: &AppState,
    out_tx: &mpsc::Sender<ServerEvent>,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            let _ = out_tx
                .send(ServerEvent::Error {
                    message: format!("malformed event: {e}"),
                })
                .await;
            return;
        }
    };

    match event {
        ClientEvent::Start { request } => start_session(request, conn_id, state, out_tx).await,
        ClientEvent::Input { input } => send_input(&input, conn_id, state, out_tx).await,
        ClientEvent::Stop => {
            if let Some(handle) = state.registry.take(conn_id).await {
                handle.terminate();
            }
        }
    }
}

async fn start_session(
    request: SubmitRequest,
    conn_id: &str,
    state: &AppState,
    out_tx: &mpsc::Sender<ServerEvent>,
) {
    // One session per connection: a new start preempts the old session,
    // tearing it down before the id is reused.
    if let Some(old) = state.registry.take(conn_id).await {
        debug!(conn_id, "preempting existing session");
        old.terminate();
    }

    let job = match request.into_job(state.config().language_screen) {
        Ok(job) => job,
        Err(e) => {
            let message = match e {
                ValidationError::LanguageMismatch { advice } => advice,
                other => other.to_string(),
            };
            let _ = out_tx.send(ServerEvent::Error { message }).await;
            return;
        }
    };

    match state.runner.start_session(&job).await {
        Ok((info, session)) => {
            let _ = out_tx
                .send(ServerEvent::Compiled {
                    message: format!("Compilation successful [{}]", info.compiler),
                })
                .await;

            let (stream, handle) = session.into_stream();
            if state.registry.register(conn_id, handle.clone()).await.is_err() {
                // Lost a race with another start on this connection
                handle.terminate();
                let _ = out_tx
                    .send(ServerEvent::Error {
                        message: "a session is already active".to_string(),
                    })
                    .await;
                return;
            }

            let registry = state.registry.clone();
            let lifetime = state.config().session_lifetime();
            let conn_id = conn_id.to_string();
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                forward_session(stream, &conn_id, registry, lifetime, out_tx).await;
            });
        }
        Err(JobError::CompileFailed { stdout, stderr }) => {
            let _ = out_tx
                .send(ServerEvent::CompileError {
                    error: "Compilation Error",
                    stderr,
                    stdout,
                })
                .await;
        }
        Err(e @ JobError::CompileTimeout { .. }) => {
            let _ = out_tx
                .send(ServerEvent::Error {
                    message: e.to_string(),
                })
                .await;
        }
        Err(e) => {
            warn!(conn_id, error = %e, "failed to start session");
            let _ = out_tx
                .send(ServerEvent::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }
}

async fn send_input(
    input: &str,
    conn_id: &str,
    state: &AppState,
    out_tx: &mpsc::Sender<ServerEvent>,
) {
    let Some(handle) = state.registry.lookup(conn_id).await else {
        let _ = out_tx
            .send(ServerEvent::Error {
                message: "No active process".to_string(),
            })
            .await;
        return;
    };

    if let Err(e) = handle.send_line(input).await {
        let _ = out_tx
            .send(ServerEvent::Error {
                message: e.to_string(),
            })
            .await;
    }
}

/// Relay session events to the client until the session's final event.
///
/// The registry entry is removed when the session exits on its own, so a
/// finished connection can start a fresh session.
async fn forward_session(
    mut stream: SessionStream,
    conn_id: &str,
    registry: parlab::SessionRegistry,
    lifetime: std::time::Duration,
    out_tx: mpsc::Sender<ServerEvent>,
) {
    while let Some(event) = stream.recv().await {
        let server_event = match event {
            SessionEvent::Stdout(data) => ServerEvent::Output {
                data: String::from_utf8_lossy(&data).into_owned(),
            },
            SessionEvent::Stderr(data) => ServerEvent::Stderr {
                data: String::from_utf8_lossy(&data).into_owned(),
            },
            SessionEvent::Fault(message) => ServerEvent::Error { message },
            SessionEvent::Exited(exit) => {
                registry.remove(conn_id).await;
                let (returncode, message) = match exit.reason {
                    ExitReason::Completed => (
                        exit.exit_code
                            .unwrap_or_else(|| exit.signal.map_or(-1, |s| -s)),
                        None,
                    ),
                    ExitReason::Stopped => {
                        (-1, Some("Process terminated by user".to_string()))
                    }
                    ExitReason::TimedOut => (
                        -1,
                        Some(format!(
                            "Session exceeded the {} second lifetime limit",
                            lifetime.as_secs()
                        )),
                    ),
                };
                ServerEvent::Finished {
                    returncode,
                    message,
                }
            }
        };
        if out_tx.send(server_event).await.is_err() {
            // Client is gone; keep draining so the registry entry still
            // clears on exit
            continue;
        }
    }
}
