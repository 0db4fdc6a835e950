//! HTTP endpoints and request/response types
//!
//! Thin boundary over the library: parse and validate the request before
//! any workspace exists, call the runner, map each failure stage to its
//! own status code so the client can render stage-appropriate feedback.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use parlab::{
    ExecMode, JobError, JobRequest, Language, ValidationError, WorkerCount, mismatch, probe,
};

use crate::state::AppState;

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/compile", post(submit))
        .route("/examples", get(examples))
        .route("/health", get(health))
        .route("/ws", get(crate::ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        // The browser frontend is served from elsewhere
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Job submission fields, shared by `/compile` and the WebSocket `start`
/// event.
///
/// `mode` and `language` arrive as plain strings so that an invalid value
/// is a validation failure with guidance, not a deserialization rejection.
/// `threads` accepts any JSON value; anything non-numeric falls back to
/// the default rather than erroring.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub threads: Option<Value>,
}

impl SubmitRequest {
    /// Validate and convert into a library job request.
    ///
    /// Runs entirely before any workspace is created.
    pub fn into_job(self, language_screen: bool) -> Result<JobRequest, ValidationError> {
        if self.code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }

        let mode = match self.mode.as_deref() {
            None => ExecMode::default(),
            Some(s) => ExecMode::from_str(s)?,
        };
        let language = match self.language.as_deref() {
            None => Language::default(),
            Some(s) => Language::from_str(s)?,
        };

        if language_screen
            && let Some(advice) = mismatch::screen(&self.code, language)
        {
            return Err(ValidationError::LanguageMismatch {
                advice: advice.to_string(),
            });
        }

        Ok(JobRequest {
            code: self.code,
            mode,
            language,
            workers: resolve_workers(self.threads.as_ref()),
        })
    }
}

fn resolve_workers(value: Option<&Value>) -> WorkerCount {
    let requested = value.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    });
    match requested {
        Some(n) => WorkerCount::resolve(n),
        None => WorkerCount::default(),
    }
}

#[derive(Debug, Serialize)]
struct SubmitSuccess {
    success: bool,
    output: String,
    stderr: String,
    returncode: i32,
    compiler: &'static str,
    language: Language,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<String>,
}

impl FailureBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            stderr: None,
            stdout: None,
        }
    }

    fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }
}

async fn submit(State(state): State<AppState>, Json(req): Json<SubmitRequest>) -> Response {
    let job = match req.into_job(state.config().language_screen) {
        Ok(job) => job,
        Err(e) => return validation_response(e),
    };

    match state.runner.submit(&job).await {
        Ok(report) => (
            StatusCode::OK,
            Json(SubmitSuccess {
                success: true,
                output: report.output,
                stderr: report.stderr,
                returncode: report.returncode,
                compiler: report.compiler,
                language: report.language,
            }),
        )
            .into_response(),
        Err(e) => job_error_response(e),
    }
}

fn validation_response(e: ValidationError) -> Response {
    let body = match e {
        ValidationError::LanguageMismatch { ref advice } => {
            FailureBody::new("Language Mismatch").with_stderr(advice.clone())
        }
        ref other => FailureBody::new(other.to_string()),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn job_error_response(e: JobError) -> Response {
    match e {
        // Compiler diagnostics are a normal result for the caller, not a
        // server failure
        JobError::CompileFailed { stdout, stderr } => (
            StatusCode::OK,
            Json(
                FailureBody::new("Compilation Error")
                    .with_stderr(stderr)
                    .with_stdout(stdout),
            ),
        )
            .into_response(),
        e @ (JobError::CompileTimeout { .. } | JobError::RunTimeout { .. }) => (
            StatusCode::REQUEST_TIMEOUT,
            Json(FailureBody::new("Timeout").with_stderr(e.to_string())),
        )
            .into_response(),
        JobError::Validation(v) => validation_response(v),
        other => {
            error!(error = %other, "job failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureBody::new("Internal Server Error").with_stderr(other.to_string())),
            )
                .into_response()
        }
    }
}

async fn examples() -> Json<serde_json::Map<String, Value>> {
    let map = parlab::catalog::examples()
        .iter()
        .map(|(name, source)| (name.to_string(), Value::String(source.to_string())))
        .collect();
    Json(map)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    gcc_available: bool,
    gcc_version: Option<String>,
    gpp_available: bool,
    gpp_version: Option<String>,
    mpi_available: bool,
    mpi_version: Option<String>,
    mpicxx_available: bool,
    mpicxx_version: Option<String>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = probe::probe_toolchains(state.config().probe_timeout()).await;
    Json(HealthResponse {
        status: "ok",
        gcc_available: report.gcc.available,
        gcc_version: report.gcc.version,
        gpp_available: report.gpp.available,
        gpp_version: report.gpp.version,
        mpi_available: report.mpicc.available,
        mpi_version: report.mpicc.version,
        mpicxx_available: report.mpicxx.available,
        mpicxx_version: report.mpicxx.version,
    })
}
