//! Job runner
//!
//! Provides the high-level API for turning a job request into a compiled,
//! executed program: batch (compile, run to completion, one atomic result)
//! or interactive (compile, then a live session). Whatever the outcome,
//! the job's workspace is reclaimed before control returns to the caller
//! or, for interactive jobs, by the session's relay task.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use crate::runner::compile::{CompileOutcome, compile};
pub use crate::runner::execute::execute;
pub use crate::runner::interactive::{
    ExitReason, InteractiveSession, SessionEvent, SessionExit, SessionHandle, SessionStream,
};
pub use crate::runner::process::{ChildProcess, ProcessError, run_captured};

mod compile;
mod execute;
mod interactive;
mod process;

use crate::config::Config;
use crate::toolchain::Toolchain;
use crate::types::{JobRequest, JobStatus, Language, RunOutput, ValidationError};
use crate::workspace::{Workspace, WorkspaceError};

/// Errors that occur during compilation
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compilation took too long (>{} seconds)", limit.as_secs())]
    Timeout { limit: Duration },

    #[error("process error: {0}")]
    Process(#[source] ProcessError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl CompileError {
    fn from_process(e: ProcessError) -> Self {
        match e {
            ProcessError::Timeout { limit } => CompileError::Timeout { limit },
            other => CompileError::Process(other),
        }
    }
}

/// Errors that occur during batch execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Program execution took too long (>{} seconds)", limit.as_secs())]
    Timeout { limit: Duration },

    #[error("process error: {0}")]
    Process(#[source] ProcessError),
}

impl ExecuteError {
    fn from_process(e: ProcessError) -> Self {
        match e {
            ProcessError::Timeout { limit } => ExecuteError::Timeout { limit },
            other => ExecuteError::Process(other),
        }
    }
}

/// Errors that occur on the interactive input path
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active process")]
    NotRunning,
}

/// Everything that can end a job without a normal result
///
/// Preserves which stage failed so the caller can render stage-appropriate
/// feedback (compile diagnostics vs. timeout vs. infrastructure fault).
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The compiler rejected the program. Diagnostics are verbatim; they
    /// are the primary value delivered to the user on this path.
    #[error("Compilation Error")]
    CompileFailed { stdout: String, stderr: String },

    #[error("Compilation took too long (>{} seconds)", limit.as_secs())]
    CompileTimeout { limit: Duration },

    #[error("Program execution took too long (>{} seconds)", limit.as_secs())]
    RunTimeout { limit: Duration },

    #[error("process error: {0}")]
    Process(#[source] ProcessError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl From<CompileError> for JobError {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::Timeout { limit } => JobError::CompileTimeout { limit },
            CompileError::Process(p) => JobError::Process(p),
            CompileError::Workspace(w) => JobError::Workspace(w),
        }
    }
}

impl From<ExecuteError> for JobError {
    fn from(e: ExecuteError) -> Self {
        match e {
            ExecuteError::Timeout { limit } => JobError::RunTimeout { limit },
            ExecuteError::Process(p) => JobError::Process(p),
        }
    }
}

/// Result of a successful batch job
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Program standard output, complete
    pub output: String,

    /// Program standard error, complete
    pub stderr: String,

    /// Program exit code; negative signal number if killed by a signal
    pub returncode: i32,

    /// Compiler binary that built the program
    pub compiler: &'static str,

    /// Language the program was compiled as
    pub language: Language,
}

/// Compile-stage result of a freshly started interactive session
#[derive(Debug, Clone, Copy)]
pub struct CompiledInfo {
    /// Compiler binary that built the program
    pub compiler: &'static str,
}

/// High-level runner for compile+execute jobs
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a batch job: compile, execute to completion, reclaim.
    ///
    /// The workspace is removed on every exit path before this returns;
    /// a failed run can never leak filesystem state.
    #[instrument(skip(self, request), fields(mode = %request.mode, language = %request.language))]
    pub async fn submit(&self, request: &JobRequest) -> Result<BatchReport, JobError> {
        request.validate()?;

        let toolchain = Toolchain::select(request.mode, request.language);
        let mut status = JobStatus::Pending;
        let mut workspace = Workspace::create(&self.config.workspace_root()).await?;

        advance(&mut status, JobStatus::Compiling);
        let outcome = match compile(
            &workspace,
            toolchain,
            request.code.as_bytes(),
            self.config.compile_timeout(),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                reclaim(&mut workspace).await;
                return Err(e.into());
            }
        };

        if !outcome.success {
            advance(&mut status, JobStatus::CompileFailed);
            reclaim(&mut workspace).await;
            return Err(JobError::CompileFailed {
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }

        advance(&mut status, JobStatus::Running);
        let run: RunOutput = match execute(
            toolchain,
            &outcome.artifact,
            request.workers,
            self.config.run_timeout(request.mode),
        )
        .await
        {
            Ok(run) => run,
            Err(e) => {
                if matches!(e, ExecuteError::Timeout { .. }) {
                    advance(&mut status, JobStatus::TimedOut);
                }
                reclaim(&mut workspace).await;
                return Err(e.into());
            }
        };

        advance(&mut status, JobStatus::Completed);
        reclaim(&mut workspace).await;

        // Mirror the launcher convention: killed-by-signal surfaces as a
        // negative return code.
        let returncode = run
            .exit_code
            .unwrap_or_else(|| run.signal.map_or(-1, |s| -s));

        Ok(BatchReport {
            output: run.stdout,
            stderr: run.stderr,
            returncode,
            compiler: toolchain.compiler(),
            language: request.language,
        })
    }

    /// Compile a job and start it as an interactive session.
    ///
    /// On compile failure the workspace is removed and the diagnostics
    /// returned. On success the returned session owns the workspace; its
    /// relay task removes it when the session ends, however it ends.
    #[instrument(skip(self, request), fields(mode = %request.mode, language = %request.language))]
    pub async fn start_session(
        &self,
        request: &JobRequest,
    ) -> Result<(CompiledInfo, InteractiveSession), JobError> {
        request.validate()?;

        let toolchain = Toolchain::select(request.mode, request.language);
        let mut workspace = Workspace::create(&self.config.workspace_root()).await?;

        let outcome = match compile(
            &workspace,
            toolchain,
            request.code.as_bytes(),
            self.config.compile_timeout(),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                reclaim(&mut workspace).await;
                return Err(e.into());
            }
        };

        if !outcome.success {
            reclaim(&mut workspace).await;
            return Err(JobError::CompileFailed {
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }

        let command = toolchain.run_command(&outcome.artifact, request.workers);
        let env = toolchain.run_env(request.workers);
        let process = match ChildProcess::spawn(&command, &env) {
            Ok(process) => process,
            Err(e) => {
                reclaim(&mut workspace).await;
                return Err(JobError::Process(e));
            }
        };

        debug!(compiler = toolchain.compiler(), "interactive session started");

        Ok((
            CompiledInfo {
                compiler: toolchain.compiler(),
            },
            InteractiveSession::new(process, workspace, self.config.session_lifetime()),
        ))
    }
}

fn advance(status: &mut JobStatus, next: JobStatus) {
    debug_assert!(
        status.can_advance_to(next),
        "illegal job transition {status:?} -> {next:?}"
    );
    *status = next;
}

async fn reclaim(workspace: &mut Workspace) {
    if let Err(e) = workspace.remove().await {
        warn!(error = %e, "failed to reclaim workspace");
    }
}
