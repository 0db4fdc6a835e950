//! Compilation step for job execution
//!
//! Handles writing the submitted source into the workspace and invoking
//! the selected compiler under a bounded timeout. Compiler output is
//! always batched, never streamed.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::runner::CompileError;
use crate::toolchain::{ARTIFACT_NAME, Toolchain};
use crate::workspace::Workspace;

/// Result of a compilation attempt
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Whether compilation succeeded (exit code 0)
    pub success: bool,

    /// Compiler exit code, if it exited normally
    pub exit_code: Option<i32>,

    /// Compiler standard output, verbatim
    pub stdout: String,

    /// Compiler standard error, verbatim. This is the primary value
    /// delivered to a user whose program failed to compile.
    pub stderr: String,

    /// Path of the executable artifact (exists only on success)
    pub artifact: PathBuf,
}

/// Compile submitted source inside a workspace.
///
/// Writes the source file, runs the toolchain's compile command bounded by
/// `timeout`, and classifies the result. A non-zero compiler exit yields
/// `Ok` with `success: false` and the diagnostics; only timeouts and
/// infrastructure failures are errors.
#[instrument(skip(workspace, source), fields(workspace = %workspace.id()))]
pub async fn compile(
    workspace: &Workspace,
    toolchain: Toolchain,
    source: &[u8],
    timeout: Duration,
) -> Result<CompileOutcome, CompileError> {
    let source_path = workspace
        .write_file(toolchain.language().source_name(), source)
        .await?;
    let artifact = workspace.file_path(ARTIFACT_NAME);

    let command = toolchain.compile_command(&source_path, &artifact);
    debug!(?command, "compiling");

    let output = crate::runner::process::run_captured(&command, &[], timeout)
        .await
        .map_err(CompileError::from_process)?;

    let success = output.exit_code == Some(0);
    debug!(success, exit_code = ?output.exit_code, "compilation complete");

    Ok(CompileOutcome {
        success,
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        artifact,
    })
}
