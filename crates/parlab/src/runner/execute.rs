//! Batch execution step
//!
//! Runs a compiled artifact to completion with a mode-dependent timeout,
//! capturing all output as one atomic result. No partial output is ever
//! exposed on this path.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::runner::ExecuteError;
use crate::toolchain::Toolchain;
use crate::types::{RunOutput, WorkerCount};

/// Execute a compiled artifact with batch I/O.
///
/// The run command and environment come from the toolchain (direct
/// execution for shared-memory mode, the process launcher for message
/// passing). On timeout the process tree is killed and partial output
/// discarded.
#[instrument(skip(artifact))]
pub async fn execute(
    toolchain: Toolchain,
    artifact: &Path,
    workers: WorkerCount,
    timeout: Duration,
) -> Result<RunOutput, ExecuteError> {
    let command = toolchain.run_command(artifact, workers);
    let env = toolchain.run_env(workers);
    debug!(?command, workers = %workers, "executing program");

    let output = crate::runner::process::run_captured(&command, &env, timeout)
        .await
        .map_err(ExecuteError::from_process)?;

    debug!(
        exit_code = ?output.exit_code,
        signal = ?output.signal,
        "execution complete"
    );

    Ok(output)
}
