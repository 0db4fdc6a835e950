//! Toolchain availability probe
//!
//! Read-only status query that asks each toolchain binary for its version.
//! Missing or broken binaries degrade to an "unavailable" report; the
//! probe itself never fails.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::runner::run_captured;

/// Availability of one toolchain binary
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub available: bool,

    /// First line of the binary's version output, if available
    pub version: Option<String>,
}

/// Availability of all four toolchain binaries
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainReport {
    pub gcc: ToolStatus,
    pub gpp: ToolStatus,
    pub mpicc: ToolStatus,
    pub mpicxx: ToolStatus,
}

/// Probe all toolchain binaries concurrently
#[instrument]
pub async fn probe_toolchains(timeout: Duration) -> ToolchainReport {
    let (gcc, gpp, mpicc, mpicxx) = tokio::join!(
        probe_one("gcc", timeout),
        probe_one("g++", timeout),
        probe_one("mpicc", timeout),
        probe_one("mpicxx", timeout),
    );
    ToolchainReport {
        gcc,
        gpp,
        mpicc,
        mpicxx,
    }
}

async fn probe_one(binary: &str, timeout: Duration) -> ToolStatus {
    let command = vec![binary.to_string(), "--version".to_string()];
    match run_captured(&command, &[], timeout).await {
        Ok(output) if output.exit_code == Some(0) => ToolStatus {
            available: true,
            version: output.stdout.lines().next().map(str::to_string),
        },
        Ok(output) => {
            debug!(binary, exit_code = ?output.exit_code, "version query failed");
            ToolStatus {
                available: false,
                version: None,
            }
        }
        Err(e) => {
            debug!(binary, error = %e, "toolchain binary unavailable");
            ToolStatus {
                available: false,
                version: None,
            }
        }
    }
}
