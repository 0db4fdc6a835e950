//! A library for compiling and running parallel C/C++ programs.
//!
//! Parlab provides an async Rust API for turning untrusted C/C++ source
//! into an isolated build+run job: OpenMP (shared-memory) or MPI (message
//! passing) builds, batch execution under hard timeouts, and live
//! interactive sessions with stdin forwarding. Every job gets an exclusive
//! workspace directory that is reclaimed on every exit path.
//!
//! # Features
//!
//! - **Bounded execution** — per-stage wall-clock budgets with whole
//!   process-tree termination on expiry.
//! - **Two parallel modes** — OpenMP thread-count and MPI rank-count
//!   plumbing, worker counts capped at 16.
//! - **Interactive sessions** — per-session relay task streaming stdout
//!   and stderr as separate channels, with asynchronous stdin writes and
//!   idempotent teardown.
//! - **Guaranteed reclamation** — synchronous workspace removal at job
//!   end, plus a periodic sweep for crash/leak paths.
//! - **TOML configuration** — timeouts, workspace root, and policy knobs.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG};
pub use registry::{AlreadyActive, SessionRegistry};
pub use runner::{
    BatchReport, CompileError, CompileOutcome, CompiledInfo, ExecuteError, ExitReason,
    InteractiveSession, JobError, ProcessError, Runner, SessionError, SessionEvent, SessionExit,
    SessionHandle, SessionStream,
};
pub use toolchain::Toolchain;
pub use types::{
    ExecMode, JobRequest, JobStatus, Language, RunOutput, ValidationError, WorkerCount,
};
pub use workspace::{Workspace, WorkspaceError, sweep_stale};

pub mod catalog;
pub mod config;
pub mod mismatch;
pub mod probe;
pub mod registry;
pub mod runner;
pub mod toolchain;
pub mod types;
pub mod workspace;
