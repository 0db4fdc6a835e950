use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source language of a submitted program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    /// C, compiled with gcc / mpicc
    #[default]
    #[serde(rename = "c")]
    C,

    /// C++, compiled with g++ / mpicxx
    #[serde(rename = "cpp")]
    Cpp,
}

impl Language {
    /// Source file name inside the workspace for this language
    pub fn source_name(&self) -> &'static str {
        match self {
            Language::C => "program.c",
            Language::Cpp => "program.cpp",
        }
    }

    /// The wire word for this language ("c" / "cpp")
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(Language::C),
            "cpp" => Ok(Language::Cpp),
            other => Err(ValidationError::InvalidLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parallel execution mode of a submitted program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecMode {
    /// Shared-memory parallelism (OpenMP pragmas, single process)
    #[default]
    #[serde(rename = "openmp")]
    OpenMp,

    /// Message passing (MPI, one process per worker via mpirun)
    #[serde(rename = "mpi")]
    Mpi,
}

impl ExecMode {
    /// The wire word for this mode ("openmp" / "mpi")
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecMode::OpenMp => "openmp",
            ExecMode::Mpi => "mpi",
        }
    }
}

impl FromStr for ExecMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openmp" => Ok(ExecMode::OpenMp),
            "mpi" => Ok(ExecMode::Mpi),
            other => Err(ValidationError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of workers (OpenMP threads or MPI ranks), always in [1, 16]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCount(u32);

impl WorkerCount {
    /// Upper bound on workers per job
    pub const MAX: u32 = 16;

    /// Worker count used when the request doesn't specify a usable value
    pub const DEFAULT: u32 = 4;

    /// Resolve a requested worker count.
    ///
    /// Values below 1 fall back to the default (a request for zero or
    /// negative workers is treated as "unspecified", not as "one");
    /// values above [`Self::MAX`] clamp to it.
    pub fn resolve(requested: i64) -> Self {
        if requested < 1 {
            Self(Self::DEFAULT)
        } else if requested > i64::from(Self::MAX) {
            Self(Self::MAX)
        } else {
            Self(requested as u32)
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One compile+execute request
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Source text to compile
    pub code: String,

    /// Parallel execution mode
    pub mode: ExecMode,

    /// Source language
    pub language: Language,

    /// Worker count for the run stage
    pub workers: WorkerCount,
}

impl JobRequest {
    /// Validate the request before any workspace is created
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        Ok(())
    }
}

/// Lifecycle state of a job
///
/// Transitions move strictly forward; a job never returns to an earlier
/// state. The four terminal states release all resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Compiling,
    CompileFailed,
    Running,
    Completed,
    TimedOut,
    Aborted,
}

impl JobStatus {
    /// Check whether this state ends the job
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::CompileFailed
                | JobStatus::Completed
                | JobStatus::TimedOut
                | JobStatus::Aborted
        )
    }

    /// Check whether `next` is a legal forward transition from this state
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Compiling)
                | (Compiling, CompileFailed)
                | (Compiling, Running)
                | (Running, Completed)
                | (Running, TimedOut)
                | (Running, Aborted)
        )
    }
}

/// Captured result of running a program to completion
///
/// A non-zero exit code is a normal result here, not an error: the caller
/// is debugging their own program and gets the output either way.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Complete standard output
    pub stdout: String,

    /// Complete standard error
    pub stderr: String,

    /// Exit code if the program exited normally
    pub exit_code: Option<i32>,

    /// Signal number if the program was killed by a signal
    pub signal: Option<i32>,
}

impl RunOutput {
    /// Check whether the program exited with code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Request rejection before any workspace or process exists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No code provided")]
    EmptyCode,

    #[error("Invalid mode '{0}'. Use \"openmp\" or \"mpi\".")]
    InvalidMode(String),

    #[error("Invalid language '{0}'. Use \"c\" or \"cpp\".")]
    InvalidLanguage(String),

    #[error("Language Mismatch")]
    LanguageMismatch {
        /// Guidance for the user on how to fix the submission
        advice: String,
    },
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn worker_count_always_in_range(requested in any::<i64>()) {
            let resolved = WorkerCount::resolve(requested).get();
            prop_assert!((1..=WorkerCount::MAX).contains(&resolved));
        }

        #[test]
        fn worker_count_identity_in_range(requested in 1i64..=16) {
            prop_assert_eq!(WorkerCount::resolve(requested).get() as i64, requested);
        }

        #[test]
        fn language_parse_never_panics(s in ".*") {
            let _ = Language::from_str(&s);
        }

        #[test]
        fn mode_parse_never_panics(s in ".*") {
            let _ = ExecMode::from_str(&s);
        }
    }
}
