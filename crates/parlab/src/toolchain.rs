//! Toolchain selection for parallel C/C++ builds
//!
//! Maps an (execution mode, language) pair to the compiler invocation and
//! the run command template. Pure mapping, no side effects; the caller is
//! responsible for validating mode and language before reaching this stage.

use std::path::Path;

use crate::types::{ExecMode, Language, WorkerCount};

/// Artifact name inside the workspace
pub const ARTIFACT_NAME: &str = "program";

/// Resolved toolchain for one (mode, language) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolchain {
    mode: ExecMode,
    language: Language,
}

impl Toolchain {
    /// Select the toolchain for a mode/language pair
    pub fn select(mode: ExecMode, language: Language) -> Self {
        Self { mode, language }
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Name of the compiler binary this toolchain invokes
    pub fn compiler(&self) -> &'static str {
        match (self.mode, self.language) {
            (ExecMode::OpenMp, Language::C) => "gcc",
            (ExecMode::OpenMp, Language::Cpp) => "g++",
            (ExecMode::Mpi, Language::C) => "mpicc",
            (ExecMode::Mpi, Language::Cpp) => "mpicxx",
        }
    }

    /// Build the compile command for a source/artifact path pair.
    ///
    /// OpenMP builds enable the parallel-for pragmas; every build links the
    /// math library; C++ builds pin the language standard and enable
    /// strict-conformance warnings.
    pub fn compile_command(&self, source: &Path, artifact: &Path) -> Vec<String> {
        let mut cmd = vec![self.compiler().to_string()];
        if self.mode == ExecMode::OpenMp {
            cmd.push("-fopenmp".to_string());
        }
        cmd.push(source.to_string_lossy().into_owned());
        cmd.push("-o".to_string());
        cmd.push(artifact.to_string_lossy().into_owned());
        cmd.push("-lm".to_string());
        if self.language == Language::Cpp {
            cmd.push("-std=c++17".to_string());
            cmd.push("-pedantic".to_string());
        }
        cmd
    }

    /// Build the run command for a compiled artifact.
    ///
    /// OpenMP artifacts run directly; MPI artifacts go through the process
    /// launcher with the resolved worker count. Oversubscription is allowed
    /// so worker counts above the core count still start.
    pub fn run_command(&self, artifact: &Path, workers: WorkerCount) -> Vec<String> {
        match self.mode {
            ExecMode::OpenMp => vec![artifact.to_string_lossy().into_owned()],
            ExecMode::Mpi => vec![
                "mpirun".to_string(),
                "--allow-run-as-root".to_string(),
                "--oversubscribe".to_string(),
                "-np".to_string(),
                workers.to_string(),
                artifact.to_string_lossy().into_owned(),
            ],
        }
    }

    /// Environment variables for the run stage.
    ///
    /// OpenMP consumes the worker count through its runtime variable; MPI
    /// needs the run-as-root allowances when the service runs as a
    /// privileged user inside a container.
    pub fn run_env(&self, workers: WorkerCount) -> Vec<(String, String)> {
        match self.mode {
            ExecMode::OpenMp => vec![("OMP_NUM_THREADS".to_string(), workers.to_string())],
            ExecMode::Mpi => vec![
                ("OMPI_ALLOW_RUN_AS_ROOT".to_string(), "1".to_string()),
                ("OMPI_ALLOW_RUN_AS_ROOT_CONFIRM".to_string(), "1".to_string()),
            ],
        }
    }
}
