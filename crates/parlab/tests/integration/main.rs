//! Integration tests for parlab
//!
//! These tests require the native toolchains (gcc, and for the ignored
//! cases mpicc) to be installed. Run with:
//!    cargo test -p parlab --features integration-tests
//!
//! Tests that need the MPI toolchain are marked `#[ignore]`. To include
//! them:
//!    cargo test -p parlab --features integration-tests -- --include-ignored

#![cfg(feature = "integration-tests")]

use parlab::{Config, ExecMode, JobRequest, Language, Runner, WorkerCount};

mod compilation;
mod execution;
mod interactive_execution;
mod lifecycle;

/// A config pointing at a test-unique workspace root
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.workspace_root = Some(
        std::env::temp_dir()
            .join("parlab-it")
            .join(uuid::Uuid::new_v4().to_string()),
    );
    config
}

pub(crate) fn test_runner() -> Runner {
    Runner::new(test_config())
}

pub(crate) fn request(code: &str, mode: ExecMode, language: Language) -> JobRequest {
    JobRequest {
        code: code.to_string(),
        mode,
        language,
        workers: WorkerCount::resolve(4),
    }
}

// Test programs

/// Parallel-sums 1..=1000 and prints the result
pub(crate) const PARALLEL_SUM: &str = r#"
#include <stdio.h>
#include <omp.h>

int main() {
    int sum = 0;
    #pragma omp parallel for reduction(+:sum)
    for (int i = 1; i <= 1000; i++) {
        sum += i;
    }
    printf("sum=%d\n", sum);
    return 0;
}
"#;

/// Missing semicolon: must not compile
pub(crate) const BROKEN: &str = r#"
#include <stdio.h>

int main() {
    printf("hello")
    return 0;
}
"#;

/// Never returns
pub(crate) const INFINITE_LOOP: &str = r#"
int main() {
    for (;;) {}
    return 0;
}
"#;

/// Reads one line from stdin and echoes it back
pub(crate) const ECHO_ONCE: &str = r#"
#include <stdio.h>
#include <string.h>

int main() {
    char line[256];
    if (fgets(line, sizeof line, stdin) == NULL) {
        return 1;
    }
    line[strcspn(line, "\n")] = '\0';
    printf("echo: %s\n", line);
    fflush(stdout);
    return 0;
}
"#;

/// Writes to both streams and exits non-zero
pub(crate) const MIXED_STREAMS: &str = r#"
#include <stdio.h>

int main() {
    printf("to stdout\n");
    fprintf(stderr, "to stderr\n");
    return 3;
}
"#;

/// MPI rank report
pub(crate) const MPI_RANKS: &str = r#"
#include <mpi.h>
#include <stdio.h>

int main(int argc, char **argv) {
    MPI_Init(&argc, &argv);
    int rank = 0;
    MPI_Comm_rank(MPI_COMM_WORLD, &rank);
    printf("rank %d\n", rank);
    MPI_Finalize();
    return 0;
}
"#;
