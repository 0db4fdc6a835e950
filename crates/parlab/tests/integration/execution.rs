use std::time::{Duration, Instant};

use parlab::{ExecMode, JobError, Language, Runner, WorkerCount};

use super::{BROKEN, INFINITE_LOOP, MIXED_STREAMS, MPI_RANKS, PARALLEL_SUM, request, test_config};

#[tokio::test]
async fn parallel_sum_round_trip() {
    let runner = super::test_runner();
    let req = request(PARALLEL_SUM, ExecMode::OpenMp, Language::C);
    assert_eq!(req.workers.get(), 4);

    let report = runner.submit(&req).await.expect("job failed");
    assert_eq!(report.returncode, 0);
    assert!(report.output.contains("sum=500500"));
    assert_eq!(report.compiler, "gcc");
    assert_eq!(report.language, Language::C);
}

#[tokio::test]
async fn compile_failure_reports_stage_and_diagnostics() {
    let runner = super::test_runner();
    let result = runner
        .submit(&request(BROKEN, ExecMode::OpenMp, Language::C))
        .await;

    match result {
        Err(JobError::CompileFailed { stderr, .. }) => {
            assert!(!stderr.is_empty());
            assert!(stderr.contains("error"));
        }
        other => panic!("expected CompileFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_is_a_normal_result() {
    let runner = super::test_runner();
    let report = runner
        .submit(&request(MIXED_STREAMS, ExecMode::OpenMp, Language::C))
        .await
        .expect("job failed");

    assert_eq!(report.returncode, 3);
    assert_eq!(report.output, "to stdout\n");
    assert_eq!(report.stderr, "to stderr\n");
}

#[tokio::test]
async fn infinite_loop_times_out_within_budget() {
    let mut config = test_config();
    config.run_timeout_secs = 1;
    let runner = Runner::new(config);

    let started = Instant::now();
    let result = runner
        .submit(&request(INFINITE_LOOP, ExecMode::OpenMp, Language::C))
        .await;

    match result {
        Err(JobError::RunTimeout { .. }) => {}
        other => panic!("expected RunTimeout, got {other:?}"),
    }
    // Budget plus a small margin; compilation dominates the rest
    assert!(started.elapsed() < Duration::from_secs(15));
}

#[tokio::test]
async fn worker_count_reaches_the_runtime() {
    let runner = super::test_runner();
    let source = r#"
#include <stdio.h>
#include <stdlib.h>

int main() {
    printf("threads=%s\n", getenv("OMP_NUM_THREADS"));
    return 0;
}
"#;
    let mut req = request(source, ExecMode::OpenMp, Language::C);
    req.workers = WorkerCount::resolve(7);

    let report = runner.submit(&req).await.expect("job failed");
    assert!(report.output.contains("threads=7"));
}

#[tokio::test]
#[ignore = "requires MPI toolchain"]
async fn mpi_job_runs_one_process_per_worker() {
    let runner = super::test_runner();
    let mut req = request(MPI_RANKS, ExecMode::Mpi, Language::C);
    req.workers = WorkerCount::resolve(2);

    let report = runner.submit(&req).await.expect("job failed");
    assert_eq!(report.returncode, 0);
    assert_eq!(report.compiler, "mpicc");
    assert!(report.output.contains("rank 0"));
    assert!(report.output.contains("rank 1"));
}
