//! Workspace-reclamation guarantees: whatever the outcome, a job's
//! workspace directory does not exist after the job reaches a terminal
//! state.

use parlab::{ExecMode, Language, Runner, sweep_stale};

use super::{BROKEN, INFINITE_LOOP, PARALLEL_SUM, request, test_config};

fn workspace_count(root: &std::path::Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn success_leaves_no_workspace() {
    let config = test_config();
    let root = config.workspace_root();
    let runner = Runner::new(config);

    runner
        .submit(&request(PARALLEL_SUM, ExecMode::OpenMp, Language::C))
        .await
        .expect("job failed");

    assert_eq!(workspace_count(&root), 0);
}

#[tokio::test]
async fn compile_failure_leaves_no_workspace() {
    let config = test_config();
    let root = config.workspace_root();
    let runner = Runner::new(config);

    let result = runner
        .submit(&request(BROKEN, ExecMode::OpenMp, Language::C))
        .await;
    assert!(result.is_err());

    assert_eq!(workspace_count(&root), 0);
}

#[tokio::test]
async fn timeout_leaves_no_workspace() {
    let mut config = test_config();
    config.run_timeout_secs = 1;
    let root = config.workspace_root();
    let runner = Runner::new(config);

    let result = runner
        .submit(&request(INFINITE_LOOP, ExecMode::OpenMp, Language::C))
        .await;
    assert!(result.is_err());

    assert_eq!(workspace_count(&root), 0);
}

#[tokio::test]
async fn interactive_end_leaves_no_workspace() {
    let config = test_config();
    let root = config.workspace_root();
    let runner = Runner::new(config);

    let (_info, session) = runner
        .start_session(&request(INFINITE_LOOP, ExecMode::OpenMp, Language::C))
        .await
        .expect("session failed to start");
    assert_eq!(workspace_count(&root), 1);

    let (mut stream, handle) = session.into_stream();
    handle.terminate();
    while stream.recv().await.is_some() {}

    assert_eq!(workspace_count(&root), 0);
}

#[tokio::test]
async fn sweep_reclaims_leaked_workspaces() {
    let config = test_config();
    let root = config.workspace_root();

    // Simulate a leak: directories under the root that no live job owns
    std::fs::create_dir_all(root.join("leaked-a")).unwrap();
    std::fs::create_dir_all(root.join("leaked-b")).unwrap();

    let removed = sweep_stale(&root, std::time::Duration::ZERO).await;
    assert_eq!(removed, 2);
    assert_eq!(workspace_count(&root), 0);
}
