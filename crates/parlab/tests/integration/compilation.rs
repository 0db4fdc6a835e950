use parlab::runner::compile;
use parlab::{ExecMode, Language, Toolchain, Workspace};

use super::{BROKEN, PARALLEL_SUM, test_config};

#[tokio::test]
async fn compile_success_produces_artifact() {
    let config = test_config();
    let mut workspace = Workspace::create(&config.workspace_root()).await.unwrap();
    let toolchain = Toolchain::select(ExecMode::OpenMp, Language::C);

    let outcome = compile(
        &workspace,
        toolchain,
        PARALLEL_SUM.as_bytes(),
        config.compile_timeout(),
    )
    .await
    .expect("compile invocation failed");

    assert!(outcome.success);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.artifact.exists());

    workspace.remove().await.unwrap();
}

#[tokio::test]
async fn compile_failure_surfaces_diagnostics() {
    let config = test_config();
    let mut workspace = Workspace::create(&config.workspace_root()).await.unwrap();
    let toolchain = Toolchain::select(ExecMode::OpenMp, Language::C);

    let outcome = compile(
        &workspace,
        toolchain,
        BROKEN.as_bytes(),
        config.compile_timeout(),
    )
    .await
    .expect("compile invocation failed");

    assert!(!outcome.success);
    assert_ne!(outcome.exit_code, Some(0));
    // The compiler names the problem; the text reaches the caller verbatim
    assert!(!outcome.stderr.is_empty());
    assert!(outcome.stderr.contains("error"));
    assert!(!outcome.artifact.exists());

    workspace.remove().await.unwrap();
}

#[tokio::test]
async fn cpp_toolchain_compiles_cpp_source() {
    let config = test_config();
    let mut workspace = Workspace::create(&config.workspace_root()).await.unwrap();
    let toolchain = Toolchain::select(ExecMode::OpenMp, Language::Cpp);

    let source = r#"
#include <iostream>
int main() {
    std::cout << "built as C++" << std::endl;
    return 0;
}
"#;
    let outcome = compile(
        &workspace,
        toolchain,
        source.as_bytes(),
        config.compile_timeout(),
    )
    .await
    .expect("compile invocation failed");

    assert!(outcome.success, "stderr: {}", outcome.stderr);

    workspace.remove().await.unwrap();
}
