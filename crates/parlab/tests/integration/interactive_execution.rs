use std::time::Duration;

use parlab::{ExecMode, ExitReason, Language, SessionEvent, SessionStream};

use super::{ECHO_ONCE, INFINITE_LOOP, request};

async fn next_event(stream: &mut SessionStream) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(10), stream.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("stream closed unexpectedly")
}

#[tokio::test]
async fn echo_session_round_trip() {
    let runner = super::test_runner();
    let (info, session) = runner
        .start_session(&request(ECHO_ONCE, ExecMode::OpenMp, Language::C))
        .await
        .expect("session failed to start");
    assert_eq!(info.compiler, "gcc");

    let (mut stream, handle) = session.into_stream();
    handle.send_line("forty-two").await.unwrap();

    // The echoed text must arrive in an output event before the finished
    // event
    let mut output = String::new();
    let exit = loop {
        match next_event(&mut stream).await {
            SessionEvent::Stdout(data) => output.push_str(&String::from_utf8_lossy(&data)),
            SessionEvent::Exited(exit) => break exit,
            SessionEvent::Stderr(_) | SessionEvent::Fault(_) => {}
        }
    };

    assert!(output.contains("echo: forty-two"));
    assert_eq!(exit.exit_code, Some(0));
    assert_eq!(exit.reason, ExitReason::Completed);
}

#[tokio::test]
async fn stop_aborts_a_running_session() {
    let runner = super::test_runner();
    let (_info, session) = runner
        .start_session(&request(INFINITE_LOOP, ExecMode::OpenMp, Language::C))
        .await
        .expect("session failed to start");

    let (mut stream, handle) = session.into_stream();
    handle.terminate();

    let exit = loop {
        match next_event(&mut stream).await {
            SessionEvent::Exited(exit) => break exit,
            _ => {}
        }
    };
    assert_eq!(exit.reason, ExitReason::Stopped);

    // Stop-then-disconnect arrives as a second terminate; it must be a
    // no-op, not a double teardown
    handle.terminate();
    assert!(stream.recv().await.is_none());
}

#[tokio::test]
async fn compile_error_ends_the_session_before_it_starts() {
    let runner = super::test_runner();
    let result = runner
        .start_session(&request(super::BROKEN, ExecMode::OpenMp, Language::C))
        .await;

    match result {
        Err(parlab::JobError::CompileFailed { stderr, .. }) => {
            assert!(stderr.contains("error"));
        }
        other => panic!("expected CompileFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn session_lifetime_cap_is_enforced() {
    let mut config = super::test_config();
    config.session_lifetime_secs = 1;
    let runner = parlab::Runner::new(config);

    let (_info, session) = runner
        .start_session(&request(INFINITE_LOOP, ExecMode::OpenMp, Language::C))
        .await
        .expect("session failed to start");

    let (mut stream, _handle) = session.into_stream();
    let exit = loop {
        match next_event(&mut stream).await {
            SessionEvent::Exited(exit) => break exit,
            _ => {}
        }
    };
    assert_eq!(exit.reason, ExitReason::TimedOut);
}
