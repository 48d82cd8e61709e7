// tests/process_backend.rs

#![cfg(unix)]

mod common;
use crate::common::builders::CommandBuilder;
use crate::common::{CallLog, init_tracing, with_timeout};

use std::error::Error;

use tempfile::TempDir;
use tokio::sync::mpsc;

use execbatch::engine::TaskOutcome;
use execbatch::exec::{
    ExecutionStatus, OutputStream, ProcessBackend, RunnerOptions, ShellBackend, TaskRunner,
};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn stdout_is_streamed_and_captured() -> TestResult {
    init_tracing();

    let command = CommandBuilder::new("greet", "printf 'one\\ntwo\\n'").build();
    let (tx, mut rx) = mpsc::channel(16);

    let result = with_timeout(ProcessBackend::new().execute(&command, 0, tx)).await?;

    assert_eq!(result.result, ExecutionStatus::Success);
    assert_eq!(result.output, "one\ntwo\n");
    assert_eq!(result.errors, "");
    assert_eq!(result.error, None);

    let mut streamed = String::new();
    while let Some(chunk) = rx.recv().await {
        assert_eq!(chunk.stream, OutputStream::Stdout);
        streamed.push_str(&chunk.text);
    }
    assert_eq!(streamed, "one\ntwo\n");

    Ok(())
}

#[tokio::test]
async fn non_zero_exit_fails_with_stderr_message() -> TestResult {
    let command = CommandBuilder::new("broken", "echo oops >&2; exit 3").build();
    let mut log = CallLog::default();

    let outcome = with_timeout(
        TaskRunner::new(ProcessBackend::new(), RunnerOptions::default()).run(0, &command, &mut log),
    )
    .await;

    match outcome {
        TaskOutcome::Failed { error, .. } => assert_eq!(error, "oops"),
        other => panic!("expected failure, got {other:?}"),
    }

    let (tx, _rx) = mpsc::channel(16);
    let result = ProcessBackend::new().execute(&command, 0, tx).await?;
    assert_eq!(result.error.as_deref(), Some("Command exited with code 3"));

    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_process() -> TestResult {
    let command = CommandBuilder::new("hang", "sleep 5").timeout_ms(100).build();
    let (tx, _rx) = mpsc::channel(16);

    let started = std::time::Instant::now();
    let result = with_timeout(ProcessBackend::new().execute(&command, 0, tx)).await?;

    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    assert_eq!(result.result, ExecutionStatus::Error);
    assert_eq!(
        result.error.as_deref(),
        Some("Command timed out after 100 ms")
    );

    Ok(())
}

#[tokio::test]
async fn working_directory_is_honoured() -> TestResult {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("marker.txt"), "here")?;

    let command = CommandBuilder::new("list", "cat marker.txt")
        .working_directory(dir.path())
        .build();
    let (tx, _rx) = mpsc::channel(16);

    let result = with_timeout(ProcessBackend::new().execute(&command, 0, tx)).await?;

    assert_eq!(result.result, ExecutionStatus::Success);
    assert_eq!(result.output, "here");
    assert_eq!(result.working_directory, Some(dir.path().to_path_buf()));

    Ok(())
}

#[tokio::test]
async fn missing_working_directory_is_a_backend_error() {
    let command = CommandBuilder::new("nowhere", "true")
        .working_directory("/definitely/not/a/real/dir")
        .build();
    let (tx, _rx) = mpsc::channel(16);

    let result = ProcessBackend::new().execute(&command, 0, tx).await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("nowhere"), "{err:#}");
}
