// src/exec/task_runner.rs

//! Runs a single command and reports streaming and final state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::engine::{Command, StreamSnapshot, TaskOutcome};
use crate::exec::backend::{
    ExecutionResult, ExecutionStatus, OUTPUT_CHANNEL_CAPACITY, OutputChunk, OutputStream,
    ShellBackend,
};
use crate::exec::output_buffer::OutputBuffer;
use crate::exec::throttle::Throttle;

/// Message used when a failed command left no stderr and no error.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Command failed";

/// Receives the runner's callbacks for one task.
///
/// For every run, `on_update` is called zero or more times (throttled),
/// then once more with the final output, then exactly one of `on_complete`
/// or `on_failure`.
pub trait RunReporter {
    fn on_update(&mut self, snapshot: StreamSnapshot);
    fn on_complete(&mut self, elapsed_ms: u64, snapshot: StreamSnapshot);
    fn on_failure(&mut self, error: String, snapshot: StreamSnapshot);
}

/// Tunables for [`TaskRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Lines of stdout/stderr carried in each snapshot.
    pub tail_lines: usize,
    /// Minimum interval between two throttled updates.
    pub throttle: Duration,
    /// Fast commands are held at least this long so they don't flicker.
    pub min_display: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            tail_lines: 8,
            throttle: Duration::from_millis(100),
            min_display: Duration::ZERO,
        }
    }
}

/// Executes one command at a time through a [`ShellBackend`].
///
/// The runner owns the output buffers for the duration of a single `run`
/// and never touches batch state; everything it learns goes through the
/// [`RunReporter`].
#[derive(Debug)]
pub struct TaskRunner<B> {
    backend: B,
    options: RunnerOptions,
}

impl<B: ShellBackend> TaskRunner<B> {
    pub fn new(backend: B, options: RunnerOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `command` to completion.
    ///
    /// The returned outcome mirrors the terminal callback that was fired.
    pub async fn run<R>(&self, index: usize, command: &Command, reporter: &mut R) -> TaskOutcome
    where
        R: RunReporter + ?Sized,
    {
        let started = Instant::now();
        let mut output = TaskOutput::new(self.options.tail_lines, command);
        let mut throttle = Throttle::new(self.options.throttle);

        debug!(index, task = %command.description, "runner: starting task");

        let (tx, mut rx) = mpsc::channel::<OutputChunk>(OUTPUT_CHANNEL_CAPACITY);
        let exec = self.backend.execute(command, index, tx);
        tokio::pin!(exec);

        let result = loop {
            let deadline = throttle.deadline();

            tokio::select! {
                biased;

                Some(chunk) = rx.recv() => {
                    output.push(chunk);
                    if throttle.request(Instant::now()) {
                        reporter.on_update(output.snapshot());
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    throttle.mark_emitted(Instant::now());
                    reporter.on_update(output.snapshot());
                }

                res = &mut exec => break res,
            }
        };

        // The backend's sender is gone now; pick up whatever it sent last.
        while let Ok(chunk) = rx.try_recv() {
            output.push(chunk);
        }
        throttle.cancel_pending();

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs() * 1000;

        if elapsed < self.options.min_display {
            sleep(self.options.min_display - elapsed).await;
        }

        match classify(result) {
            Ok(result) => {
                if result.working_directory.is_some() {
                    output.working_directory = result.working_directory;
                }
                info!(index, task = %command.description, elapsed_ms, "task succeeded");
                let snapshot = output.snapshot();
                reporter.on_update(snapshot.clone());
                reporter.on_complete(elapsed_ms, snapshot);
                TaskOutcome::Succeeded { elapsed_ms }
            }
            Err(message) => {
                warn!(index, task = %command.description, error = %message, "task failed");
                output.error = message.clone();
                let snapshot = output.snapshot();
                reporter.on_update(snapshot.clone());
                reporter.on_failure(message.clone(), snapshot);
                TaskOutcome::Failed {
                    error: message,
                    elapsed_ms,
                }
            }
        }
    }
}

/// Stdout/stderr buffers plus the extra fields of a snapshot.
struct TaskOutput {
    tail_lines: usize,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    error: String,
    working_directory: Option<std::path::PathBuf>,
}

impl TaskOutput {
    fn new(tail_lines: usize, command: &Command) -> Self {
        Self {
            tail_lines,
            stdout: OutputBuffer::new(),
            stderr: OutputBuffer::new(),
            error: String::new(),
            working_directory: command.working_directory.clone(),
        }
    }

    fn push(&mut self, chunk: OutputChunk) {
        match chunk.stream {
            OutputStream::Stdout => self.stdout.push(&chunk.text),
            OutputStream::Stderr => self.stderr.push(&chunk.text),
        }
    }

    fn snapshot(&mut self) -> StreamSnapshot {
        StreamSnapshot {
            stdout_tail: self.stdout.last_lines(self.tail_lines),
            stderr_tail: self.stderr.last_lines(self.tail_lines),
            error: self.error.clone(),
            working_directory: self.working_directory.clone(),
        }
    }
}

/// `Ok` for a successful run, otherwise the failure message: captured
/// stderr, then the backend's error, then [`DEFAULT_FAILURE_MESSAGE`].
fn classify(result: crate::errors::Result<ExecutionResult>) -> Result<ExecutionResult, String> {
    match result {
        Ok(r) if r.result == ExecutionStatus::Success => Ok(r),
        Ok(r) => {
            let message = [r.errors.trim(), r.error.as_deref().unwrap_or("").trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                .to_string();
            Err(message)
        }
        Err(e) => {
            let message = format!("{e:#}");
            if message.trim().is_empty() {
                Err(DEFAULT_FAILURE_MESSAGE.to_string())
            } else {
                Err(message)
            }
        }
    }
}
