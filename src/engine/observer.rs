// src/engine/observer.rs

//! Observers of a batch run (UI, queue/timeline, logs).

use std::io::{self, Write};

use crate::engine::{BatchState, TaskStatus};

/// Receives the batch state after every transition plus lifecycle signals.
///
/// All methods default to no-ops so observers only implement what they use.
pub trait BatchObserver: Send {
    fn on_state(&mut self, _state: &BatchState) {}

    /// The batch ran to the end; `completion_message` is set.
    fn on_completed(&mut self, _state: &BatchState) {}

    /// The batch failed, either before any task ran or on a critical task.
    fn on_error(&mut self, _message: &str) {}

    /// The batch was cancelled while `operation` was in progress.
    fn on_aborted(&mut self, _operation: &str) {}
}

/// Line-oriented observer used by the `execbatch` binary.
///
/// It prints status changes only; streamed output tails are shown for
/// failed tasks.
#[derive(Debug)]
pub struct ConsoleObserver<W: Write + Send = io::Stdout> {
    out: W,
    /// Set by the lifecycle signals; the next state starts a new batch.
    batch_over: bool,
    last_status: Vec<TaskStatus>,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            batch_over: true,
            last_status: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> BatchObserver for ConsoleObserver<W> {
    fn on_state(&mut self, state: &BatchState) {
        if self.batch_over || self.last_status.len() != state.tasks.len() {
            self.batch_over = false;
            self.last_status = vec![TaskStatus::Pending; state.tasks.len()];
            if !state.intro_message.trim().is_empty() {
                let _ = writeln!(self.out, "{}", state.intro_message.trim());
            }
        }

        for (i, task) in state.tasks.iter().enumerate() {
            if self.last_status[i] == task.status {
                continue;
            }
            self.last_status[i] = task.status;

            let _ = match task.status {
                TaskStatus::Pending => Ok(()),
                TaskStatus::Running => {
                    writeln!(self.out, "> {}\n  $ {}", task.label, task.command)
                }
                TaskStatus::Success => writeln!(
                    self.out,
                    "  done: {} ({})",
                    task.label,
                    super::format_duration(task.elapsed_ms)
                ),
                TaskStatus::Failed => {
                    let _ = writeln!(
                        self.out,
                        "  failed: {}: {}",
                        task.label,
                        task.error.as_deref().unwrap_or("")
                    );
                    for line in &task.stderr_tail {
                        let _ = writeln!(self.out, "    {line}");
                    }
                    Ok(())
                }
                TaskStatus::Aborted => writeln!(self.out, "  aborted: {}", task.label),
                TaskStatus::Cancelled => writeln!(self.out, "  cancelled: {}", task.label),
            };
        }
    }

    fn on_completed(&mut self, state: &BatchState) {
        if let Some(message) = &state.completion_message {
            let _ = writeln!(self.out, "{message}");
        }
        self.batch_over = true;
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "Error: {message}");
        self.batch_over = true;
    }

    fn on_aborted(&mut self, operation: &str) {
        let _ = writeln!(self.out, "Cancelled {operation}.");
        self.batch_over = true;
    }
}
