// src/engine/mod.rs

//! Batch execution engine for execbatch.
//!
//! This module ties together:
//! - the data model of one batch run (commands, task records, batch state)
//! - the pure state machine that applies [`BatchEvent`]s to a [`BatchState`]
//! - the completion/failure policy that decides which events follow a task
//!   outcome
//! - the controller that drives the task runner and feeds results back
//!
//! The pure pieces live in [`state`] and [`policy`]; the async/IO shell is
//! implemented in [`controller`].

use std::path::PathBuf;
use std::time::Duration;

/// A concrete, already-resolved shell command to execute.
///
/// Immutable once a batch has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub description: String,
    pub command: String,
    pub working_directory: Option<PathBuf>,
    /// Enforced by the shell backend; surfaced as an ordinary failure.
    pub timeout: Option<Duration>,
    /// A failing critical command halts the rest of the batch.
    pub critical: bool,
}

impl Command {
    /// A critical command with no working directory or timeout.
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
            working_directory: None,
            timeout: None,
            critical: true,
        }
    }
}

/// Execution status of one task.
///
/// Transitions are one-directional:
/// `Pending -> Running -> Success | Failed`, or
/// `Pending | Running -> Cancelled | Aborted` on batch cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    /// Was running when the batch was cancelled.
    Aborted,
    /// Never started because the batch was cancelled.
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

/// Execution-time state of one [`Command`] within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub label: String,
    pub command: String,
    pub status: TaskStatus,
    pub elapsed_ms: u64,
    pub stdout_tail: Vec<String>,
    pub stderr_tail: Vec<String>,
    pub error: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub critical: bool,
}

impl TaskRecord {
    /// Fresh `Pending` record for a command, with zero elapsed time.
    pub fn pending(command: &Command) -> Self {
        Self {
            label: command.description.clone(),
            command: command.command.clone(),
            status: TaskStatus::Pending,
            elapsed_ms: 0,
            stdout_tail: Vec::new(),
            stderr_tail: Vec::new(),
            error: None,
            working_directory: command.working_directory.clone(),
            critical: command.critical,
        }
    }
}

/// Externally observable state of one execution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchState {
    pub intro_message: String,
    pub summary_template: String,
    pub tasks: Vec<TaskRecord>,
    /// Set once, after every task reached a terminal status.
    pub completion_message: Option<String>,
    pub error: Option<String>,
}

impl BatchState {
    /// Index of the task currently `Running`, if any.
    pub fn running_index(&self) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.status == TaskStatus::Running)
    }

    /// Index of the first `Pending` task, i.e. the next one to run.
    pub fn next_pending(&self) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.status == TaskStatus::Pending)
    }

    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// Whether `BatchCancelled` has touched any task.
    pub fn was_cancelled(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| matches!(t.status, TaskStatus::Aborted | TaskStatus::Cancelled))
    }

    /// Sum of every task's elapsed time.
    pub fn total_elapsed_ms(&self) -> u64 {
        self.tasks.iter().map(|t| t.elapsed_ms).sum()
    }
}

/// Throttled projection of a running task's output, handed to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub stdout_tail: Vec<String>,
    pub stderr_tail: Vec<String>,
    pub error: String,
    pub working_directory: Option<PathBuf>,
}

/// Events consumed by the state machine in [`state::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Initialise a fresh batch, replacing any previous one.
    CommandsReady {
        intro_message: String,
        summary_template: String,
        tasks: Vec<TaskRecord>,
    },
    TaskStarted {
        index: usize,
    },
    /// Streamed output of the running task.
    TaskProgress {
        index: usize,
        snapshot: StreamSnapshot,
    },
    TaskSucceeded {
        index: usize,
        elapsed_ms: u64,
    },
    TaskFailed {
        index: usize,
        error: String,
        elapsed_ms: Option<u64>,
    },
    BatchCompleted {
        summary: String,
    },
    BatchCancelled,
}

/// Final outcome of one task, as reported by the task runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { elapsed_ms: u64 },
    Failed { error: String, elapsed_ms: u64 },
}

/// How a batch run ended, as returned by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { message: String },
    Failed { error: String },
    Cancelled,
}

impl BatchOutcome {
    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchOutcome::Completed { .. } => 0,
            BatchOutcome::Failed { .. } => 1,
            BatchOutcome::Cancelled => 130,
        }
    }
}

pub mod controller;
pub mod observer;
pub mod policy;
pub mod state;

pub use controller::{BatchReporter, Controller};
pub use observer::{BatchObserver, ConsoleObserver};
pub use policy::{Decision, Verdict, format_duration};
pub use state::transition;
