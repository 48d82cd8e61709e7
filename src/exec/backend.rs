// src/exec/backend.rs

//! Pluggable shell backend abstraction.
//!
//! The task runner talks to a `ShellBackend` instead of spawning processes
//! itself. Production code uses [`super::process::ProcessBackend`]; tests
//! provide a scripted backend that emits canned output without touching the
//! OS.
//!
//! Output streaming is scoped to a single call: every `execute` receives its
//! own [`OutputSender`]. The sender is dropped when the call returns, on
//! every exit path, so output from one task can never leak into another.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::Command;
use crate::errors::Result;

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A raw piece of process output, not necessarily aligned to lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputChunk {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

pub type OutputSender = mpsc::Sender<OutputChunk>;

/// Capacity of the per-call output channel.
pub const OUTPUT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Error,
}

/// What the backend reports once a command has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub description: String,
    pub command: String,
    pub output: String,
    pub errors: String,
    pub result: ExecutionStatus,
    /// Backend-level failure reason (non-zero exit, timeout, ...).
    pub error: Option<String>,
    pub working_directory: Option<PathBuf>,
}

impl ExecutionResult {
    /// Empty result for `command` with the given status.
    pub fn for_command(command: &Command, result: ExecutionStatus) -> Self {
        Self {
            description: command.description.clone(),
            command: command.command.clone(),
            output: String::new(),
            errors: String::new(),
            result,
            error: None,
            working_directory: command.working_directory.clone(),
        }
    }
}

/// Trait abstracting how a single command is executed.
pub trait ShellBackend: Send + Sync {
    /// Run `command` to completion, sending output chunks on `output` as
    /// they are produced.
    ///
    /// Timeouts declared on the command are the backend's responsibility
    /// and must come back as an `Error` result, not as `Err`. `Err` is
    /// reserved for faults of the backend itself (e.g. spawning failed).
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        index: usize,
        output: OutputSender,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>>;
}
