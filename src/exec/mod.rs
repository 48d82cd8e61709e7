// src/exec/mod.rs

//! Command execution layer.
//!
//! - [`output_buffer`] accumulates streamed output with bounded memory.
//! - [`throttle`] rate-limits and coalesces output updates.
//! - [`backend`] provides the `ShellBackend` trait the runner executes
//!   through, so tests can swap in a scripted backend.
//! - [`process`] is the production backend on top of `tokio::process`.
//! - [`task_runner`] runs one command and reports progress and outcome.

pub mod backend;
pub mod output_buffer;
pub mod process;
pub mod task_runner;
pub mod throttle;

pub use backend::{
    ExecutionResult, ExecutionStatus, OutputChunk, OutputSender, OutputStream, ShellBackend,
};
pub use output_buffer::OutputBuffer;
pub use process::ProcessBackend;
pub use task_runner::{RunReporter, RunnerOptions, TaskRunner};
pub use throttle::Throttle;
