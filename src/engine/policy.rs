// src/engine/policy.rs

//! Completion / failure policy.
//!
//! Given the batch state and the outcome of the task that just finished,
//! [`decide`] returns the events to feed the state machine and whether the
//! batch keeps going. Like the state machine, this is pure.

use crate::engine::{BatchEvent, BatchState, TaskOutcome, TaskStatus};

/// Summary used when the planner did not supply one.
pub const DEFAULT_SUMMARY: &str = "Execution completed";

/// What the controller should do after applying a [`Decision`]'s events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Start the next pending task.
    Continue,
    /// Every task has run; the completion message has been emitted.
    Finished,
    /// A critical task failed; the remaining tasks were cancelled.
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub events: Vec<BatchEvent>,
    pub verdict: Verdict,
}

/// Decide what follows the outcome of task `index`.
///
/// - success with tasks left: `TaskSucceeded`, continue
/// - success on the last task: `TaskSucceeded` + `BatchCompleted`
/// - critical failure: `TaskFailed` + `BatchCancelled`, halt
/// - non-critical failure: `TaskFailed`, then continue or complete exactly
///   as a success would
pub fn decide(state: &BatchState, index: usize, outcome: TaskOutcome) -> Decision {
    let critical = state.tasks.get(index).is_none_or(|t| t.critical);
    let more_pending = state
        .tasks
        .iter()
        .enumerate()
        .any(|(i, t)| i != index && t.status == TaskStatus::Pending);

    let mut events = Vec::with_capacity(2);

    match outcome {
        TaskOutcome::Succeeded { elapsed_ms } => {
            events.push(BatchEvent::TaskSucceeded { index, elapsed_ms });
        }
        TaskOutcome::Failed { error, elapsed_ms } => {
            events.push(BatchEvent::TaskFailed {
                index,
                error,
                elapsed_ms: Some(elapsed_ms),
            });
            if critical {
                events.extend(cancellation_events());
                return Decision {
                    events,
                    verdict: Verdict::Halted,
                };
            }
        }
    }

    if more_pending {
        return Decision {
            events,
            verdict: Verdict::Continue,
        };
    }

    events.push(BatchEvent::BatchCompleted {
        summary: summary_text(&state.summary_template),
    });
    Decision {
        events,
        verdict: Verdict::Finished,
    }
}

/// Events for an explicit user cancellation.
pub fn cancellation_events() -> Vec<BatchEvent> {
    vec![BatchEvent::BatchCancelled]
}

/// The configured summary, or [`DEFAULT_SUMMARY`] when blank.
pub fn summary_text(template: &str) -> String {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format a duration as `"<N> hours <N> minutes <N> seconds"`.
///
/// Units that are zero are left out; `"0 seconds"` is used when everything
/// is zero. Sub-second remainders are dropped.
pub fn format_duration(total_ms: u64) -> String {
    let total_secs = total_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(unit(seconds, "second"));
    }
    parts.join(" ")
}

fn unit(n: u64, name: &str) -> String {
    if n == 1 {
        format!("{n} {name}")
    } else {
        format!("{n} {name}s")
    }
}
