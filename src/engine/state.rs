// src/engine/state.rs

//! Pure batch state machine.
//!
//! [`transition`] is a synchronous, deterministic function from
//! `(BatchState, BatchEvent)` to the next `BatchState`. It reads no clocks,
//! performs no IO and never panics, so it can be unit tested without Tokio,
//! processes or observers.
//!
//! Events that do not apply to the current state (unknown index, a status
//! change that would move backwards, a second completion message) return the
//! input state unchanged.

use crate::engine::policy::format_duration;
use crate::engine::{BatchEvent, BatchState, StreamSnapshot, TaskStatus};

/// Apply a single event to the batch state.
pub fn transition(mut state: BatchState, event: BatchEvent) -> BatchState {
    match event {
        BatchEvent::CommandsReady {
            intro_message,
            summary_template,
            tasks,
        } => BatchState {
            intro_message,
            summary_template,
            tasks,
            completion_message: None,
            error: None,
        },
        BatchEvent::TaskStarted { index } => {
            if state.running_index().is_some() {
                return state;
            }
            if let Some(task) = state.tasks.get_mut(index) {
                if task.status == TaskStatus::Pending {
                    task.status = TaskStatus::Running;
                }
            }
            state
        }
        BatchEvent::TaskProgress { index, snapshot } => {
            apply_snapshot(&mut state, index, snapshot);
            state
        }
        BatchEvent::TaskSucceeded { index, elapsed_ms } => {
            if let Some(task) = state.tasks.get_mut(index) {
                if task.status == TaskStatus::Running {
                    task.status = TaskStatus::Success;
                    task.elapsed_ms = elapsed_ms;
                }
            }
            state
        }
        BatchEvent::TaskFailed {
            index,
            error,
            elapsed_ms,
        } => {
            let Some(task) = state.tasks.get_mut(index) else {
                return state;
            };
            if task.status != TaskStatus::Running {
                return state;
            }
            task.status = TaskStatus::Failed;
            task.elapsed_ms = elapsed_ms.unwrap_or(0);
            task.error = Some(error.clone());
            if task.critical {
                state.error = Some(format!("{}: {}", task.label, error));
            }
            state
        }
        BatchEvent::BatchCompleted { summary } => {
            if state.completion_message.is_some()
                || !state.all_terminal()
                || state.was_cancelled()
            {
                return state;
            }
            let total = format_duration(state.total_elapsed_ms());
            state.completion_message = Some(format!("{summary} in {total}."));
            state
        }
        BatchEvent::BatchCancelled => {
            for task in state.tasks.iter_mut() {
                task.status = match task.status {
                    TaskStatus::Running => TaskStatus::Aborted,
                    TaskStatus::Pending => TaskStatus::Cancelled,
                    other => other,
                };
            }
            state
        }
    }
}

fn apply_snapshot(state: &mut BatchState, index: usize, snapshot: StreamSnapshot) {
    let Some(task) = state.tasks.get_mut(index) else {
        return;
    };
    if task.status != TaskStatus::Running {
        return;
    }
    task.stdout_tail = snapshot.stdout_tail;
    task.stderr_tail = snapshot.stderr_tail;
    if snapshot.working_directory.is_some() {
        task.working_directory = snapshot.working_directory;
    }
}
