// src/engine/controller.rs

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::observer::BatchObserver;
use crate::engine::policy::{self, Verdict};
use crate::engine::state::transition;
use crate::engine::{
    BatchEvent, BatchOutcome, BatchState, Command, StreamSnapshot, TaskRecord,
};
use crate::exec::{RunReporter, ShellBackend, TaskRunner};
use crate::plan::{PlanResponse, Planner};

/// Operation names passed to [`BatchObserver::on_aborted`].
pub const PLANNING_OPERATION: &str = "planning";
pub const EXECUTION_OPERATION: &str = "execution";

/// Drives a batch: starts tasks in order, feeds runner results through the
/// policy and state machine, and publishes every new state.
///
/// This is the only stateful, side-effecting piece of the engine. The
/// semantics live in [`transition`] and [`policy::decide`]; this struct
/// handles the async side: awaiting the runner and reacting to
/// cancellation.
pub struct Controller<B: ShellBackend, O: BatchObserver> {
    runner: TaskRunner<B>,
    observer: O,
    state: BatchState,
    cancel: CancellationToken,
}

impl<B: ShellBackend, O: BatchObserver> fmt::Debug for Controller<B, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<B: ShellBackend, O: BatchObserver> Controller<B, O> {
    pub fn new(runner: TaskRunner<B>, observer: O) -> Self {
        Self::with_cancel_token(runner, observer, CancellationToken::new())
    }

    pub fn with_cancel_token(runner: TaskRunner<B>, observer: O, cancel: CancellationToken) -> Self {
        Self {
            runner,
            observer,
            state: BatchState::default(),
            cancel,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Token that cancels the current (and any later) batch of this
    /// controller when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask `planner` for commands and run them.
    ///
    /// A planner error becomes a planning failure on the batch state; it is
    /// never returned to the caller.
    pub async fn plan_and_run<P>(&mut self, planner: &P, request: &str) -> BatchOutcome
    where
        P: Planner + ?Sized,
    {
        let planned = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            res = planner.plan(request) => Some(res),
        };

        let plan = match planned {
            None => {
                info!("batch cancelled during planning");
                self.observer.on_aborted(PLANNING_OPERATION);
                return BatchOutcome::Cancelled;
            }
            Some(Ok(plan)) => plan,
            Some(Err(e)) => PlanResponse {
                error: Some(format!("{e:#}")),
                ..PlanResponse::default()
            },
        };

        self.run_plan(plan).await
    }

    /// Run a planner response, treating an unusable plan as a batch error.
    pub async fn run_plan(&mut self, plan: PlanResponse) -> BatchOutcome {
        if let Some(error) = plan.failure() {
            warn!(error = %error, "plan cannot be executed");
            self.state = BatchState {
                intro_message: plan.message,
                summary_template: plan.summary,
                error: Some(error.clone()),
                ..BatchState::default()
            };
            self.observer.on_state(&self.state);
            self.observer.on_error(&error);
            return BatchOutcome::Failed { error };
        }

        if let Some(error) = plan.error.as_deref().filter(|e| !e.trim().is_empty()) {
            warn!(error, "planner reported an error alongside commands; running them anyway");
        }

        self.run_batch(plan.message, plan.summary, plan.commands).await
    }

    /// Run `commands` strictly in order until the batch completes, a
    /// critical task fails, or the batch is cancelled.
    pub async fn run_batch(
        &mut self,
        intro_message: String,
        summary_template: String,
        commands: Vec<Command>,
    ) -> BatchOutcome {
        info!(tasks = commands.len(), "starting batch");

        let tasks = commands.iter().map(TaskRecord::pending).collect();
        self.apply(BatchEvent::CommandsReady {
            intro_message,
            summary_template,
            tasks,
        });

        loop {
            if self.cancel.is_cancelled() {
                return self.abort();
            }

            let Some(index) = self.state.next_pending() else {
                // Nothing to run (empty batch): complete right away.
                self.apply(BatchEvent::BatchCompleted {
                    summary: policy::summary_text(&self.state.summary_template),
                });
                return self.finish();
            };

            let command = &commands[index];
            self.apply(BatchEvent::TaskStarted { index });

            let outcome = {
                let mut reporter = BatchReporter {
                    state: &mut self.state,
                    observer: &mut self.observer,
                    cancel: &self.cancel,
                    index,
                    terminal_seen: false,
                };

                let outcome = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    outcome = self.runner.run(index, command, &mut reporter) => Some(outcome),
                };

                outcome.filter(|_| reporter.terminal_seen)
            };

            let Some(outcome) = outcome else {
                info!(index, "batch cancelled while task was running");
                return self.abort();
            };

            let decision = policy::decide(&self.state, index, outcome);
            for event in decision.events {
                self.apply(event);
            }

            match decision.verdict {
                Verdict::Continue => continue,
                Verdict::Finished => return self.finish(),
                Verdict::Halted => {
                    let error = self
                        .state
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("{} failed", command.description));
                    warn!(index, error = %error, "critical task failed; batch halted");
                    self.observer.on_error(&error);
                    return BatchOutcome::Failed { error };
                }
            }
        }
    }

    fn apply(&mut self, event: BatchEvent) {
        apply_event(&mut self.state, &mut self.observer, event);
    }

    fn finish(&mut self) -> BatchOutcome {
        let message = self.state.completion_message.clone().unwrap_or_default();
        info!(message = %message, "batch completed");
        self.observer.on_completed(&self.state);
        BatchOutcome::Completed { message }
    }

    fn abort(&mut self) -> BatchOutcome {
        for event in policy::cancellation_events() {
            self.apply(event);
        }
        self.observer.on_aborted(EXECUTION_OPERATION);
        BatchOutcome::Cancelled
    }
}

fn apply_event<O: BatchObserver + ?Sized>(state: &mut BatchState, observer: &mut O, event: BatchEvent) {
    debug!(?event, "applying batch event");
    *state = transition(std::mem::take(state), event);
    observer.on_state(state);
}

/// [`RunReporter`] that writes runner callbacks into the controller's
/// state, dropping them once the batch has been cancelled.
pub struct BatchReporter<'a, O: BatchObserver + ?Sized> {
    state: &'a mut BatchState,
    observer: &'a mut O,
    cancel: &'a CancellationToken,
    index: usize,
    terminal_seen: bool,
}

impl<O: BatchObserver + ?Sized> BatchReporter<'_, O> {
    fn accepting(&self) -> bool {
        if self.cancel.is_cancelled() {
            debug!(index = self.index, "dropping runner callback after cancellation");
            return false;
        }
        true
    }
}

impl<O: BatchObserver + ?Sized> RunReporter for BatchReporter<'_, O> {
    fn on_update(&mut self, snapshot: StreamSnapshot) {
        if !self.accepting() {
            return;
        }
        apply_event(
            self.state,
            self.observer,
            BatchEvent::TaskProgress {
                index: self.index,
                snapshot,
            },
        );
    }

    fn on_complete(&mut self, elapsed_ms: u64, _snapshot: StreamSnapshot) {
        if self.accepting() {
            debug!(index = self.index, elapsed_ms, "runner reported completion");
            self.terminal_seen = true;
        }
    }

    fn on_failure(&mut self, error: String, _snapshot: StreamSnapshot) {
        if self.accepting() {
            debug!(index = self.index, error = %error, "runner reported failure");
            self.terminal_seen = true;
        }
    }
}
