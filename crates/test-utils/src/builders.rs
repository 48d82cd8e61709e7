#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use execbatch::config::{CommandConfig, ConfigSection, PlanFile, RawPlanFile};
use execbatch::engine::{BatchState, Command, TaskRecord, TaskStatus};

/// Builder for `Command`.
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    pub fn new(description: &str, cmd: &str) -> Self {
        Self {
            command: Command::new(description, cmd),
        }
    }

    pub fn critical(mut self, val: bool) -> Self {
        self.command.critical = val;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.command.timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.command.working_directory = Some(dir.into());
        self
    }

    pub fn build(self) -> Command {
        self.command
    }
}

/// Builder for `PlanFile`, going through the same validation as the loader.
pub struct PlanFileBuilder {
    raw: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawPlanFile::default(),
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.raw.message = message.to_string();
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.raw.summary = summary.to_string();
        self
    }

    pub fn error(mut self, error: &str) -> Self {
        self.raw.error = Some(error.to_string());
        self
    }

    pub fn config(mut self, config: ConfigSection) -> Self {
        self.raw.config = config;
        self
    }

    pub fn with_command(mut self, description: &str, cmd: &str) -> Self {
        self.raw.commands.push(CommandConfig {
            description: description.to_string(),
            command: cmd.to_string(),
            working_directory: None,
            timeout_ms: None,
            critical: true,
        });
        self
    }

    pub fn with_command_config(mut self, cmd: CommandConfig) -> Self {
        self.raw.commands.push(cmd);
        self
    }

    pub fn build_raw(self) -> RawPlanFile {
        self.raw
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.raw).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A batch state with one `Pending` record per `(label, critical)` pair.
pub fn pending_batch(summary: &str, tasks: &[(&str, bool)]) -> BatchState {
    BatchState {
        intro_message: String::new(),
        summary_template: summary.to_string(),
        tasks: tasks
            .iter()
            .map(|(label, critical)| {
                TaskRecord::pending(
                    &CommandBuilder::new(label, &format!("run {label}"))
                        .critical(*critical)
                        .build(),
                )
            })
            .collect(),
        completion_message: None,
        error: None,
    }
}

/// Statuses of every task, for compact assertions.
pub fn statuses(state: &BatchState) -> Vec<TaskStatus> {
    state.tasks.iter().map(|t| t.status).collect()
}
