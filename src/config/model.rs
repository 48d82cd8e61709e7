// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::Command;
use crate::exec::RunnerOptions;

/// Plan file as read from TOML, before validation.
///
/// ```toml
/// message = "Building the project"
/// summary = "Build done"
///
/// [config]
/// tail_lines = 8
/// throttle_ms = 100
///
/// [[command]]
/// description = "Compile"
/// command = "cargo build"
/// critical = true
/// ```
///
/// Everything except the commands is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlanFile {
    /// Intro line shown before the first task starts.
    #[serde(default)]
    pub message: String,

    /// Completion summary, rendered as `"<summary> in <duration>."`.
    #[serde(default)]
    pub summary: String,

    /// Set by a planner that could not produce commands.
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub config: ConfigSection,

    /// All `[[command]]` entries, in execution order.
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandConfig>,
}

/// `[config]` section: how output is surfaced while tasks run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ConfigSection {
    /// Lines of stdout/stderr kept in each progress snapshot (1..=128).
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,

    /// Minimum interval between output refreshes.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Fast tasks stay visible at least this long.
    #[serde(default)]
    pub min_display_ms: u64,
}

fn default_tail_lines() -> usize {
    8
}

fn default_throttle_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            tail_lines: default_tail_lines(),
            throttle_ms: default_throttle_ms(),
            min_display_ms: 0,
        }
    }
}

impl ConfigSection {
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            tail_lines: self.tail_lines,
            throttle: Duration::from_millis(self.throttle_ms),
            min_display: Duration::from_millis(self.min_display_ms),
        }
    }
}

/// `[[command]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommandConfig {
    /// Human-readable label; falls back to the command itself when blank.
    #[serde(default)]
    pub description: String,

    /// Shell command line, run through `sh -c`.
    pub command: String,

    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// A failing critical command cancels the rest of the batch.
    #[serde(default = "default_critical")]
    pub critical: bool,
}

fn default_critical() -> bool {
    true
}

impl CommandConfig {
    pub fn to_command(&self) -> Command {
        let description = if self.description.trim().is_empty() {
            self.command.trim().to_string()
        } else {
            self.description.trim().to_string()
        };
        Command {
            description,
            command: self.command.clone(),
            working_directory: self.working_directory.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            critical: self.critical,
        }
    }
}

/// Validated plan file. Build it from a [`RawPlanFile`] via `TryFrom`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub message: String,
    pub summary: String,
    pub error: Option<String>,
    pub config: ConfigSection,
    pub commands: Vec<Command>,
}

impl PlanFile {
    /// Assemble a plan without validation; use `PlanFile::try_from`.
    pub(crate) fn new_unchecked(raw: RawPlanFile) -> Self {
        Self {
            message: raw.message,
            summary: raw.summary,
            error: raw.error,
            config: raw.config,
            commands: raw.commands.iter().map(CommandConfig::to_command).collect(),
        }
    }
}
