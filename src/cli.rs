// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `execbatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "execbatch",
    version,
    about = "Run a planned batch of shell commands one at a time, with live progress.",
    long_about = None
)]
pub struct CliArgs {
    /// What to do, in plain words. Handed to the planner; the file planner
    /// only logs it.
    #[arg(value_name = "REQUEST", trailing_var_arg = true)]
    pub request: Vec<String>,

    /// Path to the plan file (TOML).
    ///
    /// Default: `Plan.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Plan.toml")]
    pub plan: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXECBATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the commands, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Minimum interval between output refreshes, overriding
    /// `[config].throttle_ms` from the plan file.
    #[arg(long, value_name = "MS")]
    pub throttle_ms: Option<u64>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// The request words joined back into one line.
    pub fn request_text(&self) -> String {
        self.request.join(" ")
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
