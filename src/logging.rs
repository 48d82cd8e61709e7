// src/logging.rs

//! Logging setup for `execbatch`.
//!
//! The filter is picked in this order:
//! 1. `--log-level` on the command line, applied to every target
//! 2. `EXECBATCH_LOG`, in `EnvFilter` directive syntax
//!    (`debug`, `execbatch::exec=trace,warn`, ...)
//! 3. `warn`
//!
//! Logs go to STDERR. STDOUT belongs to the console observer.

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable read when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "EXECBATCH_LOG";

/// Install the global subscriber. Call once, before the first log line.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Filter for the given CLI level and `EXECBATCH_LOG` value.
///
/// A malformed environment value is an error rather than silently ignored.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::default().add_directive(level_filter(level).into()));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::builder()
            .parse(directives)
            .with_context(|| format!("parsing {LOG_ENV_VAR}={directives:?}")),
        None => Ok(EnvFilter::default().add_directive(LevelFilter::WARN.into())),
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
