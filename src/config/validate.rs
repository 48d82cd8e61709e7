// src/config/validate.rs

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::{ExecBatchError, Result};
use crate::exec::output_buffer::MAX_RETAINED_LINES;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = ExecBatchError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw))
    }
}

/// Check a raw plan for problems that would make it unusable.
pub fn validate_plan(plan: &RawPlanFile) -> Result<()> {
    ensure_has_commands(plan)?;
    validate_global_config(plan)?;
    validate_commands(plan)?;
    Ok(())
}

fn ensure_has_commands(plan: &RawPlanFile) -> Result<()> {
    // A plan that only carries a planner error is valid: the engine reports
    // it as a planning failure.
    let has_error = plan.error.as_deref().is_some_and(|e| !e.trim().is_empty());
    if plan.commands.is_empty() && !has_error {
        return Err(ExecBatchError::ConfigError(
            "plan must contain at least one [[command]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(plan: &RawPlanFile) -> Result<()> {
    let tail = plan.config.tail_lines;
    if tail == 0 || tail > MAX_RETAINED_LINES {
        return Err(ExecBatchError::ConfigError(format!(
            "[config].tail_lines must be between 1 and {MAX_RETAINED_LINES} (got {tail})"
        )));
    }

    if plan.config.throttle_ms == 0 {
        return Err(ExecBatchError::ConfigError(
            "[config].throttle_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_commands(plan: &RawPlanFile) -> Result<()> {
    for (i, cmd) in plan.commands.iter().enumerate() {
        if cmd.command.trim().is_empty() {
            return Err(ExecBatchError::ConfigError(format!(
                "command #{} has an empty `command`",
                i + 1
            )));
        }
        if cmd.timeout_ms == Some(0) {
            return Err(ExecBatchError::ConfigError(format!(
                "command #{} ('{}') has timeout_ms = 0",
                i + 1,
                cmd.command
            )));
        }
    }
    Ok(())
}
