// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Load a plan file from a given path without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading plan file at {:?}", path))?;

    parse_plan(&contents)
}

/// Parse plan TOML from a string.
pub fn parse_plan(contents: &str) -> Result<RawPlanFile> {
    let plan: RawPlanFile = toml::from_str(contents)?;
    Ok(plan)
}

/// Load a plan file from path and validate it.
///
/// This is the entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for empty commands, out-of-range `[config]` values and zero
///   timeouts.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(&path)?;
    PlanFile::try_from(raw)
}
