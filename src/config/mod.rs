// src/config/mod.rs

//! Plan file loading and validation for execbatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate basic invariants like non-empty commands (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_plan};
pub use model::{CommandConfig, ConfigSection, PlanFile, RawPlanFile};
pub use validate::validate_plan;
