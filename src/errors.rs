// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only the edges of the crate (plan loading, planning, process spawning)
//! produce errors. Task failures are not errors: they are recorded as data
//! on [`crate::engine::BatchState`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecBatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExecBatchError>;
