// src/plan/mod.rs

//! Planning: turning a request into an ordered list of commands.
//!
//! The language-model planner lives outside this crate. What the engine
//! needs from any planner is a [`PlanResponse`]; [`FilePlanner`] produces
//! one from a TOML plan file and is what the binary uses.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info};

use crate::config::{PlanFile, load_and_validate};
use crate::engine::Command;
use crate::errors::Result;

/// What a planner hands to the engine.
///
/// An empty `commands` list together with `error` means the batch cannot
/// start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanResponse {
    pub message: String,
    pub summary: String,
    pub commands: Vec<Command>,
    pub error: Option<String>,
}

impl PlanResponse {
    /// The reason this plan cannot be executed, if any.
    pub fn failure(&self) -> Option<String> {
        if !self.commands.is_empty() {
            return None;
        }
        match self.error.as_deref().map(str::trim) {
            Some(err) if !err.is_empty() => Some(err.to_string()),
            _ => Some("planner returned no commands".to_string()),
        }
    }
}

impl From<PlanFile> for PlanResponse {
    fn from(plan: PlanFile) -> Self {
        Self {
            message: plan.message,
            summary: plan.summary,
            commands: plan.commands,
            error: plan.error,
        }
    }
}

/// Trait abstracting where plans come from.
pub trait Planner: Send + Sync {
    fn plan<'a>(
        &'a self,
        request: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PlanResponse>> + Send + 'a>>;
}

/// Planner that ignores the request text and reads a plan file.
#[derive(Debug, Clone)]
pub struct FilePlanner {
    path: PathBuf,
}

impl FilePlanner {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Planner for FilePlanner {
    fn plan<'a>(
        &'a self,
        request: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PlanResponse>> + Send + 'a>> {
        Box::pin(async move {
            debug!(request, path = ?self.path, "planning from file");
            let plan = load_and_validate(&self.path)?;
            info!(commands = plan.commands.len(), "loaded plan");
            Ok(PlanResponse::from(plan))
        })
    }
}
