// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::PlanFile;
use crate::engine::{ConsoleObserver, Controller};
use crate::exec::{ProcessBackend, TaskRunner};
use crate::plan::FilePlanner;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - plan loading (once for `[config]`, once through the planner)
/// - task runner + process backend
/// - controller + console observer
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let planner = FilePlanner::new(&args.plan);
    let plan = config::load_and_validate(planner.path())?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(0);
    }

    let mut options = plan.config.runner_options();
    if let Some(ms) = args.throttle_ms {
        options.throttle = std::time::Duration::from_millis(ms.max(1));
    }
    debug!(?options, "runner options");

    let runner = TaskRunner::new(ProcessBackend::new(), options);
    let mut controller = Controller::new(runner, ConsoleObserver::stdout());

    // Ctrl-C → cooperative cancellation.
    {
        let token = controller.cancel_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C; cancellation disabled");
                return;
            }
            info!("Ctrl+C received; cancelling batch");
            token.cancel();
        });
    }

    let outcome = controller.plan_and_run(&planner, &args.request_text()).await;
    info!(?outcome, "batch finished");
    Ok(outcome.exit_code())
}

/// Simple dry-run output: print the plan's commands.
fn print_dry_run(plan: &PlanFile) {
    println!("execbatch dry-run");
    println!("  config.tail_lines = {}", plan.config.tail_lines);
    println!("  config.throttle_ms = {}", plan.config.throttle_ms);
    println!("  config.min_display_ms = {}", plan.config.min_display_ms);
    if let Some(error) = &plan.error {
        println!("  error: {error}");
    }
    println!();

    println!("commands ({}):", plan.commands.len());
    for (i, cmd) in plan.commands.iter().enumerate() {
        println!("  {}. {}", i + 1, cmd.description);
        println!("      cmd: {}", cmd.command);
        if let Some(dir) = &cmd.working_directory {
            println!("      working_directory: {}", dir.display());
        }
        if let Some(timeout) = cmd.timeout {
            println!("      timeout_ms: {}", timeout.as_millis());
        }
        if !cmd.critical {
            println!("      critical: false");
        }
    }

    debug!("dry-run complete (no execution)");
}
