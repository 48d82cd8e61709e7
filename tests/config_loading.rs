// tests/config_loading.rs

mod common;
use crate::common::builders::PlanFileBuilder;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use execbatch::config::{ConfigSection, load_and_validate, parse_plan, validate_plan};
use execbatch::errors::ExecBatchError;
use execbatch::plan::{FilePlanner, PlanResponse, Planner};

type TestResult = Result<(), Box<dyn Error>>;

fn write_plan(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("Plan.toml");
    fs::write(&path, contents).expect("write plan file");
    path
}

#[test]
fn full_plan_file_is_loaded() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(
        &dir,
        r#"
message = "Building the project"
summary = "Build done"

[config]
tail_lines = 4
throttle_ms = 250
min_display_ms = 300

[[command]]
description = "Compile"
command = "cargo build"
working_directory = "/tmp"
timeout_ms = 60000

[[command]]
description = "Lint"
command = "cargo clippy"
critical = false
"#,
    );

    let plan = load_and_validate(&path)?;

    assert_eq!(plan.message, "Building the project");
    assert_eq!(plan.summary, "Build done");
    assert_eq!(plan.error, None);
    assert_eq!(
        plan.config,
        ConfigSection {
            tail_lines: 4,
            throttle_ms: 250,
            min_display_ms: 300,
        }
    );

    let options = plan.config.runner_options();
    assert_eq!(options.tail_lines, 4);
    assert_eq!(options.throttle, Duration::from_millis(250));
    assert_eq!(options.min_display, Duration::from_millis(300));

    assert_eq!(plan.commands.len(), 2);
    let compile = &plan.commands[0];
    assert_eq!(compile.description, "Compile");
    assert_eq!(compile.command, "cargo build");
    assert_eq!(compile.working_directory, Some(PathBuf::from("/tmp")));
    assert_eq!(compile.timeout, Some(Duration::from_secs(60)));
    assert!(compile.critical);
    assert!(!plan.commands[1].critical);

    Ok(())
}

#[test]
fn defaults_apply_to_minimal_plan() -> TestResult {
    let plan = PlanFileBuilder::new()
        .with_command("", "make test")
        .build();

    assert_eq!(plan.config, ConfigSection::default());
    assert_eq!(plan.config.tail_lines, 8);
    assert_eq!(plan.config.throttle_ms, 100);
    assert_eq!(plan.config.min_display_ms, 0);
    assert_eq!(plan.summary, "");

    // A blank description falls back to the command line.
    assert_eq!(plan.commands[0].description, "make test");
    assert_eq!(plan.commands[0].timeout, None);
    assert!(plan.commands[0].critical);

    Ok(())
}

#[test]
fn plan_without_commands_is_rejected() {
    let raw = parse_plan("message = \"nothing to do\"\n").expect("parse");
    let err = validate_plan(&raw).unwrap_err();
    assert!(matches!(err, ExecBatchError::ConfigError(_)));
}

#[test]
fn plan_with_only_an_error_is_accepted() -> TestResult {
    let raw = parse_plan("error = \"could not plan\"\n")?;
    validate_plan(&raw)?;

    let plan = PlanFileBuilder::new().error("could not plan").build();
    let response = PlanResponse::from(plan);
    assert_eq!(response.failure().as_deref(), Some("could not plan"));

    Ok(())
}

#[test]
fn out_of_range_config_is_rejected() {
    for config in [
        ConfigSection {
            tail_lines: 0,
            ..ConfigSection::default()
        },
        ConfigSection {
            tail_lines: 129,
            ..ConfigSection::default()
        },
        ConfigSection {
            throttle_ms: 0,
            ..ConfigSection::default()
        },
    ] {
        let raw = PlanFileBuilder::new()
            .config(config)
            .with_command("a", "true")
            .build_raw();
        let err = validate_plan(&raw).unwrap_err();
        assert!(
            err.to_string().contains("[config]"),
            "unexpected error for {config:?}: {err}"
        );
    }
}

#[test]
fn bad_commands_are_rejected() {
    let empty = parse_plan(
        r#"
[[command]]
description = "nothing"
command = "   "
"#,
    )
    .expect("parse");
    let err = validate_plan(&empty).unwrap_err();
    assert!(err.to_string().contains("empty `command`"), "{err}");

    let zero_timeout = parse_plan(
        r#"
[[command]]
command = "sleep 1"
timeout_ms = 0
"#,
    )
    .expect("parse");
    let err = validate_plan(&zero_timeout).unwrap_err();
    assert!(err.to_string().contains("timeout_ms = 0"), "{err}");
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let err = parse_plan("[[command]\ncommand = ").unwrap_err();
    assert!(matches!(err, ExecBatchError::TomlError(_)));
}

#[test]
fn missing_file_mentions_the_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("missing.toml");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, ExecBatchError::Other(_)), "{err:?}");
    assert!(format!("{err:#}").contains("missing.toml"), "{err:#}");
}

#[tokio::test]
async fn file_planner_produces_a_response() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let path = write_plan(
        &dir,
        r#"
message = "Tidying up"
summary = "Cleanup done"

[[command]]
description = "Remove build output"
command = "rm -rf target"
"#,
    );

    let planner = FilePlanner::new(&path);
    assert_eq!(planner.path(), path.as_path());

    let response = planner.plan("clean the workspace").await?;
    assert_eq!(response.message, "Tidying up");
    assert_eq!(response.summary, "Cleanup done");
    assert_eq!(response.commands.len(), 1);
    assert_eq!(response.commands[0].description, "Remove build output");
    assert_eq!(response.failure(), None);

    Ok(())
}

#[test]
fn response_failure_rules() {
    assert_eq!(
        PlanResponse::default().failure().as_deref(),
        Some("planner returned no commands")
    );
    assert_eq!(
        PlanResponse {
            error: Some("   ".to_string()),
            ..PlanResponse::default()
        }
        .failure()
        .as_deref(),
        Some("planner returned no commands")
    );

    let with_commands = PlanResponse::from(PlanFileBuilder::new().with_command("a", "true").build());
    assert_eq!(with_commands.failure(), None);
}
