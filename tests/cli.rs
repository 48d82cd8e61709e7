// tests/cli.rs

use clap::Parser;

use execbatch::cli::{CliArgs, LogLevel};

#[test]
fn defaults() {
    let args = CliArgs::try_parse_from(["execbatch"]).unwrap();

    assert_eq!(args.plan, "Plan.toml");
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
    assert_eq!(args.throttle_ms, None);
    assert_eq!(args.request_text(), "");
}

#[test]
fn flags_and_request_words() {
    let args = CliArgs::try_parse_from([
        "execbatch",
        "--plan",
        "deploy.toml",
        "--log-level",
        "debug",
        "--throttle-ms",
        "250",
        "--dry-run",
        "build",
        "and",
        "deploy",
    ])
    .unwrap();

    assert_eq!(args.plan, "deploy.toml");
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert_eq!(args.throttle_ms, Some(250));
    assert!(args.dry_run);
    assert_eq!(args.request_text(), "build and deploy");
}

#[test]
fn unknown_log_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["execbatch", "--log-level", "loud"]).is_err());
}
