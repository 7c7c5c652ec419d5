//! CLI argument parsing and binary startup tests.

use std::process::Command;
use std::time::Duration;

use acp_bench::{BenchConfig, Cli, Flavor, LogFormat};
use clap::Parser;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("acp-bench").chain(args.iter().copied()))
}

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_acp-bench"));
    for var in [
        "ACP_BENCH_FLAVOR",
        "ACP_BENCH_AMOUNT",
        "ACP_BENCH_INSTRUMENT",
        "ACP_BENCH_PARTIAL",
        "ACP_BENCH_REPORT_INTERVAL_SECS",
        "ACP_BENCH_LOG_FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_glob_partial_flags_parse() {
    let cli = parse(&["--flavor", "glob", "--amount", "10", "--partial"]).unwrap();
    assert_eq!(cli.flavor, Flavor::Glob);
    assert_eq!(cli.amount, 10);
    assert!(cli.partial);
    assert!(!cli.instrument);

    let config = BenchConfig::from(cli);
    assert_eq!(config.report_interval, Duration::from_secs(5));
    assert_eq!(config.log_format, LogFormat::Text);
}

#[test]
fn test_flavor_is_case_sensitive() {
    assert!(parse(&["--flavor", "Glob"]).is_err());
}

#[test]
fn test_help_lists_flags() {
    let output = bin().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--flavor",
        "--amount",
        "--instrument",
        "--partial",
        "--report-interval-secs",
        "--log-format",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn test_invalid_flavor_fails_at_startup() {
    let output = bin().args(["--flavor", "fuzzy"]).output().unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fuzzy"));
}

#[test]
fn test_invalid_flavor_from_env_fails_at_startup() {
    let output = bin().env("ACP_BENCH_FLAVOR", "regex").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_zero_interval_exits_with_error() {
    let output = bin()
        .args(["--amount", "1", "--report-interval-secs", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("report interval"));
}
