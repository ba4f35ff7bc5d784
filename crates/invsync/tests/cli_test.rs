//! Integration tests for the `invsync` CLI binary.
//!
//! These cover argument parsing, completions, config management and error
//! exit codes, without a database or a live inventory API.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `invsync` binary with env isolation.
///
/// Clears all `INVSYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn invsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("invsync");
    cmd.env("HOME", "/tmp/invsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/invsync-cli-test-nonexistent")
        .env_remove("INVSYNC_PROFILE")
        .env_remove("INVSYNC_CONFIG")
        .env_remove("INVSYNC_OUTPUT")
        .env_remove("INVSYNC_INSECURE")
        .env_remove("INVSYNC_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const TWO_PROFILES: &str = r#"
default_profile = "lab"

[profiles.lab.source]
host = "nc-db.lab"
database = "netcracker"
user = "readonly"
password = "hunter2"

[profiles.lab.target]
url = "https://nautobot.lab"
token = "0123456789abcdef"

[profiles.prod.source]
host = "nc-db.prod"
database = "netcracker"
"#;

fn write_config(dir: &Path) -> String {
    let path = dir.join("config.toml");
    std::fs::write(&path, TWO_PROFILES).unwrap();
    path.display().to_string()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = invsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    invsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sync")
            .and(predicate::str::contains("diff"))
            .and(predicate::str::contains("discover"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    invsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("invsync"));
}

#[test]
fn test_sync_help_mentions_dry_run() {
    invsync_cmd()
        .args(["sync", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_invalid_subcommand() {
    let output = invsync_cmd().arg("reconcile").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_diff_rejects_unknown_kind() {
    let output = invsync_cmd()
        .args(["diff", "--kind", "vlan"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid value"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    invsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    invsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invsync"));
}

#[test]
fn test_completions_fish() {
    invsync_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Missing configuration ───────────────────────────────────────────

#[test]
fn test_sync_without_config_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let output = invsync_cmd()
        .args(["sync", "--config", missing.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("config init"));
}

#[test]
fn test_discover_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = invsync_cmd()
        .args(["discover", "--config", &config, "--profile", "staging"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("staging"), "{text}");
}

#[test]
fn test_diff_with_incomplete_profile_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = invsync_cmd()
        .args(["diff", "--config", &config, "--profile", "prod"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_profiles_marks_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    invsync_cmd()
        .args(["config", "profiles", "--output", "plain", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *").and(predicate::str::contains("prod")));
}

#[test]
fn test_config_show_masks_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    invsync_cmd()
        .args(["config", "show", "--output", "json", "--config", &config])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("nc-db.lab")
                .and(predicate::str::contains("hunter2").not())
                .and(predicate::str::contains("0123456789abcdef").not()),
        );
}

#[test]
fn test_config_use_switches_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    invsync_cmd()
        .args(["config", "use", "prod", "--config", &config])
        .assert()
        .success();

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains(r#"default_profile = "prod""#), "{written}");
}

#[test]
fn test_config_use_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = invsync_cmd()
        .args(["config", "use", "staging", "--config", &config])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("lab, prod"));
}
