//! CLI surface tests: help text, validation errors, JSON output shape.

use assert_cmd::Command;
use predicates::prelude::*;

fn groundwork() -> Command {
    Command::cargo_bin("groundwork").expect("binary builds")
}

// ── help and version ─────────────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    groundwork()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_subcommands() {
    groundwork()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("resources"));
}

#[test]
fn test_version_flag() {
    groundwork()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("groundwork"));
}

#[test]
fn test_resources_help_mentions_force_clean() {
    groundwork()
        .args(["resources", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force-clean"));
}

// ── configuration validation ─────────────────────────────────────────────────

#[test]
fn test_bootstrap_requires_region_flag() {
    groundwork()
        .arg("bootstrap")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--region"));
}

#[test]
fn test_bootstrap_blank_region_fails_validation() {
    groundwork()
        .args(["bootstrap", "--region", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Region is required"));
}

#[test]
fn test_bootstrap_reports_all_violations_at_once() {
    groundwork()
        .args(["bootstrap", "--provider", "gcp", "--region", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Region is required"))
        .stderr(predicate::str::contains("project_id is required for GCP"));
}

#[test]
fn test_unknown_provider_is_rejected() {
    groundwork()
        .args(["bootstrap", "--provider", "azure", "--region", "us-east-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_destroy_validates_before_prompting() {
    groundwork()
        .args(["destroy", "--region", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Region is required"));
}

// ── JSON output ──────────────────────────────────────────────────────────────

#[test]
fn test_json_validation_failure_is_machine_readable() {
    let output = groundwork()
        .args(["--json", "bootstrap", "--provider", "gcp", "--region", " "])
        .output()
        .expect("run");

    assert!(!output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid JSON");
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["message"], "Invalid configuration");

    let errors = parsed["data"]["errors"].as_array().expect("errors array");
    let rendered: Vec<&str> = errors.iter().filter_map(|e| e.as_str()).collect();
    assert!(rendered.contains(&"Region is required"));
    assert!(rendered.contains(&"project_id is required for GCP"));
}
