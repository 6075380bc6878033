//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the labdiag-cli binary (finds it in target/debug when run via cargo test).
fn labdiag_cli() -> Command {
    cargo_bin_cmd!("labdiag-cli")
}

/// Path to labdiag library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("labdiag")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = labdiag_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("circuit diagnosis"));
}

#[test]
fn test_cli_version() {
    let mut cmd = labdiag_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_diagnose_human() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("diagnose").arg(path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Circuit: Audio Amplifier Stage (circuit-1)"))
        .stdout(predicate::str::contains("[CRITICAL] Output Amplitude Collapsed (output-low)"))
        .stdout(predicate::str::contains("[FAIL] Output Signal:"))
        .stdout(predicate::str::contains("Rules evaluated: 4"));
}

#[test]
fn test_cli_diagnose_fail_on_critical() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("diagnose").arg(path).arg("--fail-on").arg("critical");

    cmd.assert().code(1);
}

#[test]
fn test_cli_diagnose_category_filter() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("diagnose")
        .arg(path)
        .arg("--category")
        .arg("timing")
        .arg("--no-narratives")
        .arg("--fail-on")
        .arg("info");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No rules triggered"))
        .stdout(predicate::str::contains("Rules evaluated: 0"));
}

#[test]
fn test_cli_diagnose_unknown_category() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("diagnose").arg(path).arg("--category").arg("acoustics");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown rule category"));
}

#[test]
fn test_cli_diagnose_json_output() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("diagnose").arg(path).arg("--format").arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"circuitId\": \"circuit-1\""))
        .stdout(predicate::str::contains("\"activeSymptoms\""));
}

#[test]
fn test_cli_diagnose_nonexistent_file() {
    let mut cmd = labdiag_cli();

    cmd.arg("diagnose").arg("does_not_exist.json");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_diagnose_snapshot_without_circuit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"workflows": [], "rules": []}"#).unwrap();

    let mut cmd = labdiag_cli();
    cmd.arg("diagnose").arg(&path);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("broken.json"));
}

#[test]
fn test_cli_validate_reports_invalid_rules() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("invalid_rules.json");

    cmd.arg("validate").arg(path);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("INVALID  no-conditions"))
        .stdout(predicate::str::contains("wrong-family"))
        .stdout(predicate::str::contains("ok       vcc-low"));
}

#[test]
fn test_cli_validate_clean_snapshot() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("validate").arg(path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 of 4 rules invalid"));
}

#[test]
fn test_cli_explain_rule() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("explain").arg(path).arg("--rule").arg("q1-open");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Output Transistor Disconnected:"))
        .stdout(predicate::str::contains("Q1 is not connected (disconnected)"));
}

#[test]
fn test_cli_explain_unknown_rule() {
    let mut cmd = labdiag_cli();
    let path = fixtures_dir().join("audio_amplifier.json");

    cmd.arg("explain").arg(path).arg("--rule").arg("nope");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown rule: nope"));
}

#[test]
fn test_cli_library() {
    let mut cmd = labdiag_cli();

    cmd.arg("library");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rail Voltage Below Minimum"))
        .stdout(predicate::str::contains("Oscillator Not Starting"));
}

#[test]
fn test_cli_library_category_verbose() {
    let mut cmd = labdiag_cli();

    cmd.arg("library").arg("--category").arg("timing").arg("--verbose");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Oscillator Not Starting"))
        .stdout(predicate::str::contains("Explanation:"))
        .stdout(predicate::str::contains("Rail Voltage Below Minimum").not());
}

#[test]
fn test_cli_classify_pass_and_fail() {
    let mut cmd = labdiag_cli();
    cmd.arg("classify")
        .arg("--expected")
        .arg("3.3V ± 0.1V")
        .arg("--actual")
        .arg("3.32V");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Band:     3.2V .. 3.4V"))
        .stdout(predicate::str::contains("Result:   PASS"));

    let mut cmd = labdiag_cli();
    cmd.arg("classify")
        .arg("--expected")
        .arg("5V ± 5%")
        .arg("--actual")
        .arg("2.0V");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Result:   FAIL"));
}

#[test]
fn test_cli_classify_unparseable() {
    let mut cmd = labdiag_cli();

    cmd.arg("classify")
        .arg("--expected")
        .arg("nominal")
        .arg("--actual")
        .arg("5V");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("could not parse expected value"));
}
