//! Integration tests for the points ledger CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given arguments and return stdout
fn run_ledger(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    let assert = cmd.args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn expected(filename: &str) -> String {
    fs::read_to_string(test_data_path(filename)).unwrap()
}

#[test]
fn test_balances_without_spend() {
    let output = run_ledger(&[test_data_path("scenario_a.csv").as_str()]);
    assert_eq!(output, expected("expected_a.csv"));
}

#[test]
fn test_spend_oldest_first() {
    let output = run_ledger(&[test_data_path("scenario_a.csv").as_str(), "5000"]);
    assert_eq!(output, expected("expected_a_spend_5000.csv"));
}

#[test]
fn test_spend_reports_deductions_on_stderr() {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.args([test_data_path("scenario_a.csv").as_str(), "5000"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DANNON: -300"))
        .stderr(predicate::str::contains("UNILEVER: -200"))
        .stderr(predicate::str::contains("MILLER COORS: -4500"));
}

#[test]
fn test_whitespace_and_case_handling() {
    let output = run_ledger(&[test_data_path("sample_b_whitespace.csv").as_str()]);
    assert_eq!(output, expected("expected_b.csv"));
}

#[test]
fn test_invalid_rows_are_skipped() {
    let output = run_ledger(&[test_data_path("sample_c_invalid_rows.csv").as_str()]);
    assert_eq!(output, expected("expected_c.csv"));
}

#[test]
fn test_spend_more_than_available_fails() {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.args([test_data_path("scenario_a.csv").as_str(), "20000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not enough points"));
}

#[test]
fn test_spend_from_empty_ledger_fails() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "payer,points,timestamp").unwrap();

    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.arg(input.path())
        .arg("100")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No transactions available"));
}

#[test]
fn test_exact_spend_zeroes_payer() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "payer,points,timestamp").unwrap();
    writeln!(input, "DANNON,500,2020-11-02T14:00:00Z").unwrap();

    let output = run_ledger(&[input.path().to_str().unwrap(), "500"]);
    assert_eq!(output, "payer,points\nDANNON,0\n");
}

#[test]
fn test_zero_spend_changes_nothing() {
    let output = run_ledger(&[test_data_path("scenario_a.csv").as_str(), "0"]);
    assert_eq!(output, expected("expected_a.csv"));
}

#[test]
fn test_invalid_spend_argument() {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.args([test_data_path("scenario_a.csv").as_str(), "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Error")));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("points-ledger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_ledger(&[test_data_path("scenario_a.csv").as_str()]);
    assert!(output.starts_with("payer,points"));
}
