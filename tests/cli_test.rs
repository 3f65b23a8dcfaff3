use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

const PAYMENT: &str =
    r#"{"op":"create_payment","id":"p1","attributes":{"amount":"10.50","currency":"GBP"}}"#;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let scenario = common::scenario(&[
        // nothing listens on the discard port
        r#"{"op":"create_subscription","id":"sub1","attributes":{"callback_uri":"http://127.0.0.1:9/hooks","record_type":"payment_submissions","event_type":"updated"}}"#,
        PAYMENT,
        r#"{"op":"create_payment_submission","payment_id":"p1","id":"s1"}"#,
        r#"{"op":"create_recall","payment_id":"p1","id":"r1"}"#,
        r#"{"op":"create_recall_submission","payment_id":"p1","recall_id":"r1","id":"rs1"}"#,
    ])?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(scenario.path())
        .args(["--step-delay-ms", "5", "--webhook-timeout-ms", "200"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"delivery_confirmed\""))
        .stdout(predicate::str::contains("\"payment_submissions\""))
        .stdout(predicate::str::contains("\"10.50\""));

    Ok(())
}

#[test]
fn test_malformed_line_is_reported_and_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let scenario = common::scenario(&[
        "this is not json",
        r#"{"op":"unknown_op"}"#,
        PAYMENT,
    ])?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(scenario.path()).args(["--step-delay-ms", "1"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("unreadable command"))
        .stdout(predicate::str::contains("\"p1\""));

    Ok(())
}

#[test]
fn test_failed_command_is_reported_and_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let scenario = common::scenario(&[
        r#"{"op":"create_payment_submission","payment_id":"missing","id":"s1"}"#,
        PAYMENT,
        PAYMENT,
    ])?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(scenario.path()).args(["--step-delay-ms", "1"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("command failed"))
        .stdout(predicate::str::contains("\"p1\""));

    Ok(())
}

#[test]
fn test_missing_input_fails() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("does/not/exist.jsonl");

    cmd.assert().failure();
}
