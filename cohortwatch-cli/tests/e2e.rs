//! End-to-end tests for the cohortwatch binary
//!
//! These tests build and run the binary, so they are gated behind the
//! `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p cohortwatch-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::process::Command;

/// Test that cohortwatch --help lists both commands
#[test]
fn cohortwatch_help_works() {
    let output = Command::new("cargo")
        .args(["run", "-p", "cohortwatch-cli", "--", "--help"])
        .output()
        .expect("Failed to run cohortwatch --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("send"));
}

/// Test that an invalid cohort is refused without contacting the bus
#[test]
fn cohortwatch_send_rejects_invalid_cohort() {
    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "cohortwatch-cli",
            "--",
            "send",
            "--cohort",
            "bad/name",
            "--data",
            "{}",
        ])
        .env("COHORTWATCH_PROJECT_CONFIG_DIR", env!("CARGO_TARGET_TMPDIR"))
        .output()
        .expect("Failed to run cohortwatch send");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid cohort"));
}
