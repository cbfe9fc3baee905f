use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

macro_rules! saga_demo {
    () => {
        assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
    };
}

fn fast_config() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(
        dir.path().join("saga.toml"),
        "base_delay_ms = 1\nmax_delay_ms = 10\ndefault_timeout_ms = 1000\n",
    )
    .expect("failed to write config");
    dir
}

#[test]
fn run_completes_every_step() {
    let config = fast_config();

    saga_demo!()
        .args(["run", "--campaign", "spring-sale", "--config"])
        .arg(config.path().join("saga.toml"))
        .assert()
        .success()
        .stdout(contains("Saga: campaign_launch"))
        .stdout(contains("Status: completed"))
        .stdout(contains("✓ reserve_credits (attempts: 1)"))
        .stdout(contains("✓ create_analytics (attempts: 1)"));
}

#[test]
fn failing_queue_is_compensated_and_exits_with_failure() {
    let config = fast_config();

    saga_demo!()
        .args(["run", "--fail-step", "enqueue-emails", "--max-retries", "3", "--config"])
        .arg(config.path().join("saga.toml"))
        .assert()
        .failure()
        .stdout(contains("Status: compensated"))
        .stdout(contains("↩ reserve_credits (attempts: 1)"))
        .stdout(contains("✗ enqueue_emails (attempts: 3)"))
        .stdout(contains("· update_campaign_status (attempts: 0)"))
        .stdout(contains("Error: step 'enqueue_emails' failed after 3 attempt(s)"))
        .stderr(contains("error: campaign launch ended compensated"));
}

#[test]
fn transient_failure_recovers_within_retry_budget() {
    let config = fast_config();

    saga_demo!()
        .args([
            "run",
            "--fail-step",
            "create-analytics",
            "--fail-times",
            "1",
            "--config",
        ])
        .arg(config.path().join("saga.toml"))
        .assert()
        .success()
        .stdout(contains("✓ create_analytics (attempts: 2)"));
}

#[test]
fn json_output_is_the_persisted_record() {
    let config = fast_config();

    saga_demo!()
        .args(["run", "--json", "--fail-step", "reserve-credits", "--max-retries", "1", "--config"])
        .arg(config.path().join("saga.toml"))
        .assert()
        .failure()
        .stdout(contains("\"sagaID\""))
        .stdout(contains("\"sagaName\": \"campaign_launch\""))
        .stdout(contains("\"status\": \"compensated\""))
        .stdout(contains("\"completedAt\""))
        .stdout(contains("\"attempts\": 1"))
        .stdout(contains("Status:").not());
}

#[test]
fn unknown_config_key_is_reported_with_cause() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("saga.toml");
    fs::write(&path, "max_retries = 3\n").expect("failed to write config");

    saga_demo!()
        .args(["run", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("error: configuration error"))
        .stderr(contains("caused by:"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().expect("failed to create temp dir");

    saga_demo!()
        .args(["run", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(contains("failed to read config file"));
}

#[test]
fn fail_times_requires_fail_step() {
    saga_demo!()
        .args(["run", "--fail-times", "2"])
        .assert()
        .failure()
        .stderr(contains("--fail-step"));
}
