//! Smoke tests -- verify the binary runs and the subcommands are wired.

use assert_cmd::Command;
use predicates::prelude::*;

fn courtwatch() -> Command {
    let mut cmd = Command::cargo_bin("courtwatch").unwrap();
    cmd.env_remove("COURTWATCH_CONFIG").env_remove("COURTWATCH_BOT_ID");
    cmd
}

#[test]
fn test_cli_help() {
    courtwatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Court-assignment alerts"));
}

#[test]
fn test_cli_version() {
    courtwatch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("courtwatch"));
}

#[test]
fn test_subcommands_exist() {
    for sub in ["run", "status", "check-match", "check-stream"] {
        courtwatch().args([sub, "--help"]).assert().success();
    }
}

#[test]
fn test_run_without_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    courtwatch()
        .current_dir(dir.path())
        .env("COURTWATCH_CONFIG", dir.path().join("missing.toml"))
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_run_rejects_config_without_bot_id() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("courtwatch.toml");
    std::fs::write(&config, "[player]\nslug = \"adam-harvey\"\n").unwrap();

    courtwatch()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("notify.bot_id"));
}

#[test]
fn test_status_on_empty_state() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("courtwatch.toml");
    let state = dir.path().join("state.json");
    std::fs::write(
        &config,
        format!("[storage]\nstate_path = {:?}\n", state.display().to_string()),
    )
    .unwrap();

    courtwatch()
        .args(["status", "--json", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 0"));
}
