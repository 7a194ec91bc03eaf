use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn cwalarm() -> Command {
    let mut cwalarm_bin = Command::new(assert_cmd::cargo::cargo_bin!("cwalarm"));
    cwalarm_bin.env_remove("RUST_LOG");

    cwalarm_bin
}

#[test]
fn test_no_selection() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-a", "idle", "-s", "MyTopic"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "You must provide an instance name, a tag key, or instance IDs",
    ));
}

#[test]
fn test_blank_instance_ids_are_not_a_selection() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-i", ",", "-a", "idle", "-s", "MyTopic"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "You must provide an instance name, a tag key, or instance IDs",
    ));
}

#[test]
fn test_missing_alarm_prefix() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-n", "web", "-s", "MyTopic"]);

    // Assert
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("You must provide an alarm name prefix"));
}

#[test]
fn test_missing_sns_topic() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-t", "Team", "-a", "idle"]);

    // Assert
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("You must provide a SNS topic"));
}

#[test]
fn test_invalid_action() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args([
        "-n",
        "web",
        "-a",
        "idle",
        "-s",
        "MyTopic",
        "--action",
        "Hibernate",
    ]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Valid actions are Terminate, Stop, or Reboot",
    ));
}

#[test]
fn test_single_dash_action_is_the_action_flag() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args([
        "-n",
        "web",
        "-a",
        "idle",
        "-s",
        "MyTopic",
        "-action=Hibernate",
    ]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Valid actions are Terminate, Stop, or Reboot, got 'Hibernate'",
    ));
}

#[test]
fn test_running_conflicts_with_no_running() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args([
        "-n",
        "web",
        "-a",
        "idle",
        "-s",
        "MyTopic",
        "-r",
        "--no-running",
    ]);

    // Assert
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_invalid_period() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-n", "web", "-a", "idle", "-s", "MyTopic", "-p", "90"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Valid periods are 1, 5, 10, 30, or multiples of 60",
    ));
}

#[test]
fn test_negative_period() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["-n", "web", "-a", "idle", "-s", "MyTopic", "-p", "-60"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Valid periods are 1, 5, 10, 30, or multiples of 60, got -60",
    ));
}

#[test]
fn test_missing_config_file() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.args(["--config", "/nonexistent/cwalarm.toml", "-n", "web"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Failed to read config file /nonexistent/cwalarm.toml",
    ));
}

#[test]
fn test_config_file_validated_after_merge() {
    // Arrange
    let mut config_file = tempfile::NamedTempFile::new().expect("Failed to create a temp file");
    config_file
        .write_all(b"[alarm]\nprefix = \"idle\"\nsns_topic = \"MyTopic\"\nperiod = 45\n")
        .expect("Failed to write to file");

    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin
        .arg("--config")
        .arg(config_file.path())
        .args(["-n", "web"]);

    // Assert
    cmd.assert().failure().stderr(predicate::str::contains(
        "Valid periods are 1, 5, 10, 30, or multiples of 60, got 45",
    ));
}

#[test]
fn test_help() {
    // Arrange
    let mut cwalarm_bin = cwalarm();

    // Act
    let cmd = cwalarm_bin.arg("--help");

    // Assert
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Alarm name prefix"));
}
