use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write as _;
use std::path::PathBuf;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn floe() -> Command {
    Command::cargo_bin("floe").unwrap()
}

#[test]
fn test_check_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "service:\n  title: integration\n");

    floe()
        .args(["check", "--config"])
        .arg(&file)
        .args(["--env-prefix", "FLOE_IT_"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

#[test]
fn test_check_invalid_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "service:\n  title: \"\"\n");

    floe()
        .args(["check", "--config"])
        .arg(&file)
        .args(["--env-prefix", "FLOE_IT_"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("service.title"));
}

#[test]
fn test_check_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "debug: false\n");

    floe()
        .args(["check", "--json", "--config"])
        .arg(&file)
        .args(["--env-prefix", "FLOE_IT_"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\": true"));
}

#[test]
fn test_check_strict_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "debug: false\n");
    let missing = dir.path().join("absent.yaml");

    floe()
        .args(["check", "--strict", "--config"])
        .arg(&file)
        .arg("--config")
        .arg(&missing)
        .args(["--env-prefix", "FLOE_IT_"])
        .assert()
        .failure();
}

#[test]
fn test_shell_pipes_stdin_and_exports_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "service:\n  title: from-shell-test\n");

    floe()
        .args(["shell", "--interface", "sh", "--config"])
        .arg(&file)
        .args(["--env-prefix", "FLOE_IT_"])
        .write_stdin("echo title=$FLOE_IT_SERVICE__TITLE\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("title=from-shell-test"));
}

#[test]
fn test_shell_propagates_exit_code() {
    floe()
        .args(["shell", "--interface", "sh", "--env-prefix", "FLOE_IT_"])
        .write_stdin("exit 7\n")
        .assert()
        .code(7);
}

#[test]
fn test_shell_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "app.yaml", "service:\n  title: \"\"\n");

    floe()
        .args(["shell", "--interface", "sh", "--config"])
        .arg(&file)
        .args(["--env-prefix", "FLOE_IT_"])
        .write_stdin("echo should-not-run\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("should-not-run").not());
}
