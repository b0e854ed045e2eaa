//! Tests that run the `cmdgate` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn cmdgate(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdgate"))
        .arg("--config")
        .arg(config_dir.join("config.toml"))
        .arg("--permissions")
        .arg(config_dir.join("permissions"))
        .args(args)
        .env_remove("CMDGATE_MAINTAINER")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run cmdgate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("permissions")).unwrap();
    dir
}

#[test]
fn test_nothing_to_do_fails() {
    let dir = setup();
    let output = cmdgate(dir.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn test_check_prints_canonical_policies() {
    let dir = setup();
    fs::write(
        dir.path().join("permissions").join("Music.prm"),
        "whitelist guild 1\n<add>\nwhitelist role 2\n",
    )
    .unwrap();

    let output = cmdgate(dir.path(), &["--check"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("# Music"));
    assert!(text.contains("whitelist guild 1"));
    assert!(text.contains("<method: add>"));
    assert!(text.contains("Parsed 1/1 permission files"));
}

#[test]
fn test_check_fails_on_broken_document() {
    let dir = setup();
    fs::write(dir.path().join("permissions").join("Good.prm"), "whitelist user 1\n").unwrap();
    fs::write(dir.path().join("permissions").join("Bad.prm"), "<method: add\n").unwrap();

    let output = cmdgate(dir.path(), &["--check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Parsed 1/2 permission files"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bad.prm"));
}

#[test]
fn test_send_help_as_text() {
    let dir = setup();
    let output = cmdgate(dir.path(), &["--send", "!help"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("> !help\n"));
    assert!(text.contains("Page 1/1:"));
}

#[test]
fn test_send_json_reports_outcomes() {
    let dir = setup();
    let output = cmdgate(
        dir.path(),
        &["--output", "json", "--send", "!nope", "--send", "!permissions"],
    );
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json[0]["outcome"], "not_found");
    assert_eq!(json[0]["replies"][0], "Command not found.");
    assert_eq!(json[1]["outcome"], "denied");
}

#[test]
fn test_maintainer_may_inspect_permissions() {
    let dir = setup();
    fs::write(dir.path().join("permissions").join("Music.prm"), "whitelist guild 1\n").unwrap();
    fs::write(dir.path().join("config.toml"), "maintainer = 42\n").unwrap();

    let output = cmdgate(dir.path(), &["--user", "42", "--send", "!permissions Music"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("whitelist guild 1"));
}

#[test]
fn test_script_file() {
    let dir = setup();
    let script = dir.path().join("messages.txt");
    fs::write(&script, "# warm up\n!help\n\nhello there\n").unwrap();

    let output = cmdgate(dir.path(), &["--output", "json", "--script", script.to_str().unwrap()]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["outcome"], "not_a_command");
}
