//! CLI smoke tests: verify basic binary behavior.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn cli_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_soma"));
    cmd.arg("--config")
        .arg("/tmp/nonexistent_soma_config_12345.toml")
        .env_remove("RUST_LOG");
    cmd
}

fn run_with_input(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run");
    // the binary may exit before reading, e.g. on a bad config
    let _ = child.stdin.take().expect("stdin").write_all(input.as_bytes());
    child.wait_with_output().expect("wait")
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "Expected usage info in --help output"
    );
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("soma"), "Expected crate name in --version output");
}

#[test]
fn test_malformed_config_is_fatal() {
    let dir = std::env::temp_dir();
    for (name, body) in [
        ("type", "[arousal]\norgasm_threshold = \"very high\"\n"),
        ("typo", "[arousal]\norgasm_treshold = 0.3\n"),
        ("order", "[arousal]\nlow_threshold = 0.9\n"),
    ] {
        let path = dir.join(format!("soma_cli_bad_{}_{}.toml", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_soma"));
        cmd.arg("--config").arg(&path).env_remove("RUST_LOG");
        let output = run_with_input(cmd, "kiss@lips\n");
        let _ = std::fs::remove_file(&path);

        assert!(!output.status.success(), "{} config should be rejected", name);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains("<<phase:"), "no step should run: {}", stdout);
    }
}

#[test]
fn test_directive_prints_tags() {
    let output = run_with_input(
        cli_bin(),
        "breath@neck_front_left airflow=10 humidity=0.9 temp=35\nquit\n",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<<phase:rest>>"), "stdout: {}", stdout);
    assert!(stdout.contains("<<mode:breath>>"), "stdout: {}", stdout);
}

#[test]
fn test_json_output_and_errors_keep_going() {
    let mut cmd = cli_bin();
    cmd.arg("--json");
    let output = run_with_input(cmd, "stroke@elbow\nkiss@lips wet=0.5\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0]["error"].as_str().unwrap().contains("elbow"));
    assert_eq!(lines[1]["tags"][0], "<<phase:rest>>");
    assert_eq!(lines[1]["tags"][2], "<<wet:med>>");
}

#[test]
fn test_prose_and_state_commands() {
    let output = run_with_input(cli_bin(), "gently stroke my neck\nstate\nreset\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<<mode:stroke>>"), "stdout: {}", stdout);
    assert!(stdout.contains("phase:rest"), "stdout: {}", stdout);
    assert!(stdout.contains("session reset"));
}

#[test]
fn test_session_file_is_written() {
    let path = std::env::temp_dir().join(format!("soma_cli_session_{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut cmd = cli_bin();
    cmd.arg("--session").arg(&path);
    let output = run_with_input(cmd, "kiss@lips\n");
    assert!(output.status.success());

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["clock"], 1);
    assert!(saved["zones"]["lips"].is_object());

    // resuming continues the clock
    let mut cmd = cli_bin();
    cmd.arg("--session").arg(&path);
    let output = run_with_input(cmd, "kiss@lips\n");
    assert!(output.status.success());
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["clock"], 2);
    let _ = std::fs::remove_file(&path);
}
