//! Integration tests for CLI output behavior
//!
//! Every test runs the binary with HOME and the working directory pointed at
//! an empty temp dir so no real config file leaks in.

use std::path::Path;
use std::process::{Command, Output};

fn paperview(home: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_paperview"));
    command
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("PAPERVIEW_LOG_DIR")
        .env_remove("CLOUDFLARE_API_TOKEN")
        .env_remove("CLOUDFLARE_ZONE_ID")
        .env_remove("CLOUDFLARE_RECORD_ID")
        .env_remove("CLOUDFLARE_DOMAIN");
    command
}

fn run(command: &mut Command) -> Output {
    command.output().expect("Failed to execute paperview")
}

fn stdout_table(output: &Output) -> toml::Table {
    assert!(
        output.status.success(),
        "paperview failed with exit code {:?}. stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .parse::<toml::Table>()
        .expect("stdout should be valid TOML")
}

#[test]
fn test_config_prints_defaults_as_toml() {
    let home = tempfile::tempdir().unwrap();
    let output = run(&mut paperview(home.path(), &["config"]));

    let table = stdout_table(&output);
    assert_eq!(table["schedule"]["quick_interval_secs"].as_integer(), Some(15));
    assert_eq!(table["schedule"]["full_interval_secs"].as_integer(), Some(1800));
    assert_eq!(table["server"]["port"].as_integer(), Some(5002));
    assert_eq!(table["display"]["mode"].as_str(), Some("mono"));
}

#[test]
fn test_config_stdout_has_no_log_lines() {
    let home = tempfile::tempdir().unwrap();
    let output = run(&mut paperview(home.path(), &["-v", "config"]));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        assert!(
            !line.trim_start().starts_with('{'),
            "stdout should not contain JSON log lines: {line}"
        );
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("core.app.startup_completed"));
}

#[test]
fn test_quiet_suppresses_info_logs() {
    let home = tempfile::tempdir().unwrap();
    let output = run(&mut paperview(home.path(), &["-q", "config"]));

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("core.app.startup_completed"),
        "quiet mode should not log info events: {stderr}"
    );
}

#[test]
fn test_explicit_config_overrides_defaults() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("custom.toml");
    std::fs::write(
        &path,
        "[schedule]\nquick_interval_secs = 20\n\n[display]\nmode = \"gray4\"\n",
    )
    .unwrap();

    let output = run(&mut paperview(
        home.path(),
        &["config", "--config", path.to_str().unwrap()],
    ));

    let table = stdout_table(&output);
    assert_eq!(table["schedule"]["quick_interval_secs"].as_integer(), Some(20));
    assert_eq!(table["display"]["mode"].as_str(), Some("gray4"));
}

#[test]
fn test_project_config_is_picked_up() {
    let home = tempfile::tempdir().unwrap();
    let project = home.path().join(".paperview");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("config.toml"), "[server]\nport = 6001\n").unwrap();

    let output = run(&mut paperview(home.path(), &["config"]));

    let table = stdout_table(&output);
    assert_eq!(table["server"]["port"].as_integer(), Some(6001));
}

#[test]
fn test_config_redacts_api_token() {
    let home = tempfile::tempdir().unwrap();
    let output = run(paperview(home.path(), &["config"])
        .env("CLOUDFLARE_API_TOKEN", "super-secret-token")
        .env("CLOUDFLARE_DOMAIN", "frame.example.com"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(!stdout.contains("super-secret-token"));
    assert!(stdout.contains("frame.example.com"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = run(&mut paperview(
        home.path(),
        &["config", "--config", "does-not-exist.toml"],
    ));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "stderr: {stderr}");
    assert_eq!(
        stderr.matches("Config file not found").count(),
        1,
        "error should be reported once: {stderr}"
    );
    assert!(!stderr.contains("Error:"), "stderr: {stderr}");
}

#[test]
fn test_invalid_schedule_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("bad.toml");
    std::fs::write(
        &path,
        "[schedule]\nquick_interval_secs = 600\nfull_interval_secs = 60\n",
    )
    .unwrap();

    let output = run(&mut paperview(
        home.path(),
        &["config", "--config", path.to_str().unwrap()],
    ));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"), "stderr: {stderr}");
}

#[test]
fn test_run_rejects_port_zero_before_touching_hardware() {
    let home = tempfile::tempdir().unwrap();
    let output = run(&mut paperview(home.path(), &["run", "--port", "0"]));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("server.port cannot be 0"), "stderr: {stderr}");
}

#[test]
fn test_capture_failure_is_logged_and_reported_once() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("config.toml");
    std::fs::write(
        &path,
        "[renderer]\ndriver_path = \"/nonexistent/paperview-test-chromedriver\"\n",
    )
    .unwrap();
    let out = home.path().join("capture.png");

    let output = run(&mut paperview(
        home.path(),
        &[
            "capture",
            "--config",
            path.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
    ));

    assert!(!output.status.success());
    assert!(!out.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let reported: Vec<&str> = stderr
        .lines()
        .filter(|line| line.starts_with("paperview:"))
        .collect();
    assert_eq!(reported.len(), 1, "stderr: {stderr}");
    assert!(reported[0].contains("chromedriver binary not found"));
    assert!(!stderr.contains("Error:"), "stderr: {stderr}");

    let logged = stderr
        .lines()
        .find(|line| line.contains("core.app.error_occurred"))
        .unwrap_or_else(|| panic!("no error event logged: {stderr}"));
    assert!(logged.contains("capture"), "{logged}");
}
