//! CLI smoke tests for the holo-server binary
//!
//! Every invocation gets its own HOME so the default home directory never
//! lands in the developer's real one.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tempfile::TempDir;

fn server_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_holo-server"));
    cmd.env("HOME", home)
        .env_remove("APP__DATABASE__URL")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_holo_server(home: &Path, args: &[&str]) -> Output {
    server_cmd(home)
        .args(args)
        .output()
        .expect("Failed to execute holo-server")
}

fn write_config(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("holo-server.yaml");
    std::fs::write(&path, body).expect("Failed to write config file");
    path.to_string_lossy().into_owned()
}

fn valid_config(dir: &TempDir) -> String {
    let home = dir.path().join("home");
    write_config(
        dir,
        &format!(
            r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 8000

database:
  url: "sqlite::memory:"

logging:
  default:
    console_level: info
    file: "logs/holo-server.log"
    file_level: debug
    max_backups: 2
    max_size_mb: 10

modules:
  api_ingress:
    bind_addr: "127.0.0.1:0"
    enable_docs: true
"#,
            home.display()
        ),
    )
}

#[test]
fn test_cli_help_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_holo_server(tmp.path(), &["--help"]);

    assert!(output.status.success(), "Help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("holo-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    for word in ["run", "check", "migrate", "--config", "--mock", "--print-config"] {
        assert!(stdout.contains(word), "help should mention {word}");
    }
}

#[test]
fn test_cli_version_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_holo_server(tmp.path(), &["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("holo-server"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_invalid_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_holo_server(tmp.path(), &["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "{stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let tmp = TempDir::new().unwrap();
    let output = run_holo_server(tmp.path(), &["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "{stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, "invalid: yaml: content: [unclosed");

    let output = run_holo_server(tmp.path(), &["--config", &config, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "{stderr}");
}

#[test]
fn test_cli_config_validation_unknown_key() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, "server:\n  host: 127.0.0.1\n  prot: 8000\n");

    let output = run_holo_server(tmp.path(), &["--config", &config, "check"]);
    assert!(!output.status.success(), "Unknown keys should be rejected");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let tmp = TempDir::new().unwrap();
    let config = valid_config(&tmp);

    let output = run_holo_server(tmp.path(), &["--config", &config, "check"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Config check should pass: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("Bind address: 127.0.0.1:0"));
}

#[test]
fn test_cli_check_rejects_unknown_database_scheme() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, "database:\n  url: \"mysql://holo@localhost/holo\"\n");

    let output = run_holo_server(tmp.path(), &["--config", &config, "check"]);
    assert!(!output.status.success(), "mysql DSN should be rejected");
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let tmp = TempDir::new().unwrap();
    let config = valid_config(&tmp);

    let output = run_holo_server(tmp.path(), &["--config", &config, "--port", "9123", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "{stdout}");
}

#[test]
fn test_cli_env_overrides_database_url() {
    let tmp = TempDir::new().unwrap();
    let config = valid_config(&tmp);

    let output = server_cmd(tmp.path())
        .env("APP__DATABASE__URL", "sqlite://from-env.db")
        .args(["--config", &config, "--print-config"])
        .output()
        .expect("Failed to execute holo-server");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sqlite://from-env.db"), "{stdout}");
}

#[test]
fn test_cli_mock_replaces_database() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, "database:\n  url: \"postgres://holo:holo@db:5432/holo\"\n");

    let output = run_holo_server(tmp.path(), &["--config", &config, "--mock", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sqlite::memory:"), "{stdout}");
}

#[test]
fn test_cli_migrate_with_mock_database() {
    let tmp = TempDir::new().unwrap();
    let config = valid_config(&tmp);

    let output = run_holo_server(tmp.path(), &["--config", &config, "migrate"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "migrate should succeed: {stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Migrations applied"));
}

#[test]
fn test_cli_run_starts_and_keeps_serving() {
    let tmp = TempDir::new().unwrap();
    let config = valid_config(&tmp);

    let mut child = server_cmd(tmp.path())
        .args(["--config", &config, "run"])
        .spawn()
        .expect("Failed to spawn holo-server");

    std::thread::sleep(Duration::from_secs(2));
    let early_exit = child.try_wait().expect("Failed to poll holo-server");
    let _ = child.kill();
    let output = child.wait_with_output().expect("Failed to collect output");

    assert!(
        early_exit.is_none(),
        "server exited early: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
