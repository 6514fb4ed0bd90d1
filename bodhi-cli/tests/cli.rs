use std::process::{Command, Output};
use tempfile::TempDir;

const RELAY_ENV: [&str; 4] = ["GEMINI_API_KEY", "PORT", "HOST", "RUST_LOG"];

fn bodhi_guide(dir: &TempDir, envs: &[(&str, &str)], args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bodhi-guide"));
    cmd.current_dir(dir.path())
        .arg("--config-dir")
        .arg(dir.path())
        .args(args);
    for key in RELAY_ENV {
        cmd.env_remove(key);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to run bodhi-guide")
}

#[test]
fn test_config_masks_api_key() {
    let dir = TempDir::new().unwrap();
    let output = bodhi_guide(
        &dir,
        &[("GEMINI_API_KEY", "AIzaSecretKey1234"), ("PORT", "7070")],
        &["config"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("config is JSON");
    assert_eq!(json["provider"]["api_key"], "****1234");
    assert_eq!(json["server"]["port"], 7070);
    assert!(!stdout.contains("AIzaSecretKey1234"));
}

#[test]
fn test_ask_requires_api_key() {
    let dir = TempDir::new().unwrap();
    let output = bodhi_guide(&dir, &[], &["ask", "--message", "Hello"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GEMINI_API_KEY"), "stderr: {stderr}");
}

#[test]
fn test_ask_rejects_blank_message() {
    let dir = TempDir::new().unwrap();
    let output = bodhi_guide(
        &dir,
        &[("GEMINI_API_KEY", "test-key")],
        &["ask", "--message", "   "],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("No message provided").count(),
        1,
        "stderr: {stderr}"
    );
}

#[test]
fn test_ask_reports_generic_upstream_error() {
    let dir = TempDir::new().unwrap();
    let output = bodhi_guide(
        &dir,
        &[
            ("GEMINI_API_KEY", "test-key"),
            ("BODHI_GUIDE__PROVIDER__API_BASE", "http://127.0.0.1:9"),
            ("BODHI_GUIDE__PROVIDER__TIMEOUT_SECS", "2"),
        ],
        &["ask", "--message", "Hello"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr
            .matches("Sorry, I encountered an error. Please try again.")
            .count(),
        1,
        "stderr: {stderr}"
    );
}
