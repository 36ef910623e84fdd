//! Startup tests for the `phase2-search` binary.
//!
//! Every case here fails before a socket is bound or a remote service is
//! contacted. The embeddings endpoint, where one is needed, is a closed
//! local port.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const CREDENTIALS: [&str; 3] = ["SUPABASE_DB_PASSWORD", "OPENAI_API_KEY", "DATABASE_URL"];

fn run(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_phase2-search"));
    for key in CREDENTIALS.iter().chain(["PORT", "MATCH_THRESHOLD", "RUST_LOG"].iter()) {
        cmd.env_remove(key);
    }
    cmd.envs(env.iter().copied()).args(args);
    cmd.output()
        .unwrap_or_else(|e| panic!("Failed to run phase2-search: {}", e))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_missing_db_password_exits() {
    let output = run(&["serve"], &[("OPENAI_API_KEY", "sk-test")]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("SUPABASE_DB_PASSWORD"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_missing_openai_key_exits() {
    let output = run(&["serve"], &[("SUPABASE_DB_PASSWORD", "pw")]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("OPENAI_API_KEY"));
}

#[test]
fn test_invalid_threshold_exits() {
    let output = run(
        &["search", "homepage"],
        &[
            ("SUPABASE_DB_PASSWORD", "pw"),
            ("OPENAI_API_KEY", "sk-test"),
            ("MATCH_THRESHOLD", "very"),
        ],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("MATCH_THRESHOLD"));
}

#[test]
fn test_invalid_table_in_config_file_exits() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("phase2.toml");
    fs::write(&path, "[db]\ntable = \"pages; DROP TABLE pages\"\n").unwrap();

    let output = run(
        &["--config", path.to_str().unwrap(), "serve"],
        &[("SUPABASE_DB_PASSWORD", "pw"), ("OPENAI_API_KEY", "sk-test")],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("db.table"));
}

#[test]
fn test_missing_config_file_exits() {
    let output = run(
        &["--config", "/nonexistent/phase2.toml", "serve"],
        &[("SUPABASE_DB_PASSWORD", "pw"), ("OPENAI_API_KEY", "sk-test")],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read config file"));
}

#[test]
fn test_search_logs_stay_off_stdout() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("phase2.toml");
    fs::write(&path, "[embedding]\nbase_url = \"http://127.0.0.1:9/v1\"\n").unwrap();

    let output = run(
        &[
            "--config",
            path.to_str().unwrap(),
            "search",
            "homepage",
            "--limit",
            "50",
        ],
        &[("SUPABASE_DB_PASSWORD", "pw"), ("OPENAI_API_KEY", "sk-test")],
    );
    assert!(!output.status.success());
    assert!(
        stdout(&output).is_empty(),
        "stdout: {}",
        stdout(&output)
    );

    let err = stderr(&output);
    assert!(err.contains("limit above maximum"), "stderr: {}", err);
    assert!(err.contains("Failed to search Phase2 content"));
    assert!(!err.contains('\x1b'), "stderr has ANSI escapes: {}", err);
}
