//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the skein binary in the specified directory.
///
/// Colors are disabled so assertions can match plain text.
pub fn run_skein_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_skein"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "skein=warn")
        .output()
        .expect("Failed to execute skein binary")
}

/// Run skein, assert success, and return stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_skein_in_dir(dir, args);
    assert!(
        output.status.success(),
        "skein {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run skein with `--json`, assert success, and parse stdout.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let stdout = run_ok(dir, &full);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

/// Add a dependency through the CLI and return its generated ID.
pub fn add_dependency(dir: &Path, source: &str, target: &str, dep_type: &str) -> String {
    let created = run_json(
        dir,
        &["--actor", "tester", "dep", "add", source, target, "-t", dep_type],
    );
    created["value"]["id"]
        .as_str()
        .expect("created dependency has an id")
        .to_string()
}
