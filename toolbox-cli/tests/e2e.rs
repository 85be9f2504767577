//! End-to-end tests for the toolbox binary
//!
//! Gated behind the `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p toolbox-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn toolbox(settings: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_toolbox"))
        .arg("--settings")
        .arg(settings)
        .args(args)
        .env("TOOLBOX_PROJECT_CONFIG_DIR", settings.parent().unwrap())
        .output()
        .expect("Failed to run toolbox")
}

#[test]
fn toolbox_help_works() {
    let output = Command::new(env!("CARGO_BIN_EXE_toolbox"))
        .arg("--help")
        .output()
        .expect("Failed to run toolbox --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("plugin"));
    assert!(stdout.contains("run"));
}

#[test]
fn toolbox_enable_then_run() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("data.json");

    let output = toolbox(&settings, &["plugin", "enable", "copy-wiki-link"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Enabled Wiki link getter"));

    let saved = std::fs::read_to_string(&settings).unwrap();
    assert!(saved.contains("\"copy-wiki-link\""));

    let output = toolbox(
        &settings,
        &["run", "copy-wiki-link:copy-wiki-link", "--active", "notes/idea.md"],
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "[[idea]]\n");
}

#[test]
fn toolbox_unknown_command_fails() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("data.json");

    let output = toolbox(&settings, &["run", "nope:nothing"]);
    assert!(!output.status.success());
}
