//! Common test utilities for recall integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's `~/.recall/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated recall home.
///
/// The `rc()` method returns a `Command` that sets `RECALL_HOME` per
/// invocation and clears the variables that would leak the caller's setup,
/// making tests parallel-safe.
pub struct TestEnv {
    pub home_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty home directory.
    pub fn new() -> Self {
        Self {
            home_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the rc binary bound to this environment.
    pub fn rc(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rc"));
        cmd.current_dir(self.home_dir.path());
        cmd.env("RECALL_HOME", self.home_dir.path());
        cmd.env_remove("RECALL_BACKEND");
        cmd.env_remove("RECALL_LOG");
        cmd.env_remove("TODOIST_API_TOKEN");
        cmd
    }

    /// Get the path to the home directory.
    pub fn home_path(&self) -> &Path {
        self.home_dir.path()
    }

    /// Path of the local reminder log.
    pub fn log_path(&self) -> PathBuf {
        self.home_path().join("reminders.jsonl")
    }

    /// Write config.kdl in the home directory.
    pub fn write_config(&self, kdl: &str) {
        std::fs::write(self.home_path().join("config.kdl"), kdl).unwrap();
    }

    /// Run `rc add` with extra arguments and return the new reminder's ID.
    pub fn add(&self, title: &str, extra: &[&str]) -> String {
        let output = self
            .rc()
            .arg("add")
            .arg(title)
            .args(extra)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "rc add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let json = parse_json(&output.stdout);
        json["id"].as_str().unwrap().to_string()
    }

    /// Run `rc list` with arguments and return the parsed JSON.
    pub fn list(&self, args: &[&str]) -> serde_json::Value {
        let output = self.rc().arg("list").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "rc list failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        parse_json(&output.stdout)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse command stdout as JSON.
pub fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap()
}

/// Titles from a `rc list` JSON result, in output order.
pub fn titles(list: &serde_json::Value) -> Vec<String> {
    list["reminders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}
