//! Common test utilities for qdl integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't read the
//! developer's real `~/qdl.json` or the config next to the test binary.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated config locations.
///
/// Each `TestEnv` creates three temporary directories standing in for the
/// working directory, the home directory and the executable directory. The
/// `qdl()` method returns a `Command` that points the binary at them via
/// `QDL_HOME_DIR`/`QDL_EXE_DIR` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub working_dir: TempDir,
    pub home_dir: TempDir,
    pub exe_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            working_dir: TempDir::new().unwrap(),
            home_dir: TempDir::new().unwrap(),
            exe_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the qdl binary with isolated config locations.
    pub fn qdl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_qdl"));
        cmd.current_dir(self.working_dir.path());
        cmd.env("QDL_HOME_DIR", self.home_dir.path());
        cmd.env("QDL_EXE_DIR", self.exe_dir.path());
        cmd.env_remove("QDL_APIKEY");
        cmd
    }

    /// Path of the working-directory config file.
    pub fn working_config(&self) -> std::path::PathBuf {
        self.working_dir.path().join("qdl.json")
    }

    /// Path of the home-directory config file.
    pub fn home_config(&self) -> std::path::PathBuf {
        self.home_dir.path().join("qdl.json")
    }

    /// Path of the executable-directory config file.
    pub fn exe_config(&self) -> std::path::PathBuf {
        self.exe_dir.path().join("qdl.json")
    }

    /// Write a config file at an arbitrary location.
    pub fn write_config(&self, path: &Path, json: &str) {
        std::fs::write(path, json).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
