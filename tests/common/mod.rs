//! Shared helpers for CLI integration tests
//!
//! Every test runs against its own home, project and credentials file, and
//! points the client at a closed local port so nothing reaches a real backend.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Nothing listens on the discard port; requests fail fast
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9/api/v1";

pub struct TestEnv {
    home: TempDir,
    project: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("home dir"),
            project: TempDir::new().expect("project dir"),
        }
    }

    pub fn project_path(&self) -> &Path {
        self.project.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.project.path().join(".engage").join("config.toml")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.project.path().join("credentials.json")
    }

    /// `engage --project <project>` with an isolated environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("engage").expect("engage binary");
        cmd.env("HOME", self.home.path())
            .env("XDG_DATA_HOME", self.home.path().join("data"))
            .env("ENGAGE_API_BASE_URL", UNREACHABLE_API)
            .env_remove("RUST_LOG")
            .arg("--project")
            .arg(self.project.path());
        cmd
    }

    /// Project config that stores credentials inside the temp project
    pub fn write_config(&self) {
        let path = self.config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let content = format!(
            "[api]\nbase_url = \"{}\"\ntimeout_secs = 5\n\n[storage]\ncredentials_path = \"{}\"\n",
            UNREACHABLE_API,
            self.credentials_path().display()
        );
        fs::write(path, content).unwrap();
    }

    /// Seed a signed-in session
    pub fn write_session(&self, user_json: &str) {
        let credentials = serde_json::json!({
            "authToken": "T1",
            "refreshToken": "R1",
            "user": user_json,
        });
        fs::write(self.credentials_path(), credentials.to_string()).unwrap();
    }

    pub fn read_credentials(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.credentials_path()).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}
