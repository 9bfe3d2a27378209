use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("rota").expect("Failed to find rota binary");

        // Run inside the temp dir so no stray rota.toml is picked up
        cmd.current_dir(self.temp_dir.path());
        cmd.env("ROTA_DATABASE_PATH", &self.db_path);
        cmd.env("ROTA_TIMEZONE", "UTC");
        cmd.env_remove("ROTA_FAMILY_ID");
        cmd.env_remove("ROTA_MEMBER");
        cmd.env_remove("RUST_LOG");

        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command and returns its stdout
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }

    /// Dishes at 18:00 for alice every Monday, bob as the second member.
    pub fn household(&self) {
        for args in TestFixtures::household_args() {
            self.run_success(&args);
        }
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// A Monday in an even ISO week
    pub const MONDAY: &'static str = "2025-08-18";

    pub fn household_args() -> Vec<Vec<&'static str>> {
        vec![
            vec!["task", "add", "Dishes", "--at", "18:00", "--duration", "30"],
            vec!["member", "add", "alice"],
            vec!["member", "add", "bob"],
            vec!["day", "add", "Weekday"],
            vec!["day", "item", "Weekday", "Dishes", "--member", "alice"],
            vec!["week", "add", "Regular", "--default"],
            vec!["week", "set-day", "Regular", "mon", "Weekday"],
        ]
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    pub fn created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").or(predicate::str::contains("Created"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
