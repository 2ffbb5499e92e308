//! Dependency manager invocation.
//!
//! Resolution itself is left to the external tool; this module only runs the
//! configured update commands in order inside the checkout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::error::CommandError;
use crate::process;

/// A single program invocation, e.g. `poetry lock`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Something that can refresh the pinned dependencies in the working tree
#[async_trait]
pub trait DependencyManager: Send + Sync {
    async fn update_dependencies(&self) -> Result<(), CommandError>;
}

/// Runs a fixed list of commands; the first failure stops the rest
#[derive(Debug, Clone)]
pub struct CommandDependencyManager {
    repo: PathBuf,
    commands: Vec<CommandSpec>,
}

impl CommandDependencyManager {
    pub fn new(repo: impl Into<PathBuf>, commands: Vec<CommandSpec>) -> Self {
        Self {
            repo: repo.into(),
            commands,
        }
    }
}

#[async_trait]
impl DependencyManager for CommandDependencyManager {
    #[instrument(skip_all, fields(repo = %self.repo.display()))]
    async fn update_dependencies(&self) -> Result<(), CommandError> {
        for command in &self.commands {
            info!(%command, "Running dependency update command");
            let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
            let output = process::run(&command.program, &args, &self.repo).await?;
            if !output.is_empty() {
                debug!(%command, output = %output, "Command output");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("poetry", &["run", "python", "requirements.py"]);
        assert_eq!(spec.to_string(), "poetry run python requirements.py");

        let spec = CommandSpec::new("make", &[]);
        assert_eq!(spec.to_string(), "make");
    }

    #[test]
    fn test_command_spec_args_default() {
        let spec: CommandSpec = serde_json::from_str(r#"{"program": "poetry"}"#).unwrap();
        assert_eq!(spec.program, "poetry");
        assert!(spec.args.is_empty());
    }

    #[tokio::test]
    async fn test_commands_run_in_order_in_repo() {
        let dir = TempDir::new().unwrap();
        let manager = CommandDependencyManager::new(
            dir.path(),
            vec![
                CommandSpec::new("sh", &["-c", "echo first >> order.txt"]),
                CommandSpec::new("sh", &["-c", "echo second >> order.txt"]),
            ],
        );

        manager.update_dependencies().await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("order.txt")).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_commands() {
        let dir = TempDir::new().unwrap();
        let manager = CommandDependencyManager::new(
            dir.path(),
            vec![
                CommandSpec::new("sh", &["-c", "echo 'resolver exploded' >&2; exit 1"]),
                CommandSpec::new("sh", &["-c", "touch should-not-exist"]),
            ],
        );

        let err = manager.update_dependencies().await.unwrap_err();
        assert_eq!(err.stderr(), Some("resolver exploded"));
        assert!(!dir.path().join("should-not-exist").exists());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let manager = CommandDependencyManager::new(
            dir.path(),
            vec![CommandSpec::new("no-such-package-manager-xyz", &["lock"])],
        );

        let err = manager.update_dependencies().await.unwrap_err();
        assert!(matches!(err, CommandError::NotInstalled { .. }));
    }
}
