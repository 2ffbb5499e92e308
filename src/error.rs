//! Error types for external commands and workflow steps.

use std::fmt;

use thiserror::Error;

/// Errors from running an external program (git, gh, the dependency manager)
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{program} is not installed or not in PATH")]
    NotInstalled { program: String },

    #[error("failed to execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {subcommand} failed ({}): {stderr}", exit_code_label(.code))]
    Failed {
        program: String,
        subcommand: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl CommandError {
    /// Name of the program that failed
    pub fn program(&self) -> &str {
        match self {
            CommandError::NotInstalled { program }
            | CommandError::Spawn { program, .. }
            | CommandError::Failed { program, .. } => program,
        }
    }

    /// Captured stderr, if the program ran to completion
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// One step of the update workflow, used for step markers and error attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Sync,
    Branch,
    UpdateDependencies,
    Status,
    Commit,
    Push,
    TriggerCi,
    OpenPullRequest,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::Sync => "sync",
            WorkflowStep::Branch => "branch",
            WorkflowStep::UpdateDependencies => "update-dependencies",
            WorkflowStep::Status => "status",
            WorkflowStep::Commit => "commit",
            WorkflowStep::Push => "push",
            WorkflowStep::TriggerCi => "trigger-ci",
            WorkflowStep::OpenPullRequest => "open-pull-request",
        };
        f.write_str(name)
    }
}

/// Errors that abort a workflow run
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("failed to sync {branch} with {remote}")]
    Sync {
        remote: String,
        branch: String,
        #[source]
        source: CommandError,
    },

    #[error("failed to create working branch '{branch}'")]
    Branch {
        branch: String,
        #[source]
        source: CommandError,
    },

    #[error("dependency update failed")]
    DependencyUpdate {
        #[source]
        source: CommandError,
    },

    #[error("failed to query working tree status")]
    Status {
        #[source]
        source: CommandError,
    },

    #[error("failed to {step} working branch '{branch}'")]
    CommitPush {
        step: WorkflowStep,
        branch: String,
        #[source]
        source: CommandError,
    },

    #[error("code review host failed during {step}")]
    ReviewHost {
        step: WorkflowStep,
        #[source]
        source: CommandError,
    },
}

impl WorkflowError {
    /// The step that was running when the error occurred
    pub fn step(&self) -> WorkflowStep {
        match self {
            WorkflowError::Sync { .. } => WorkflowStep::Sync,
            WorkflowError::Branch { .. } => WorkflowStep::Branch,
            WorkflowError::DependencyUpdate { .. } => WorkflowStep::UpdateDependencies,
            WorkflowError::Status { .. } => WorkflowStep::Status,
            WorkflowError::CommitPush { step, .. } | WorkflowError::ReviewHost { step, .. } => {
                *step
            }
        }
    }

    /// The underlying command failure
    pub fn command_error(&self) -> &CommandError {
        match self {
            WorkflowError::Sync { source, .. }
            | WorkflowError::Branch { source, .. }
            | WorkflowError::DependencyUpdate { source }
            | WorkflowError::Status { source }
            | WorkflowError::CommitPush { source, .. }
            | WorkflowError::ReviewHost { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(program: &str, subcommand: &str) -> CommandError {
        CommandError::Failed {
            program: program.to_string(),
            subcommand: subcommand.to_string(),
            code: Some(128),
            stderr: "fatal: unable to access remote".to_string(),
        }
    }

    #[test]
    fn test_command_error_display() {
        let err = failed("git", "fetch");
        assert_eq!(
            err.to_string(),
            "git fetch failed (exit code 128): fatal: unable to access remote"
        );

        let err = CommandError::Failed {
            program: "poetry".to_string(),
            subcommand: "lock".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_command_error_accessors() {
        let err = failed("gh", "pr");
        assert_eq!(err.program(), "gh");
        assert_eq!(err.stderr(), Some("fatal: unable to access remote"));

        let err = CommandError::NotInstalled {
            program: "gh".to_string(),
        };
        assert_eq!(err.program(), "gh");
        assert!(err.stderr().is_none());
    }

    #[test]
    fn test_workflow_error_step() {
        let err = WorkflowError::Sync {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            source: failed("git", "fetch"),
        };
        assert_eq!(err.step(), WorkflowStep::Sync);
        assert_eq!(err.to_string(), "failed to sync main with origin");

        let err = WorkflowError::CommitPush {
            step: WorkflowStep::Push,
            branch: "update_requirements".to_string(),
            source: failed("git", "push"),
        };
        assert_eq!(err.step(), WorkflowStep::Push);
        assert_eq!(
            err.to_string(),
            "failed to push working branch 'update_requirements'"
        );
    }

    #[test]
    fn test_workflow_error_source_chain() {
        use std::error::Error as _;

        let err = WorkflowError::DependencyUpdate {
            source: failed("poetry", "lock"),
        };
        let source = err.source().expect("source should be set");
        assert!(source.to_string().starts_with("poetry lock failed"));
        assert_eq!(err.command_error().program(), "poetry");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(WorkflowStep::UpdateDependencies.to_string(), "update-dependencies");
        assert_eq!(WorkflowStep::OpenPullRequest.to_string(), "open-pull-request");
        assert_eq!(WorkflowStep::TriggerCi.to_string(), "trigger-ci");
    }
}
