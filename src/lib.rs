//! update-requirements - refresh a project's dependency lockfile and propose
//! the result as a pull request.
//!
//! The binary wires [`config::Config`] into a [`workflow::Workflow`] backed by
//! the git CLI, the configured dependency commands and the GitHub CLI.

pub mod config;
pub mod deps;
pub mod error;
pub mod git;
pub mod logging;
pub mod process;
pub mod review;
pub mod workflow;

use std::path::Path;
use std::sync::Arc;

use config::Config;
use deps::CommandDependencyManager;
use git::GitCli;
use review::GhCli;
use workflow::Workflow;

pub use error::{CommandError, WorkflowError, WorkflowStep};
pub use workflow::{Outcome, WorkflowSettings};

/// Build a workflow that drives the real command-line tools in `repo`
pub fn workflow_for(config: &Config, repo: &Path) -> Workflow {
    Workflow::new(
        Arc::new(GitCli::new(repo)),
        Arc::new(CommandDependencyManager::new(
            repo,
            config.dependencies.commands.clone(),
        )),
        Arc::new(GhCli::new(repo)),
        config.workflow_settings(),
    )
}
