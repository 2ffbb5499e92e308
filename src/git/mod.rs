//! Version control operations used by the update workflow.
//!
//! Only the handful of operations the workflow needs are exposed, behind the
//! [`Vcs`] trait so the runner can be exercised without a real repository.

mod cli;

pub use cli::GitCli;

use async_trait::async_trait;

use crate::error::CommandError;

/// Whether the working tree differs from its last commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStatus {
    Clean,
    Dirty,
}

impl TreeStatus {
    /// Interpret `git status --porcelain` output
    pub fn from_porcelain(output: &str) -> Self {
        if output.trim().is_empty() {
            TreeStatus::Clean
        } else {
            TreeStatus::Dirty
        }
    }

    pub fn is_dirty(self) -> bool {
        self == TreeStatus::Dirty
    }
}

/// Identity recorded on the update commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Version control operations needed by the workflow
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Fetch from `remote`, check out `branch` and rebase it onto the remote copy
    async fn sync_main(&self, remote: &str, branch: &str) -> Result<(), CommandError>;

    /// Create `name` from the current HEAD, deleting any existing local branch first
    async fn create_or_reset_branch(&self, name: &str) -> Result<(), CommandError>;

    /// Report whether the working tree has uncommitted changes
    async fn status(&self) -> Result<TreeStatus, CommandError>;

    /// Stage everything and commit it as `author`
    async fn commit_all(&self, message: &str, author: &Author) -> Result<(), CommandError>;

    /// Push `branch` to `remote`, overwriting whatever is there
    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), CommandError>;
}
