//! Git CLI wrapper for the update workflow.
//!
//! Uses the git CLI directly (rather than libgit2) so that hooks, credential
//! helpers and the user's git configuration all apply.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

use super::{Author, TreeStatus, Vcs};
use crate::error::CommandError;
use crate::process;

/// Git command wrapper bound to a repository checkout
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Execute a git command and return stdout
    async fn run_git(&self, args: &[&str]) -> Result<String, CommandError> {
        process::run("git", args, &self.repo).await
    }

    /// Execute a git command, returning Ok(()) on success
    async fn run_git_silent(&self, args: &[&str]) -> Result<(), CommandError> {
        process::run_silent("git", args, &self.repo).await
    }

    /// Get the current branch name
    #[instrument(skip_all, fields(repo = %self.repo.display()))]
    pub async fn current_branch(&self) -> Result<String, CommandError> {
        self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    /// Get the HEAD commit SHA
    #[instrument(skip_all, fields(repo = %self.repo.display()))]
    pub async fn head_commit(&self) -> Result<String, CommandError> {
        self.run_git(&["rev-parse", "HEAD"]).await
    }

    /// Check if a local branch exists
    #[instrument(skip_all, fields(repo = %self.repo.display(), branch))]
    pub async fn local_branch_exists(&self, branch: &str) -> Result<bool, CommandError> {
        let refname = format!("refs/heads/{branch}");
        match self
            .run_git(&["rev-parse", "--verify", "--quiet", &refname])
            .await
        {
            Ok(_) => Ok(true),
            // --quiet exits 1 with no output when the ref is missing
            Err(CommandError::Failed { code: Some(1), .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Drop uncommitted changes and untracked files left in the checkout
    #[instrument(skip_all, fields(repo = %self.repo.display()))]
    pub async fn discard_local_changes(&self) -> Result<(), CommandError> {
        self.run_git_silent(&["reset", "--hard", "--quiet"]).await?;
        self.run_git_silent(&["clean", "-fd", "--quiet"]).await
    }

    /// Fetch from remote
    #[instrument(skip_all, fields(repo = %self.repo.display(), remote))]
    pub async fn fetch(&self, remote: &str) -> Result<(), CommandError> {
        self.run_git_silent(&["fetch", remote]).await
    }

    /// Check out an existing branch
    #[instrument(skip_all, fields(repo = %self.repo.display(), branch))]
    pub async fn checkout(&self, branch: &str) -> Result<(), CommandError> {
        self.run_git_silent(&["checkout", branch]).await
    }

    /// Rebase the current branch onto `remote/branch`
    #[instrument(skip_all, fields(repo = %self.repo.display(), remote, branch))]
    pub async fn pull_rebase(&self, remote: &str, branch: &str) -> Result<(), CommandError> {
        self.run_git_silent(&["pull", "--rebase", remote, branch])
            .await
    }

    /// Delete a local branch
    #[instrument(skip_all, fields(repo = %self.repo.display(), branch, force))]
    pub async fn delete_branch(&self, branch: &str, force: bool) -> Result<(), CommandError> {
        let flag = if force { "-D" } else { "-d" };
        self.run_git_silent(&["branch", flag, branch]).await
    }

    /// Create a branch from HEAD and switch to it
    #[instrument(skip_all, fields(repo = %self.repo.display(), branch))]
    pub async fn checkout_new_branch(&self, branch: &str) -> Result<(), CommandError> {
        self.run_git_silent(&["checkout", "-b", branch]).await
    }
}

#[async_trait]
impl Vcs for GitCli {
    #[instrument(skip_all, fields(repo = %self.repo.display(), remote, branch))]
    async fn sync_main(&self, remote: &str, branch: &str) -> Result<(), CommandError> {
        // A previous run may have died mid-update; its edits must not follow us onto main
        if self.status().await?.is_dirty() {
            debug!("Discarding leftover changes from an earlier run");
            self.discard_local_changes().await?;
        }
        self.fetch(remote).await?;
        self.checkout(branch).await?;
        self.pull_rebase(remote, branch).await
    }

    #[instrument(skip_all, fields(repo = %self.repo.display(), branch = name))]
    async fn create_or_reset_branch(&self, name: &str) -> Result<(), CommandError> {
        if self.local_branch_exists(name).await? {
            debug!(branch = name, "Deleting stale working branch");
            self.delete_branch(name, true).await?;
        }
        self.checkout_new_branch(name).await
    }

    #[instrument(skip_all, fields(repo = %self.repo.display()))]
    async fn status(&self) -> Result<TreeStatus, CommandError> {
        let output = self.run_git(&["status", "--porcelain"]).await?;
        Ok(TreeStatus::from_porcelain(&output))
    }

    #[instrument(skip_all, fields(repo = %self.repo.display(), author = %author.name))]
    async fn commit_all(&self, message: &str, author: &Author) -> Result<(), CommandError> {
        self.run_git_silent(&["add", "-A"]).await?;

        // Set both author and committer so the commit does not depend on the
        // host's git identity.
        let name = format!("user.name={}", author.name);
        let email = format!("user.email={}", author.email);
        self.run_git_silent(&["-c", &name, "-c", &email, "commit", "-m", message])
            .await
    }

    #[instrument(skip_all, fields(repo = %self.repo.display(), remote, branch))]
    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), CommandError> {
        self.run_git_silent(&["push", "--force", remote, branch])
            .await
    }
}
