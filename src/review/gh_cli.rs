//! GitHub CLI (`gh`) wrapper for opening the update PR.
//!
//! Authentication is whatever `gh auth login` (or `GH_TOKEN`) already set up
//! in the environment; nothing here manages credentials.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

use super::{PullRequest, PullRequestRequest, ReviewHost};
use crate::error::CommandError;
use crate::process;

/// GitHub CLI wrapper bound to a repository checkout
#[derive(Debug, Clone)]
pub struct GhCli {
    repo: PathBuf,
}

impl GhCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Execute a gh command and return stdout
    async fn run_gh(&self, args: &[&str]) -> Result<String, CommandError> {
        process::run("gh", args, &self.repo).await
    }
}

/// Build the `gh pr create` argument list for a request
fn pr_create_args(request: &PullRequestRequest) -> Vec<&str> {
    let mut args = vec![
        "pr",
        "create",
        "--head",
        &request.head,
        "--base",
        &request.base,
        "--title",
        &request.title,
        "--body",
        &request.body,
    ];

    if let Some(ref reviewer) = request.reviewer {
        args.push("--reviewer");
        args.push(reviewer);
    }

    args
}

#[async_trait]
impl ReviewHost for GhCli {
    #[instrument(skip_all, fields(repo = %self.repo.display(), workflow, git_ref))]
    async fn trigger_ci(&self, workflow: &str, git_ref: &str) -> Result<(), CommandError> {
        self.run_gh(&["workflow", "run", workflow, "--ref", git_ref])
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %self.repo.display(), head = %request.head, base = %request.base))]
    async fn open_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PullRequest, CommandError> {
        let output = self.run_gh(&pr_create_args(request)).await?;
        debug!(%output, "gh pr create output");
        Ok(PullRequest::from_create_output(&output))
    }
}
