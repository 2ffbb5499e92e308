//! Code review host integration.
//!
//! The host is driven through its CLI as an opaque command; see [`GhCli`].

mod gh_cli;

pub use gh_cli::GhCli;

use async_trait::async_trait;
use regex::Regex;
use std::fmt;

use crate::error::CommandError;

/// Pull request to open for the working branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRequest {
    pub title: String,
    pub body: String,
    /// Branch with the changes
    pub head: String,
    /// Branch the changes should merge into
    pub base: String,
    pub reviewer: Option<String>,
}

/// A pull request that was opened on the review host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: Option<u64>,
    pub url: String,
}

impl PullRequest {
    /// Parse the output of `gh pr create`, which prints the new PR's URL.
    ///
    /// Output without a recognizable URL is kept verbatim with no number.
    pub fn from_create_output(output: &str) -> Self {
        match extract_pr_url(output) {
            Some((number, url)) => Self {
                number: Some(number),
                url,
            },
            None => Self {
                number: None,
                url: output.trim().to_string(),
            },
        }
    }
}

/// Extract PR number and URL like https://github.com/owner/repo/pull/123
fn extract_pr_url(output: &str) -> Option<(u64, String)> {
    let url_regex = Regex::new(r"https?://\S+/pull/(\d+)").ok()?;
    let caps = url_regex.captures(output)?;
    let url = caps.get(0)?.as_str().to_string();
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, url))
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(number) => write!(f, "#{} ({})", number, self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// Operations the workflow needs from the code review host
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// Start a CI workflow run against `git_ref`
    async fn trigger_ci(&self, workflow: &str, git_ref: &str) -> Result<(), CommandError>;

    /// Open a pull request
    async fn open_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PullRequest, CommandError>;
}
