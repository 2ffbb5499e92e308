//! The update-and-propose workflow.
//!
//! Steps run strictly in order and the first failure aborts the run. Nothing
//! is rolled back: the working branch is recreated from main on the next run.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::deps::DependencyManager;
use crate::error::{WorkflowError, WorkflowStep};
use crate::git::{Author, TreeStatus, Vcs};
use crate::review::{PullRequest, PullRequestRequest, ReviewHost};

/// Exit code for a run that found nothing to update
pub const EXIT_CLEAN: u8 = 0;

/// Exit code for a run that failed
pub const EXIT_FAILURE: u8 = 1;

/// Fixed parameters of a run
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub remote: String,
    pub main_branch: String,
    pub work_branch: String,
    pub commit_message: String,
    pub author: Author,
    /// CI workflow to trigger on the pushed branch, if any
    pub ci_workflow: Option<String>,
    pub pull_request: PullRequestRequest,
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The dependency manager changed nothing
    Clean,
    /// Changes were pushed and a pull request opened for review
    Proposed(PullRequest),
}

impl Outcome {
    /// Process exit code for this outcome; a proposal deliberately exits non-zero
    pub fn exit_code(&self, proposed_code: u8) -> u8 {
        match self {
            Outcome::Clean => EXIT_CLEAN,
            Outcome::Proposed(_) => proposed_code,
        }
    }
}

/// Runs the workflow against its three collaborators
pub struct Workflow {
    vcs: Arc<dyn Vcs>,
    deps: Arc<dyn DependencyManager>,
    review: Arc<dyn ReviewHost>,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        vcs: Arc<dyn Vcs>,
        deps: Arc<dyn DependencyManager>,
        review: Arc<dyn ReviewHost>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            vcs,
            deps,
            review,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Execute every step once.
    #[instrument(skip_all, fields(branch = %self.settings.work_branch))]
    pub async fn run(&self) -> Result<Outcome, WorkflowError> {
        let s = &self.settings;

        info!(step = %WorkflowStep::Sync, remote = %s.remote, branch = %s.main_branch, "Syncing main branch");
        self.vcs
            .sync_main(&s.remote, &s.main_branch)
            .await
            .map_err(|source| WorkflowError::Sync {
                remote: s.remote.clone(),
                branch: s.main_branch.clone(),
                source,
            })?;

        info!(step = %WorkflowStep::Branch, branch = %s.work_branch, "Creating working branch");
        self.vcs
            .create_or_reset_branch(&s.work_branch)
            .await
            .map_err(|source| WorkflowError::Branch {
                branch: s.work_branch.clone(),
                source,
            })?;

        info!(step = %WorkflowStep::UpdateDependencies, "Updating dependencies");
        self.deps
            .update_dependencies()
            .await
            .map_err(|source| WorkflowError::DependencyUpdate { source })?;

        info!(step = %WorkflowStep::Status, "Checking for changes");
        let status = self
            .vcs
            .status()
            .await
            .map_err(|source| WorkflowError::Status { source })?;

        if status == TreeStatus::Clean {
            info!("No dependency changes, nothing to do");
            return Ok(Outcome::Clean);
        }

        info!(step = %WorkflowStep::Commit, message = %s.commit_message, "Committing changes");
        self.vcs
            .commit_all(&s.commit_message, &s.author)
            .await
            .map_err(|source| WorkflowError::CommitPush {
                step: WorkflowStep::Commit,
                branch: s.work_branch.clone(),
                source,
            })?;

        info!(step = %WorkflowStep::Push, remote = %s.remote, branch = %s.work_branch, "Force-pushing working branch");
        self.vcs
            .force_push(&s.remote, &s.work_branch)
            .await
            .map_err(|source| WorkflowError::CommitPush {
                step: WorkflowStep::Push,
                branch: s.work_branch.clone(),
                source,
            })?;

        if let Some(ref workflow) = s.ci_workflow {
            info!(step = %WorkflowStep::TriggerCi, workflow = %workflow, "Triggering CI");
            self.review
                .trigger_ci(workflow, &s.work_branch)
                .await
                .map_err(|source| WorkflowError::ReviewHost {
                    step: WorkflowStep::TriggerCi,
                    source,
                })?;
        }

        info!(step = %WorkflowStep::OpenPullRequest, title = %s.pull_request.title, "Opening pull request");
        let pr = self
            .review
            .open_pull_request(&s.pull_request)
            .await
            .map_err(|source| WorkflowError::ReviewHost {
                step: WorkflowStep::OpenPullRequest,
                source,
            })?;

        info!(pull_request = %pr, "Opened pull request, review required");
        Ok(Outcome::Proposed(pr))
    }
}
