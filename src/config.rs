use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::deps::CommandSpec;
use crate::git::Author;
use crate::review::PullRequestRequest;
use crate::workflow::WorkflowSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub repo: RepoConfig,
    pub commit: CommitConfig,
    pub dependencies: DependenciesConfig,
    pub review: ReviewConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Path to the checkout to update (default: current directory)
    pub path: String,
    pub remote: String,
    /// Branch the update is based on and the PR targets
    pub main_branch: String,
    /// Branch that is recreated on every run to carry the update
    pub work_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    pub message: String,
    pub author_name: String,
    pub author_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependenciesConfig {
    /// Commands run in order to refresh the lockfile
    pub commands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub title: String,
    pub body: String,
    /// GitHub login to request a review from
    #[serde(default)]
    pub reviewer: Option<String>,
    /// Workflow file to run against the pushed branch (e.g. "test.yml")
    #[serde(default)]
    pub ci_workflow: Option<String>,
}

/// Exit status configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Exit code used after a pull request was opened (default: 3)
    #[serde(default = "default_proposed_code")]
    pub proposed_code: u8,
}

fn default_proposed_code() -> u8 {
    3
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            proposed_code: default_proposed_code(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to write logs to a file instead of stderr
    #[serde(default)]
    pub to_file: bool,

    /// Directory for log files (default: the user cache directory).
    /// Keep this outside the checkout, or the log makes the tree dirty.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: None,
        }
    }
}

/// Resolve a relative path against the current directory
fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(path))
}

impl Config {
    /// Project-local config file, relative to the current directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".update-requirements.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the tool works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/update-requirements/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("update-requirements").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. UPDATE_REQUIREMENTS_REVIEW__REVIEWER
        builder = builder.add_source(
            config::Environment::with_prefix("UPDATE_REQUIREMENTS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the workflow cannot run safely with
    pub fn validate(&self) -> Result<()> {
        if self.repo.remote.trim().is_empty() {
            bail!("repo.remote must not be empty");
        }
        if self.repo.main_branch.trim().is_empty() || self.repo.work_branch.trim().is_empty() {
            bail!("repo.main_branch and repo.work_branch must not be empty");
        }
        if self.repo.main_branch == self.repo.work_branch {
            bail!(
                "repo.work_branch must differ from repo.main_branch ('{}'), it is deleted on every run",
                self.repo.main_branch
            );
        }
        if self.commit.message.trim().is_empty() {
            bail!("commit.message must not be empty");
        }
        if self.dependencies.commands.is_empty() {
            bail!("dependencies.commands must list at least one command");
        }
        if let Some(command) = self
            .dependencies
            .commands
            .iter()
            .find(|c| c.program.trim().is_empty())
        {
            bail!("dependency command has an empty program: {:?}", command.args);
        }
        if self.exit.proposed_code == 0 {
            bail!("exit.proposed_code must be non-zero, 0 means no changes");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to the repository checkout
    pub fn repo_path(&self) -> Result<PathBuf> {
        absolute(PathBuf::from(&self.repo.path))
    }

    /// Get absolute path to the logs directory
    pub fn logs_path(&self) -> Result<PathBuf> {
        match self.logging.dir {
            Some(ref dir) => absolute(PathBuf::from(dir)),
            None => Ok(dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("update-requirements")
                .join("logs")),
        }
    }

    pub fn author(&self) -> Author {
        Author {
            name: self.commit.author_name.clone(),
            email: self.commit.author_email.clone(),
        }
    }

    /// The pull request opened when the update produced changes
    pub fn pull_request(&self) -> PullRequestRequest {
        PullRequestRequest {
            title: self.review.title.clone(),
            body: self.review.body.clone(),
            head: self.repo.work_branch.clone(),
            base: self.repo.main_branch.clone(),
            reviewer: self.review.reviewer.clone().filter(|r| !r.is_empty()),
        }
    }

    /// Settings handed to the workflow runner
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            remote: self.repo.remote.clone(),
            main_branch: self.repo.main_branch.clone(),
            work_branch: self.repo.work_branch.clone(),
            commit_message: self.commit.message.clone(),
            author: self.author(),
            ci_workflow: self.review.ci_workflow.clone().filter(|w| !w.is_empty()),
            pull_request: self.pull_request(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: RepoConfig {
                path: ".".to_string(),
                remote: "origin".to_string(),
                main_branch: "main".to_string(),
                work_branch: "update_requirements".to_string(),
            },
            commit: CommitConfig {
                message: "Update requirements.".to_string(),
                author_name: "update-requirements".to_string(),
                author_email: "update-requirements@users.noreply.github.com".to_string(),
            },
            dependencies: DependenciesConfig {
                commands: vec![
                    CommandSpec::new("poetry", &["run", "python", "requirements.py"]),
                    CommandSpec::new("poetry", &["lock"]),
                ],
            },
            review: ReviewConfig {
                title: "Update requirements".to_string(),
                body: "Automatic update of requirements.".to_string(),
                reviewer: None,
                ci_workflow: None,
            },
            exit: ExitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.commit.message, "Update requirements.");
        assert_eq!(config.repo.main_branch, "main");
        assert_eq!(config.repo.work_branch, "update_requirements");
        assert_eq!(config.exit.proposed_code, 3);
        assert_eq!(config.dependencies.commands.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_with_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[repo]
work_branch = "bump-locks"

[review]
reviewer = "octocat"
ci_workflow = "test.yml"

[[dependencies.commands]]
program = "uv"
args = ["lock", "--upgrade"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.repo.work_branch, "bump-locks");
        // Untouched keys keep their defaults
        assert_eq!(config.repo.main_branch, "main");
        assert_eq!(config.commit.message, "Update requirements.");
        assert_eq!(config.review.reviewer.as_deref(), Some("octocat"));
        assert_eq!(config.review.ci_workflow.as_deref(), Some("test.yml"));
        assert_eq!(
            config.dependencies.commands[0],
            CommandSpec::new("uv", &["lock", "--upgrade"])
        );
    }

    #[test]
    fn test_validate_rejects_same_branches() {
        let mut config = Config::default();
        config.repo.work_branch = "main".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_rejects_zero_proposed_code() {
        let mut config = Config::default();
        config.exit.proposed_code = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_commands() {
        let mut config = Config::default();
        config.dependencies.commands.clear();
        assert!(config.validate().is_err());

        config.dependencies.commands = vec![CommandSpec::new(" ", &["lock"])];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_workflow_settings() {
        let mut config = Config::default();
        config.review.reviewer = Some("octocat".to_string());
        config.review.ci_workflow = Some(String::new());

        let settings = config.workflow_settings();
        assert_eq!(settings.remote, "origin");
        assert_eq!(settings.commit_message, "Update requirements.");
        assert_eq!(settings.author.name, "update-requirements");
        // Empty workflow name means no CI trigger
        assert!(settings.ci_workflow.is_none());
        assert_eq!(settings.pull_request.head, "update_requirements");
        assert_eq!(settings.pull_request.base, "main");
        assert_eq!(settings.pull_request.title, "Update requirements");
        assert_eq!(settings.pull_request.reviewer.as_deref(), Some("octocat"));
    }

    #[test]
    fn test_paths() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.repo.path = temp_dir.path().to_string_lossy().to_string();

        assert_eq!(config.repo_path().unwrap(), temp_dir.path());
        assert!(config
            .logs_path()
            .unwrap()
            .ends_with("update-requirements/logs"));

        let logs_dir = temp_dir.path().join("logs");
        config.logging.dir = Some(logs_dir.to_string_lossy().to_string());
        assert_eq!(config.logs_path().unwrap(), logs_dir);
    }

    #[test]
    fn test_relative_paths_resolve_against_current_dir() {
        let mut config = Config::default();
        config.repo.path = "checkout".to_string();
        config.logging.dir = Some("logs".to_string());

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(config.repo_path().unwrap(), cwd.join("checkout"));
        assert_eq!(config.logs_path().unwrap(), cwd.join("logs"));
    }

    #[test]
    fn test_to_toml() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("work_branch = \"update_requirements\""));
        assert!(rendered.contains("[[dependencies.commands]]"));
    }
}
