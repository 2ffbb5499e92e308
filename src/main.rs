use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use update_requirements::config::Config;
use update_requirements::logging::init_logging;
use update_requirements::workflow::EXIT_FAILURE;
use update_requirements::{workflow_for, Outcome};

#[derive(Parser)]
#[command(name = "update-requirements")]
#[command(about = "Refresh the dependency lockfile and open a pull request with the result")]
#[command(
    after_help = "EXIT STATUS:\n    0    no dependency changes\n    1    the run failed\n    3    changes were pushed and a pull request opened (exit.proposed_code)"
)]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load(cli.config.as_deref())?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(0);
    }

    let logging = init_logging(&config, cli.debug)?;
    if let Some(ref path) = logging.log_file_path {
        eprintln!("Logging to {}", path.display());
    }

    let repo = config.repo_path()?;
    info!(repo = %repo.display(), "Starting requirements update");

    let workflow = workflow_for(&config, &repo);
    let outcome = match workflow.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            let step = e.step();
            let e = anyhow::Error::from(e);
            error!(step = %step, "Step failed: {:#}", e);
            eprintln!("Error in step '{step}': {e:#}");
            return Ok(EXIT_FAILURE);
        }
    };

    let code = outcome.exit_code(config.exit.proposed_code);
    match outcome {
        Outcome::Clean => info!("Requirements are up to date"),
        Outcome::Proposed(pr) => {
            // Non-zero on purpose so the scheduler flags the run for review
            info!(pull_request = %pr, exit_code = code, "Requirements changed, pull request needs review");
            println!("{}", pr.url);
        }
    }

    Ok(code)
}
