//! Shared helper for running external programs.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// Run `program` with `args` in `cwd` and return its trimmed stdout.
///
/// A non-zero exit is reported as [`CommandError::Failed`] with the trimmed
/// stderr attached.
pub async fn run(program: &str, args: &[&str], cwd: &Path) -> Result<String, CommandError> {
    debug!(program, ?args, ?cwd, "Running command");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CommandError::NotInstalled {
                    program: program.to_string(),
                }
            } else {
                CommandError::Spawn {
                    program: program.to_string(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed {
            program: program.to_string(),
            subcommand: args.first().copied().unwrap_or_default().to_string(),
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command, discarding stdout
pub async fn run_silent(program: &str, args: &[&str], cwd: &Path) -> Result<(), CommandError> {
    run(program, args, cwd).await?;
    Ok(())
}
