//! Pre- and post-crawl commands

use crate::{CrowletError, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Runs an external command, echoing its standard output line by line
///
/// The command line is split on whitespace; no shell is involved, so quoting
/// and redirection are not interpreted.
///
/// # Returns
///
/// * `Ok(())` - The command ran and exited successfully
/// * `Err(CrowletError::Hook)` - The command was empty, could not be started,
///   or exited with a failure status
pub async fn run_command(command_line: &str) -> Result<()> {
    let hook_error = |message: String| CrowletError::Hook {
        command: command_line.to_string(),
        message,
    };

    let mut parts = command_line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| hook_error("empty command".to_string()))?;

    tracing::info!("Running '{}'...", command_line);
    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| hook_error(format!("failed to start: {}", e)))?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| hook_error(format!("failed to read output: {}", e)))?
        {
            println!("{}", line);
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| hook_error(format!("failed to wait: {}", e)))?;
    if !status.success() {
        return Err(hook_error(format!("exited with {}", status)));
    }

    Ok(())
}
