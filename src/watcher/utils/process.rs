//! External command execution with deadlines.

use crate::watcher::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Locates an external tool in `PATH`.
pub fn locate_tool(name: &str) -> Result<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Ok(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", name, e);
            Err(Error::ToolMissing(name.to_string()))
        }
    }
}

/// Runs `program` with `args`, capturing output, and fails if it does not
/// finish within `timeout`.
///
/// A non-zero exit is NOT an error here; callers decide what it means.
pub async fn run_captured<I, S>(program: &Path, args: I, timeout: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args
        .into_iter()
        .map(|a| a.as_ref().to_os_string())
        .collect();
    let command_line = describe(program, &args);
    log::debug!("Running: {}", command_line);

    let child = Command::new(program)
        .args(&args)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(Error::CommandFailed {
            command: command_line,
            reason: e.to_string(),
        }),
        Err(_) => Err(Error::Timeout {
            operation: command_line,
            secs: timeout.as_secs(),
        }),
    }
}

/// Like [`run_captured`] but maps a non-zero exit to [`Error::CommandFailed`].
pub async fn run_checked<I, S>(program: &Path, args: I, timeout: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args
        .into_iter()
        .map(|a| a.as_ref().to_os_string())
        .collect();
    let output = run_captured(program, &args, timeout).await?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: describe(program, &args),
            reason: failure_reason(&output),
        });
    }
    Ok(output)
}

/// Human-readable reason for a failed command: stderr, else exit status.
pub fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

fn describe(program: &Path, args: &[std::ffi::OsString]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
