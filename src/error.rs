//! Top-level error types for the release watcher binary.
//!
//! Library code returns [`watcher::Error`](crate::watcher::Error); this module
//! wraps it together with argument problems for the CLI.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type surfaced by the binary
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workflow errors
    #[error("{0}")]
    Watcher(#[from] crate::watcher::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::watcher::Error as W;
        match self {
            ReleaseError::Cli(_) => vec!["Run with --help to see accepted values".to_string()],
            ReleaseError::Watcher(W::ToolMissing(tool)) => {
                vec![format!("Install `{tool}` and make sure it is on PATH")]
            }
            ReleaseError::Watcher(W::NotFound { .. }) => vec![
                "The vendor page layout may have changed; check --link-class".to_string(),
            ],
            ReleaseError::Watcher(W::Publish { .. }) => vec![
                "Check `gh auth status` and the target repository permissions".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
