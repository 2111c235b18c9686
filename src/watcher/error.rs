//! Error types for release watching operations.
//!
//! The four domain failures (`NotFound`, `Download`, `Metadata`, `Publish`)
//! are the ones a run can abort with. Probe and registry lookup failures are
//! downgraded to empty results by their callers and never surface here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for watcher operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The vendor page no longer carries a marked download link.
    #[error("Download link not found on {page} (the page structure may have changed)")]
    NotFound {
        /// Page that was scanned
        page: String,
    },

    /// The artifact transfer exhausted every attempt.
    #[error("Download failed after {attempts} attempt(s): {reason}")]
    Download {
        /// Number of outer attempts made
        attempts: u32,
        /// Last failure observed
        reason: String,
    },

    /// Required version data is missing from the mounted artifact.
    #[error("Artifact metadata error: {0}")]
    Metadata(String),

    /// The release host rejected or failed the publish call.
    #[error("Publishing release {tag} failed: {reason}")]
    Publish {
        /// Tag that was being published
        tag: String,
        /// Reason reported by the host
        reason: String,
    },

    /// An external command exited unsuccessfully.
    #[error("Command failed: {command} - {reason}")]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Captured stderr or exit status
        reason: String,
    },

    /// An operation ran past its deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Operation description
        operation: String,
        /// Deadline in seconds
        secs: u64,
    },

    /// A transfer was interrupted before completing.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A required external tool is not installed.
    #[error("Required tool `{0}` not found in PATH")]
    ToolMissing(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Property list parsing errors
    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors with the action and path that failed
    #[error("Failed {context} {}: {source}", path.display())]
    Fs {
        /// Action being performed
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// True when retrying the same request may succeed.
    ///
    /// HTTP errors without a status (connect, timeout, body) are transient;
    /// with a status only 5xx and 429 are.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => match e.status() {
                Some(status) => {
                    status.is_server_error()
                        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                }
                None => true,
            },
            Error::Connection(_) | Error::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Extension trait attaching filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wraps an IO error with the action and path that produced it.
    fn fs_context(self, context: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context: context.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::watcher::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_context_keeps_path_and_action() {
        let err: Result<()> = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
            .fs_context("reading", Path::new("/tmp/x.plist"));
        let message = err.unwrap_err().to_string();
        assert!(message.contains("reading"));
        assert!(message.contains("/tmp/x.plist"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn not_found_mentions_page() {
        let err = Error::NotFound {
            page: "https://example.com/".into(),
        };
        assert!(err.to_string().contains("https://example.com/"));
    }

    #[test]
    fn only_interruptions_are_transient() {
        assert!(Error::Connection("reset by peer".into()).is_transient());
        assert!(
            Error::Timeout {
                operation: "GET".into(),
                secs: 30
            }
            .is_transient()
        );
        assert!(!Error::Metadata("CFBundleVersion not found".into()).is_transient());
        assert!(!Error::GenericError("disk full".into()).is_transient());
    }
}
