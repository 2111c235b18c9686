//! Republishes new macOS builds of a vendor application as versioned releases.
//!
//! The library scrapes the vendor download page, decides from remote and
//! local checksums whether the build is new, extracts the version from the
//! disk image, and publishes a release with notes and a checksum sidecar.
//!
//! It can be used both as a CLI tool and as a library dependency; see
//! [`watcher::ReleaseWatcher`] for the entry point.

pub mod cli;
pub mod error;
pub mod watcher;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
