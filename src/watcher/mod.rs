//! Release watching: detect a new vendor build and republish it.
//!
//! # Overview
//!
//! A run:
//! 1. Resolves the download link from the vendor page ([`fetch`])
//! 2. Compares remote metadata with the latest release ([`engine::decision`])
//! 3. Downloads, mounts, and inspects the disk image ([`acquire`])
//! 4. Publishes a release with notes and a checksum sidecar ([`registry`])
//! 5. Tears down mounts and the working tree ([`cleanup`])
//!
//! External systems are reached through four traits, [`PageSource`],
//! [`Transfer`], [`ArtifactMounter`] and [`ReleaseHost`], each with a real
//! adapter here and an in-memory one in `testing` (enabled by the `testing`
//! feature).

pub mod acquire;
pub mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

pub use acquire::{Artifact, ArtifactAcquirer, ArtifactMounter, Hdiutil, HttpTransfer, Transfer};
pub use config::WatchConfig;
pub use engine::{Outcome, ReleaseWatcher};
pub use error::{Error, Result};
pub use fetch::{DownloadLink, HttpFetcher, PageSource, RemoteMetadata};
pub use registry::{GhCli, ReleaseHost, ReleaseRecord, ReleaseRegistry};
