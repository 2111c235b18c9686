//! Artifact download, verification, and inspection.
//!
//! # Module Organization
//!
//! - [`transfer`] - Streaming HTTP transfer with inner retries
//! - [`checksum`] - Chunked SHA-256 calculation
//! - [`mount`] - Disk image attach/detach (`hdiutil`)
//! - [`version`] - Release tag derivation from `Info.plist`

pub mod checksum;
pub mod mount;
pub mod transfer;
pub mod version;

pub use mount::{ArtifactMounter, Hdiutil};
pub use transfer::{HttpTransfer, Transfer};

use crate::watcher::{
    error::{Error, Result},
    retry::{RetryPolicy, with_retry_if},
    utils::fs,
};
use std::path::{Path, PathBuf};
use url::Url;

/// A downloaded, inspected release artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Final location of the image under its version directory
    pub local_path: PathBuf,
    /// SHA-256 of the image
    pub sha256: String,
    /// Tag derived from the bundled application
    pub version_tag: String,
}

/// Downloads artifacts with bounded outer retries around a [`Transfer`].
#[derive(Debug, Clone)]
pub struct ArtifactAcquirer<T> {
    transfer: T,
    retry: RetryPolicy,
}

impl<T: Transfer> ArtifactAcquirer<T> {
    /// Wraps `transfer`, retrying whole transfers according to `retry`.
    pub fn new(transfer: T, retry: RetryPolicy) -> Self {
        Self { transfer, retry }
    }

    /// Access to the underlying transfer.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Downloads `url` to `dest`, creating the parent directory.
    ///
    /// Fails with [`Error::Download`] once every attempt is exhausted, or at
    /// once when the failure is permanent (e.g. HTTP 404).
    pub async fn download(&self, url: &Url, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent, false).await?;
        }

        with_retry_if(&self.retry, "Download", Error::is_transient, |_| {
            self.transfer.transfer(url, dest)
        })
            .await
            .map_err(|(attempts, e)| Error::Download {
                attempts,
                reason: e.to_string(),
            })
    }

    /// SHA-256 of a local file, streamed in fixed-size chunks.
    pub async fn compute_checksum(&self, path: &Path) -> Result<String> {
        checksum::calculate_sha256(path).await
    }

    /// Reads the version tag from the application bundle under `mount_point`.
    pub fn extract_version_tag(&self, mount_point: &Path, app_bundle: &str) -> Result<String> {
        let info_plist = mount_point
            .join(app_bundle)
            .join("Contents")
            .join("Info.plist");
        version::extract_version_tag(&info_plist)
    }
}
