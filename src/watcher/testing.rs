//! In-memory adapters for driving a [`ReleaseWatcher`](super::ReleaseWatcher)
//! without network access, `hdiutil`, or `gh`.
//!
//! Every fake records what it was asked to do in a shared [`CallLog`], so a
//! test can assert on ordering across adapters.

use crate::watcher::{
    acquire::{ArtifactMounter, Transfer},
    error::{Error, Result},
    fetch::{DownloadLink, PageSource, RemoteMetadata},
    registry::{HostedRelease, ReleaseHost},
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Ordered record of adapter calls, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    /// Snapshot of all entries so far.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.0).iter().filter(|e| e.starts_with(prefix)).count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`PageSource`] returning a fixed link and metadata.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    /// Link to return; `None` simulates a page without a marked anchor
    pub link: Option<DownloadLink>,
    /// Header values to report for the link
    pub md5: Option<String>,
    /// Reported `Content-Length`
    pub content_length: Option<String>,
    /// Reported `Last-Modified`
    pub last_modified: Option<String>,
    /// Shared call log
    pub log: CallLog,
}

impl ScriptedPage {
    /// A page whose marked link points at `link`, with no header metadata.
    pub fn new(link: &str, log: CallLog) -> Self {
        Self {
            link: DownloadLink::parse(link).ok(),
            md5: None,
            content_length: None,
            last_modified: None,
            log,
        }
    }
}

impl PageSource for ScriptedPage {
    async fn fetch_download_link(&self) -> Result<DownloadLink> {
        self.log.push("fetch_link");
        self.link.clone().ok_or_else(|| Error::NotFound {
            page: "scripted page".into(),
        })
    }

    async fn fetch_metadata(&self, link: &DownloadLink) -> RemoteMetadata {
        self.log.push("fetch_metadata");
        RemoteMetadata {
            md5: self.md5.clone(),
            content_length: self.content_length.clone(),
            last_modified: self.last_modified.clone(),
            ..RemoteMetadata::empty(link)
        }
    }
}

/// [`Transfer`] that writes a fixed payload, optionally failing first.
#[derive(Debug, Clone)]
pub struct MemoryTransfer {
    /// Bytes written on success
    pub payload: Vec<u8>,
    /// Number of leading calls that fail
    pub failures: u32,
    /// Shared call log
    pub log: CallLog,
}

impl MemoryTransfer {
    /// A transfer that always succeeds with `payload`.
    pub fn new(payload: impl Into<Vec<u8>>, log: CallLog) -> Self {
        Self {
            payload: payload.into(),
            failures: 0,
            log,
        }
    }
}

impl Transfer for MemoryTransfer {
    async fn transfer(&self, url: &Url, dest: &Path) -> Result<()> {
        let previous = self.log.count("transfer");
        self.log.push(format!("transfer {url}"));
        if (previous as u32) < self.failures {
            return Err(Error::Connection("connection refused".into()));
        }
        tokio::fs::write(dest, &self.payload).await?;
        Ok(())
    }
}

/// [`ArtifactMounter`] that "mounts" every image at a prepared directory.
#[derive(Debug, Clone)]
pub struct FixtureMounter {
    /// Directory returned as the mount point
    pub volume: PathBuf,
    /// Shared call log
    pub log: CallLog,
}

impl FixtureMounter {
    /// Mounts every image at `volume`.
    pub fn new(volume: impl Into<PathBuf>, log: CallLog) -> Self {
        Self {
            volume: volume.into(),
            log,
        }
    }
}

impl ArtifactMounter for FixtureMounter {
    async fn attach(&self, image: &Path) -> Result<PathBuf> {
        self.log.push(format!("attach {}", image.display()));
        Ok(self.volume.clone())
    }

    async fn detach(&self, mount_point: &Path) -> Result<()> {
        // Records whether the volume still existed, i.e. detach ran before removal
        self.log.push(format!(
            "detach {} present={}",
            mount_point.display(),
            mount_point.exists()
        ));
        Ok(())
    }
}

/// A release captured by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRelease {
    /// Published tag
    pub tag: String,
    /// Asset file names, in order
    pub assets: Vec<String>,
    /// Contents of the checksum sidecar asset, if any
    pub sidecar: Option<String>,
    /// Notes text as read from the notes file
    pub notes: String,
    /// Release title
    pub title: String,
}

/// [`ReleaseHost`] holding releases in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    /// What `view_latest` reports
    pub latest: Option<HostedRelease>,
    /// Tags reported as existing
    pub existing_tags: Vec<String>,
    /// Make `view_latest` fail
    pub fail_lookup: bool,
    /// Make `create` fail
    pub fail_create: bool,
    /// Releases created so far
    pub created: Arc<Mutex<Vec<CreatedRelease>>>,
    /// Shared call log
    pub log: CallLog,
}

impl MemoryHost {
    /// An empty host recording into `log`.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Snapshot of created releases.
    pub fn created(&self) -> Vec<CreatedRelease> {
        lock(&self.created).clone()
    }
}

impl ReleaseHost for MemoryHost {
    async fn view_latest(&self) -> Result<Option<HostedRelease>> {
        self.log.push("view_latest");
        if self.fail_lookup {
            return Err(Error::CommandFailed {
                command: "release view".into(),
                reason: "not authenticated".into(),
            });
        }
        Ok(self.latest.clone())
    }

    async fn view_tag(&self, tag: &str) -> Result<bool> {
        self.log.push(format!("view_tag {tag}"));
        Ok(self.existing_tags.iter().any(|t| t == tag))
    }

    async fn create(
        &self,
        tag: &str,
        assets: &[PathBuf],
        notes_file: &Path,
        title: &str,
    ) -> Result<()> {
        self.log.push(format!("create {tag}"));
        if self.fail_create {
            return Err(Error::Publish {
                tag: tag.to_string(),
                reason: "HTTP 422: Validation Failed".into(),
            });
        }

        let mut sidecar = None;
        for asset in assets {
            if asset.extension().is_some_and(|ext| ext == "sha256") {
                sidecar = Some(tokio::fs::read_to_string(asset).await?);
            }
        }
        let release = CreatedRelease {
            tag: tag.to_string(),
            assets: assets
                .iter()
                .filter_map(|a| a.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
            sidecar,
            notes: tokio::fs::read_to_string(notes_file).await?,
            title: title.to_string(),
        };
        lock(&self.created).push(release);
        Ok(())
    }
}
