//! Published release lookup and creation.
//!
//! [`ReleaseRegistry`] sits on top of a [`ReleaseHost`], the three-operation
//! contract (view latest, view tag, create) that the decision workflow needs.
//! Lookup failures are downgraded to "no prior release"; publish failures are
//! fatal.

mod gh;

pub use gh::GhCli;

use crate::watcher::{
    engine::notes::parse_key_values,
    error::{Error, Result},
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Body and tag of a published release as returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostedRelease {
    /// Release tag name
    pub tag: String,
    /// Release notes body
    pub body: String,
}

/// Release hosting backend.
#[allow(async_fn_in_trait)]
pub trait ReleaseHost {
    /// Returns the most recent release, `None` if there is none.
    async fn view_latest(&self) -> Result<Option<HostedRelease>>;

    /// Whether a release with `tag` exists.
    async fn view_tag(&self, tag: &str) -> Result<bool>;

    /// Creates release `tag` with `assets`, notes read from `notes_file`, and `title`.
    async fn create(
        &self,
        tag: &str,
        assets: &[PathBuf],
        notes_file: &Path,
        title: &str,
    ) -> Result<()>;
}

/// Latest known published state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseRecord {
    /// Tag of the release (empty when there is no prior release)
    pub tag: String,
    /// MD5 recorded in the release body
    pub md5: Option<String>,
    /// SHA-256 recorded in the release body
    pub sha256: Option<String>,
}

impl ReleaseRecord {
    /// Builds a record from a hosted release, reading checksums from its body.
    ///
    /// Falls back to the `DestVersion` line when the host reports no tag name.
    pub fn from_hosted(release: &HostedRelease) -> Self {
        let fields = parse_key_values(&release.body);
        let field = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();

        let tag = if release.tag.trim().is_empty() {
            field("DestVersion").unwrap_or_default()
        } else {
            release.tag.trim().to_string()
        };

        Self {
            tag,
            md5: field("Md5"),
            sha256: field("Sha256"),
        }
    }

    /// True when nothing is known about a prior release.
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty() && self.md5.is_none() && self.sha256.is_none()
    }
}

/// Registry of published releases.
#[derive(Debug, Clone)]
pub struct ReleaseRegistry<H> {
    host: H,
}

impl<H: ReleaseHost> ReleaseRegistry<H> {
    /// Wraps a release host.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Access to the underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Latest release, or the empty record if there is none or lookup fails.
    pub async fn latest_release(&self) -> ReleaseRecord {
        match self.host.view_latest().await {
            Ok(Some(release)) => ReleaseRecord::from_hosted(&release),
            Ok(None) => ReleaseRecord::default(),
            Err(e) => {
                log::warn!("Latest release lookup failed, assuming none: {}", e);
                ReleaseRecord::default()
            }
        }
    }

    /// Whether `tag` has already been published. Lookup failures count as absent.
    pub async fn tag_exists(&self, tag: &str) -> bool {
        match self.host.view_tag(tag).await {
            Ok(exists) => exists,
            Err(e) => {
                log::warn!("Tag lookup for {} failed, assuming absent: {}", tag, e);
                false
            }
        }
    }

    /// Writes `notes` to `notes_file` and creates the release.
    pub async fn publish(
        &self,
        tag: &str,
        assets: &[PathBuf],
        notes: &str,
        notes_file: &Path,
        title: &str,
    ) -> Result<()> {
        fs::write_text(notes_file, notes).await?;
        log::info!("Release notes written to {}", notes_file.display());

        self.host
            .create(tag, assets, notes_file, title)
            .await
            .map_err(|e| match e {
                Error::Publish { .. } => e,
                other => Error::Publish {
                    tag: tag.to_string(),
                    reason: other.to_string(),
                },
            })
    }
}
