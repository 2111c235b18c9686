//! Release workflow orchestration.
//!
//! This module provides the [`ReleaseWatcher`] that walks a run through the
//! workflow stages: resolve link, compare metadata, download and inspect,
//! compare checksum, resolve tag, publish. Cleanup always runs afterwards.

use super::{
    decision::{SkipReason, Stage, Verdict, compare_checksum, compare_metadata, resolve_tag},
    notes::{ReleaseNotes, Sidecar},
};
use crate::watcher::{
    WatchConfig,
    acquire::{Artifact, ArtifactAcquirer, ArtifactMounter, Transfer},
    cleanup::Workspace,
    error::Result,
    fetch::PageSource,
    registry::{ReleaseHost, ReleaseRegistry},
    utils::fs,
};
use chrono::Utc;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing new; the run stopped at `stage`.
    Skipped {
        /// Stage where the skip was decided
        stage: Stage,
        /// What matched
        reason: SkipReason,
    },
    /// A new release was created.
    Published {
        /// Tag the release was published under
        tag: String,
        /// The published image
        artifact: Artifact,
    },
}

/// Main release workflow orchestrator.
///
/// Generic over its four collaborators so that the same workflow runs against
/// the real HTTP/`hdiutil`/`gh` adapters or in-memory fakes.
///
/// # Examples
///
/// ```no_run
/// use mac_release_watcher::watcher::{
///     GhCli, Hdiutil, HttpFetcher, HttpTransfer, ReleaseWatcher, WatchConfig,
/// };
///
/// # async fn example() -> mac_release_watcher::watcher::Result<()> {
/// let config = WatchConfig::default();
/// let watcher = ReleaseWatcher::new(
///     config.clone(),
///     HttpFetcher::from_config(&config)?,
///     HttpTransfer::from_config(&config)?,
///     Hdiutil::locate(&config)?,
///     GhCli::locate(&config, None)?,
/// );
/// let outcome = watcher.run().await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReleaseWatcher<P, T, M, H> {
    config: WatchConfig,
    source: P,
    acquirer: ArtifactAcquirer<T>,
    mounter: M,
    registry: ReleaseRegistry<H>,
}

impl<P, T, M, H> ReleaseWatcher<P, T, M, H>
where
    P: PageSource,
    T: Transfer,
    M: ArtifactMounter,
    H: ReleaseHost,
{
    /// Creates a watcher from a configuration and its collaborators.
    pub fn new(config: WatchConfig, source: P, transfer: T, mounter: M, host: H) -> Self {
        let acquirer = ArtifactAcquirer::new(transfer, config.download_retry);
        Self {
            config,
            source,
            acquirer,
            mounter,
            registry: ReleaseRegistry::new(host),
        }
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Executes one run.
    ///
    /// The working tree is torn down before returning, whatever the result;
    /// a cleanup problem never replaces the run's own error.
    pub async fn run(&self) -> Result<Outcome> {
        let mut workspace = Workspace::new(&self.config.work_dir);
        let result = self.run_stages(&mut workspace).await;
        workspace.cleanup(&self.mounter).await;
        result
    }

    async fn run_stages(&self, workspace: &mut Workspace) -> Result<Outcome> {
        let force = self.config.force_release;
        let mut stage = Stage::Init;
        workspace.prepare().await?;
        log::info!("Force release: {}", force);

        // Resolve the download link from the vendor page
        log::info!("Resolving download link from website...");
        let link = self.source.fetch_download_link().await?;
        log::info!("Download link: {}", link);
        enter(&mut stage, Stage::LinkResolved);

        log::info!("Fetching HEAD metadata...");
        let remote = self.source.fetch_metadata(&link).await;
        log::info!(
            "HEAD metadata: md5={}, size={}, last_modified={}",
            or_na(&remote.md5),
            or_na(&remote.content_length),
            or_na(&remote.last_modified)
        );

        log::info!("Fetching latest release info...");
        let latest = self.registry.latest_release().await;
        log::info!(
            "Latest release: tag={}, md5={}, sha256={}",
            if latest.tag.is_empty() { "n/a" } else { latest.tag.as_str() },
            or_na(&latest.md5),
            or_na(&latest.sha256)
        );

        enter(&mut stage, Stage::MetadataCompared);
        match compare_metadata(&remote, &latest, force) {
            Verdict::Skip(reason) => {
                log::info!("No new version detected by MD5. Skipping download.");
                return Ok(Outcome::Skipped { stage, reason });
            }
            Verdict::Overridden(_) => {
                log::info!("MD5 matches latest release, but force release is enabled.")
            }
            Verdict::Proceed => {}
        }

        log::info!("Downloading DMG...");
        let download_path = self.config.download_path();
        self.acquirer.download(&link.url, &download_path).await?;
        log::info!("✓ Downloaded DMG to {}", download_path.display());

        // A failed extraction leaves the image attached; cleanup detaches it
        log::info!("Mounting DMG and reading Info.plist...");
        let mount_point = workspace.attach(&self.mounter, &download_path).await?;
        let tag = self
            .acquirer
            .extract_version_tag(&mount_point, &self.config.app_bundle)?;
        workspace.detach(&self.mounter).await;
        log::info!("Detected tag: {}", tag);

        log::info!("Preparing release assets...");
        let image_path = self.config.release_image_path(&tag);
        fs::copy_file(&download_path, &image_path).await?;
        let sha256 = self.acquirer.compute_checksum(&image_path).await?;
        log::info!("Computed SHA256: {}", sha256);
        let artifact = Artifact {
            local_path: image_path,
            sha256,
            version_tag: tag,
        };
        enter(&mut stage, Stage::Downloaded);

        let sidecar_path = self.config.sidecar_path(&artifact.version_tag);
        Sidecar::new(&artifact.version_tag, &remote, &artifact.sha256, Utc::now())
            .write(&sidecar_path)
            .await?;

        enter(&mut stage, Stage::ChecksumCompared);
        match compare_checksum(&artifact.sha256, &latest, force) {
            Verdict::Skip(reason) => {
                log::info!("No new version detected by SHA256. Skipping release.");
                return Ok(Outcome::Skipped { stage, reason });
            }
            Verdict::Overridden(_) => {
                log::info!("SHA256 matches latest release, but force release is enabled.")
            }
            Verdict::Proceed => {}
        }
        if latest.md5.is_none() {
            log::info!("Latest release has no MD5, used SHA256 fallback check.");
        }

        let exists = self.registry.tag_exists(&artifact.version_tag).await;
        let tag = resolve_tag(&artifact.version_tag, exists, Utc::now());
        log::info!("Release tag: {}", tag);
        enter(&mut stage, Stage::TagResolved);

        let notes = ReleaseNotes::new(&self.config.product_name, &tag, &remote, &artifact.sha256);
        log::info!("Creating release...");
        self.registry
            .publish(
                &tag,
                &[artifact.local_path.clone(), sidecar_path],
                &notes.render(),
                &self.config.notes_path(),
                &self.config.release_title(&tag),
            )
            .await?;
        enter(&mut stage, Stage::Published);
        log::info!("✓ Release {} created.", tag);

        enter(&mut stage, Stage::Done);
        Ok(Outcome::Published { tag, artifact })
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    log::debug!("Stage {} -> {}", stage, next);
    *stage = next;
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("n/a")
}
