//! Working tree and mount teardown.
//!
//! A [`Workspace`] owns the run's working directory and remembers any image
//! it attached. [`Workspace::cleanup`] detaches first, then removes the tree;
//! it is idempotent and never fails. If a workspace is dropped without
//! cleanup (panic, cancelled future) the tree is still removed synchronously,
//! though a leftover mount can only be reported.

use crate::watcher::{acquire::ArtifactMounter, error::Result, utils::fs};
use std::path::{Path, PathBuf};

/// Scoped working directory for one run.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    mounted: Option<PathBuf>,
    cleaned: bool,
}

impl Workspace {
    /// Creates a workspace rooted at `root`. Nothing is touched on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: None,
            cleaned: false,
        }
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Currently attached mount point, if any.
    pub fn mounted(&self) -> Option<&Path> {
        self.mounted.as_deref()
    }

    /// Creates the working tree and its `temp` directory.
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root.join("temp"), false).await
    }

    /// Attaches `image` and records the mount point for teardown.
    pub async fn attach<M: ArtifactMounter>(&mut self, mounter: &M, image: &Path) -> Result<PathBuf> {
        let mount_point = mounter.attach(image).await?;
        self.mounted = Some(mount_point.clone());
        Ok(mount_point)
    }

    /// Detaches the recorded mount point, if any. Failures are logged.
    pub async fn detach<M: ArtifactMounter>(&mut self, mounter: &M) {
        if let Some(mount_point) = self.mounted.take() {
            match mounter.detach(&mount_point).await {
                Ok(()) => log::debug!("Detached {}", mount_point.display()),
                Err(e) => log::warn!("Failed to detach {}: {}", mount_point.display(), e),
            }
        }
    }

    /// Detaches any remaining mount, then removes the working tree.
    ///
    /// Runs at most once; later calls are no-ops.
    pub async fn cleanup<M: ArtifactMounter>(&mut self, mounter: &M) {
        if self.cleaned {
            return;
        }
        self.detach(mounter).await;
        if let Err(e) = fs::remove_dir_all(&self.root).await {
            log::warn!("Failed to remove {}: {}", self.root.display(), e);
        }
        self.cleaned = true;
        log::info!("Cleanup completed.");
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        if let Some(mount_point) = &self.mounted {
            log::warn!(
                "Workspace dropped with {} still attached; detach it manually",
                mount_point.display()
            );
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove {}: {}", self.root.display(), e);
        }
    }
}
