//! Disk image attach/detach.
//!
//! The real adapter drives `hdiutil`; the mount point is read back from its
//! stdout rather than assumed from the volume name.

use crate::watcher::{
    WatchConfig,
    error::{Error, Result},
    utils::process::{failure_reason, locate_tool, run_captured, run_checked},
};
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

static VOLUME_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/Volumes/[^\n]+)").expect("volume pattern is valid"));

/// Attaches disk images to the filesystem and detaches them again.
#[allow(async_fn_in_trait)]
pub trait ArtifactMounter {
    /// Attaches `image` and returns its mount point.
    async fn attach(&self, image: &Path) -> Result<PathBuf>;

    /// Detaches a previously attached mount point.
    async fn detach(&self, mount_point: &Path) -> Result<()>;
}

/// [`ArtifactMounter`] backed by macOS `hdiutil`.
#[derive(Debug, Clone)]
pub struct Hdiutil {
    program: PathBuf,
    timeout: Duration,
}

impl Hdiutil {
    /// Locates `hdiutil` in `PATH`.
    pub fn locate(config: &WatchConfig) -> Result<Self> {
        Ok(Self {
            program: locate_tool("hdiutil")?,
            timeout: config.command_timeout,
        })
    }
}

impl ArtifactMounter for Hdiutil {
    async fn attach(&self, image: &Path) -> Result<PathBuf> {
        let output = run_checked(
            &self.program,
            [OsStr::new("attach"), image.as_os_str(), OsStr::new("-nobrowse")],
            self.timeout,
        )
        .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mount_point = parse_mount_point(&stdout)
            .ok_or_else(|| {
                Error::GenericError("Failed to mount DMG: no /Volumes mount point reported".into())
            })?;
        log::debug!("DMG mounted at {}", mount_point.display());
        Ok(mount_point)
    }

    async fn detach(&self, mount_point: &Path) -> Result<()> {
        let output = run_captured(
            &self.program,
            [OsStr::new("detach"), mount_point.as_os_str()],
            self.timeout,
        )
        .await?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: format!("hdiutil detach {}", mount_point.display()),
                reason: failure_reason(&output),
            });
        }
        Ok(())
    }
}

/// Returns the last `/Volumes/...` path printed by `hdiutil attach`.
pub fn parse_mount_point(stdout: &str) -> Option<PathBuf> {
    VOLUME_PATH
        .find_iter(stdout)
        .last()
        .map(|m| PathBuf::from(m.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_point_is_last_volume_line() {
        let stdout = "/dev/disk4          \tGUID_partition_scheme          \t\n\
                      /dev/disk4s1        \tApple_APFS                     \t\n\
                      /dev/disk5s1        \t41504653-0000-11AA-AA11-0030654\t/Volumes/WeChat \n";
        assert_eq!(
            parse_mount_point(stdout),
            Some(PathBuf::from("/Volumes/WeChat"))
        );
    }

    #[test]
    fn volume_names_with_spaces_survive() {
        let stdout = "/dev/disk6s2\tApple_HFS\t/Volumes/WeChat for Mac\n";
        assert_eq!(
            parse_mount_point(stdout),
            Some(PathBuf::from("/Volumes/WeChat for Mac"))
        );
    }

    #[test]
    fn no_mount_point() {
        assert_eq!(parse_mount_point("hdiutil: attach failed\n"), None);
    }
}
