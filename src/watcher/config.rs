//! Explicit run configuration for the release watcher.

use super::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Page that carries the download button for the Mac client.
pub const DEFAULT_PAGE_URL: &str = "https://mac.weixin.qq.com/?t=mac&lang=zh_CN";

/// Class token marking the download anchor on the page.
pub const DEFAULT_LINK_MARKER: &str = "download-button";

/// Response header carrying the object MD5 on the vendor CDN.
pub const DEFAULT_MD5_HEADER: &str = "x-cos-meta-md5";

/// Configuration for a single watch run.
///
/// Built once at start-up (usually from CLI arguments and the environment)
/// and passed into the [`ReleaseWatcher`](super::ReleaseWatcher).
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Vendor page to scrape for the download link
    pub page_url: String,
    /// Class token identifying the download anchor
    pub link_marker: String,
    /// HEAD response header holding the remote MD5
    pub md5_header: String,
    /// Name of the `.app` bundle inside the disk image
    pub app_bundle: String,
    /// Base file name for release assets (e.g. `WeChatMac`)
    pub artifact_name: String,
    /// Product name used in release notes
    pub product_name: String,
    /// Prefix of the release title
    pub title_prefix: String,
    /// Working tree, removed at the end of every run
    pub work_dir: PathBuf,
    /// Republish even when checksums match
    pub force_release: bool,
    /// Timeout for each HTTP request
    pub http_timeout: Duration,
    /// Timeout for external commands (mount, registry lookups)
    pub command_timeout: Duration,
    /// Timeout for the publish call, which includes asset uploads
    pub publish_timeout: Duration,
    /// Policy for the HEAD metadata probe
    pub probe_retry: RetryPolicy,
    /// Outer download attempts
    pub download_retry: RetryPolicy,
    /// Inner retries within one download attempt
    pub transfer_retry: RetryPolicy,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            link_marker: DEFAULT_LINK_MARKER.to_string(),
            md5_header: DEFAULT_MD5_HEADER.to_string(),
            app_bundle: "WeChat.app".to_string(),
            artifact_name: "WeChatMac".to_string(),
            product_name: "WeChat".to_string(),
            title_prefix: "Wechat For Mac".to_string(),
            work_dir: PathBuf::from("WeChatMac"),
            force_release: false,
            http_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(120),
            publish_timeout: Duration::from_secs(1800),
            probe_retry: RetryPolicy::new(2, Duration::from_secs(10)),
            download_retry: RetryPolicy::new(2, Duration::from_secs(10)),
            transfer_retry: RetryPolicy::new(5, Duration::from_secs(5)),
        }
    }
}

impl WatchConfig {
    /// Scratch directory for the raw download and release notes.
    pub fn temp_dir(&self) -> PathBuf {
        self.work_dir.join("temp")
    }

    /// Where the freshly downloaded image lands before it is inspected.
    pub fn download_path(&self) -> PathBuf {
        self.temp_dir().join(format!("{}.dmg", self.artifact_name))
    }

    /// Per-version directory holding the release assets.
    pub fn version_dir(&self, tag: &str) -> PathBuf {
        self.work_dir.join(tag)
    }

    /// Renamed image for a given tag: `<version_dir>/<name>-<tag>.dmg`.
    pub fn release_image_path(&self, tag: &str) -> PathBuf {
        self.version_dir(tag)
            .join(format!("{}-{}.dmg", self.artifact_name, tag))
    }

    /// Sidecar next to the release image.
    pub fn sidecar_path(&self, tag: &str) -> PathBuf {
        self.version_dir(tag)
            .join(format!("{}-{}.dmg.sha256", self.artifact_name, tag))
    }

    /// Notes file handed to the release host.
    pub fn notes_path(&self) -> PathBuf {
        self.temp_dir().join("release_notes.txt")
    }

    /// Release title for a tag.
    pub fn release_title(&self, tag: &str) -> String {
        format!("{} {}", self.title_prefix, tag)
    }
}

/// Interprets common truthy spellings (`1`, `true`, `yes`, `on`).
///
/// Case-insensitive and whitespace-tolerant; anything else is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_spellings() {
        for value in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(is_truthy(value), "{value:?} should be truthy");
        }
        for value in ["", "0", "false", "no", "off", "y", "enabled"] {
            assert!(!is_truthy(value), "{value:?} should be falsy");
        }
    }

    #[test]
    fn asset_layout() {
        let config = WatchConfig {
            work_dir: PathBuf::from("/work"),
            ..Default::default()
        };
        assert_eq!(
            config.download_path(),
            PathBuf::from("/work/temp/WeChatMac.dmg")
        );
        assert_eq!(
            config.release_image_path("4.0.1"),
            PathBuf::from("/work/4.0.1/WeChatMac-4.0.1.dmg")
        );
        assert_eq!(
            config.sidecar_path("4.0.1"),
            PathBuf::from("/work/4.0.1/WeChatMac-4.0.1.dmg.sha256")
        );
        assert_eq!(config.release_title("4.0.1"), "Wechat For Mac 4.0.1");
    }
}
