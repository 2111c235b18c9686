//! Command line argument parsing and validation.
//!
//! Every option can also be set from the environment, which is how CI
//! schedules usually drive the watcher (`FORCE_RELEASE=1`, etc.).

use crate::watcher::{
    WatchConfig,
    config::{DEFAULT_LINK_MARKER, DEFAULT_MD5_HEADER, DEFAULT_PAGE_URL, is_truthy},
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Republish new vendor macOS builds as versioned releases
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mac_release_watcher",
    version,
    about = "Republish new vendor macOS builds as versioned releases",
    long_about = "Scrapes the vendor page for the current DMG, compares it with the latest \
published release, and publishes a new release (image + checksum sidecar + notes) when the \
content changed.

Usage:
  mac_release_watcher
  FORCE_RELEASE=1 mac_release_watcher --repo owner/wechat-mac-mirror

Exit code 0 = published or nothing new; 1 = failure."
)]
pub struct Args {
    /// Vendor page carrying the download button
    #[arg(long, env = "WATCH_PAGE_URL", default_value = DEFAULT_PAGE_URL)]
    pub page_url: String,

    /// Class token marking the download anchor
    #[arg(long, env = "WATCH_LINK_CLASS", default_value = DEFAULT_LINK_MARKER)]
    pub link_class: String,

    /// Response header holding the vendor MD5
    #[arg(long, env = "WATCH_MD5_HEADER", default_value = DEFAULT_MD5_HEADER)]
    pub md5_header: String,

    /// Application bundle inside the disk image
    #[arg(long, env = "WATCH_APP_BUNDLE", default_value = "WeChat.app")]
    pub app_bundle: String,

    /// Base name for release assets
    #[arg(long, env = "WATCH_ARTIFACT_NAME", default_value = "WeChatMac")]
    pub artifact_name: String,

    /// Product name shown in release notes
    #[arg(long, env = "WATCH_PRODUCT_NAME", default_value = "WeChat")]
    pub product_name: String,

    /// Release title prefix
    #[arg(long, env = "WATCH_TITLE_PREFIX", default_value = "Wechat For Mac")]
    pub title_prefix: String,

    /// Working directory (removed after every run); defaults to ./<artifact-name>
    #[arg(long, env = "WATCH_WORK_DIR", value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Repository to publish to (passed to `gh -R`); defaults to the current repository
    #[arg(short = 'R', long, env = "WATCH_REPO", value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Publish even when the checksums match the latest release
    #[arg(
        long,
        env = "FORCE_RELEASE",
        value_name = "BOOL",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_truthy
    )]
    pub force_release: bool,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "WATCH_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,
}

fn parse_truthy(value: &str) -> Result<bool, String> {
    Ok(is_truthy(value))
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("page-url", &self.page_url),
            ("link-class", &self.link_class),
            ("md5-header", &self.md5_header),
            ("app-bundle", &self.app_bundle),
            ("artifact-name", &self.artifact_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("--{name} cannot be empty"));
            }
        }

        if !self.app_bundle.ends_with(".app") {
            return Err(format!(
                "Invalid app bundle: {}. Expected a name ending in .app",
                self.app_bundle
            ));
        }

        if let Err(e) = url::Url::parse(&self.page_url) {
            return Err(format!("Invalid page URL {}: {}", self.page_url, e));
        }

        if self.http_timeout == 0 {
            return Err("--http-timeout must be at least 1 second".to_string());
        }

        Ok(())
    }
}

impl From<&Args> for WatchConfig {
    fn from(args: &Args) -> Self {
        let work_dir = args
            .work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&args.artifact_name));

        Self {
            page_url: args.page_url.clone(),
            link_marker: args.link_class.clone(),
            md5_header: args.md5_header.clone(),
            app_bundle: args.app_bundle.clone(),
            artifact_name: args.artifact_name.clone(),
            product_name: args.product_name.clone(),
            title_prefix: args.title_prefix.clone(),
            work_dir,
            force_release: args.force_release,
            http_timeout: Duration::from_secs(args.http_timeout),
            ..WatchConfig::default()
        }
    }
}
