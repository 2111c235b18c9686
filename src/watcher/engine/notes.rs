//! Release notes and checksum sidecar rendering.
//!
//! Both documents are `Key: Value` line formats read back by
//! [`parse_key_values`]. The sidecar is consumed by downstream tooling, so its
//! field names and ordering must not change.

use crate::watcher::{error::Result, fetch::RemoteMetadata};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

/// `UpdateTime` format in the sidecar (always UTC).
pub const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses `Key: Value` lines, ignoring lines without a colon.
///
/// A leading list marker (`- `) is stripped from keys; values are trimmed.
/// Later duplicates win.
pub fn parse_key_values(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| {
            let key = key.trim_start_matches(['-', ' ']).trim();
            (key.to_string(), value.trim().to_string())
        })
        .collect()
}

/// Checksum sidecar published next to the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    /// Detected version tag
    pub dest_version: String,
    /// Remote MD5 (empty when the vendor did not publish one)
    pub md5: String,
    /// SHA-256 of the image
    pub sha256: String,
    /// Remote `Content-Length`
    pub content_length: Option<String>,
    /// Remote `Last-Modified`
    pub last_modified: Option<String>,
    /// When the sidecar was written
    pub update_time: DateTime<Utc>,
    /// Direct download URL
    pub download_from: String,
}

impl Sidecar {
    /// Builds a sidecar from probe metadata and the computed digest.
    pub fn new(tag: &str, remote: &RemoteMetadata, sha256: &str, update_time: DateTime<Utc>) -> Self {
        Self {
            dest_version: tag.to_string(),
            md5: remote.md5.clone().unwrap_or_default(),
            sha256: sha256.to_string(),
            content_length: remote.content_length.clone(),
            last_modified: remote.last_modified.clone(),
            update_time,
            download_from: remote.download_from.clone(),
        }
    }

    /// Renders the sidecar text.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("DestVersion: {}", self.dest_version),
            format!("Md5: {}", self.md5),
            format!("Sha256: {}", self.sha256),
        ];
        if let Some(size) = &self.content_length {
            lines.push(format!("ContentLength: {size}"));
        }
        if let Some(modified) = &self.last_modified {
            lines.push(format!("LastModified: {modified}"));
        }
        lines.push(format!(
            "UpdateTime: {} (UTC)",
            self.update_time.format(UPDATE_TIME_FORMAT)
        ));
        lines.push(format!("DownloadFrom: {}", self.download_from));
        lines.join("\n") + "\n"
    }

    /// Parses sidecar text. Returns `None` if a required field is missing.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields = parse_key_values(text);
        let update_time = fields.get("UpdateTime")?;
        let update_time = update_time.trim_end_matches("(UTC)").trim();
        let update_time = NaiveDateTime::parse_from_str(update_time, UPDATE_TIME_FORMAT)
            .ok()?
            .and_utc();

        Some(Self {
            dest_version: fields.remove("DestVersion")?,
            md5: fields.remove("Md5")?,
            sha256: fields.remove("Sha256")?,
            content_length: fields.remove("ContentLength"),
            last_modified: fields.remove("LastModified"),
            update_time,
            download_from: fields.remove("DownloadFrom")?,
        })
    }

    /// Writes the sidecar to `path`.
    pub async fn write(&self, path: &Path) -> Result<()> {
        crate::watcher::utils::fs::write_text(path, &self.render()).await
    }
}

/// Human-readable release notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    /// Product shown in the heading
    pub product_name: String,
    /// Published tag
    pub tag: String,
    /// Direct download URL
    pub download_from: String,
    /// Remote MD5 (may be empty)
    pub md5: String,
    /// SHA-256 of the image
    pub sha256: String,
    /// Remote `Content-Length`
    pub content_length: Option<String>,
    /// Remote `Last-Modified`
    pub last_modified: Option<String>,
}

impl ReleaseNotes {
    /// Builds notes for `tag` from probe metadata and the computed digest.
    pub fn new(product_name: &str, tag: &str, remote: &RemoteMetadata, sha256: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            tag: tag.to_string(),
            download_from: remote.download_from.clone(),
            md5: remote.md5.clone().unwrap_or_default(),
            sha256: sha256.to_string(),
            content_length: remote.content_length.clone(),
            last_modified: remote.last_modified.clone(),
        }
    }

    /// Renders the notes text.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{} for Mac automatic release", self.product_name),
            String::new(),
            "Download and integrity details are below.".to_string(),
            String::new(),
            "Release details".to_string(),
            format!("- DestVersion: {}", self.tag),
            String::new(),
            "Source and checksums".to_string(),
            format!("- DownloadFrom: {}", self.download_from),
            format!("- Md5: {}", self.md5),
            format!("- Sha256: {}", self.sha256),
        ];
        if let Some(size) = &self.content_length {
            lines.push(format!("- ContentLength: {size}"));
        }
        if let Some(modified) = &self.last_modified {
            lines.push(format!("- LastModified: {modified}"));
        }
        lines.join("\n") + "\n"
    }
}
