//! Release decision rules.
//!
//! Two skip checks guard publishing: an MD5 comparison before download (cheap,
//! only possible when the vendor exposes a content hash) and a SHA-256
//! comparison after download (authoritative fallback when the latest release
//! has no MD5 on record).

use crate::watcher::{fetch::RemoteMetadata, registry::ReleaseRecord};
use chrono::{DateTime, Utc};
use std::fmt;

/// Workflow stages of a watch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing done yet
    Init,
    /// Download link resolved from the vendor page
    LinkResolved,
    /// Remote metadata compared against the latest release
    MetadataCompared,
    /// Image downloaded and inspected
    Downloaded,
    /// Local digest compared against the latest release
    ChecksumCompared,
    /// Final tag chosen
    TagResolved,
    /// Release created
    Published,
    /// Run finished
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a run ended without publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Remote MD5 equals the MD5 of the latest release
    Md5Match(String),
    /// Downloaded image hashes to the SHA-256 of the latest release
    Sha256Match(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Md5Match(md5) => write!(f, "MD5 {md5} matches latest release"),
            SkipReason::Sha256Match(sha) => write!(f, "SHA256 {sha} matches latest release"),
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing matched; carry on
    Proceed,
    /// A match was found and publishing should stop
    Skip(SkipReason),
    /// A match was found but force release overrides it
    Overridden(SkipReason),
}

impl Verdict {
    fn on_match(reason: SkipReason, force: bool) -> Self {
        if force {
            Verdict::Overridden(reason)
        } else {
            Verdict::Skip(reason)
        }
    }
}

/// Pre-download check: skip when both MD5s are known and equal.
pub fn compare_metadata(remote: &RemoteMetadata, latest: &ReleaseRecord, force: bool) -> Verdict {
    match (remote.md5.as_deref(), latest.md5.as_deref()) {
        (Some(remote_md5), Some(latest_md5))
            if !remote_md5.is_empty() && remote_md5 == latest_md5 =>
        {
            Verdict::on_match(SkipReason::Md5Match(remote_md5.to_string()), force)
        }
        _ => Verdict::Proceed,
    }
}

/// Post-download check: when the latest release has no MD5 but does have a
/// SHA-256, skip if it equals the fresh digest.
pub fn compare_checksum(sha256: &str, latest: &ReleaseRecord, force: bool) -> Verdict {
    if latest.md5.is_some() {
        return Verdict::Proceed;
    }
    match latest.sha256.as_deref() {
        Some(latest_sha) if !latest_sha.is_empty() && latest_sha == sha256 => {
            Verdict::on_match(SkipReason::Sha256Match(sha256.to_string()), force)
        }
        _ => Verdict::Proceed,
    }
}

/// Chooses the published tag: `tag` itself, or `tag_<YYYYMMDD>` (UTC) when
/// `tag` is already taken.
pub fn resolve_tag(tag: &str, exists: bool, now: DateTime<Utc>) -> String {
    if exists {
        format!("{}_{}", tag, now.format("%Y%m%d"))
    } else {
        tag.to_string()
    }
}
