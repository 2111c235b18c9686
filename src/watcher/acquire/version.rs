//! Version tag extraction from the bundled application's `Info.plist`.

use crate::watcher::error::{Error, Result};
use plist::Value;
use std::path::Path;

/// `Info.plist` key holding the marketing version.
pub const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";
/// `Info.plist` key holding the build number.
pub const BUILD_KEY: &str = "CFBundleVersion";
/// `Info.plist` key holding the vendor's unified version string.
pub const UNIFIED_VERSION_KEY: &str = "WeChatBundleVersion";

/// Version fields read from an application bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleVersions {
    /// `CFBundleShortVersionString`, trimmed
    pub short_version: String,
    /// `CFBundleVersion`, trimmed
    pub build: String,
    /// Unified version string, trimmed
    pub unified: String,
}

impl BundleVersions {
    /// Reads the version fields from a plist file.
    pub fn from_plist(path: &Path) -> Result<Self> {
        let value = Value::from_file(path)?;
        let dict = value.as_dictionary().ok_or_else(|| {
            Error::Metadata(format!("{} is not a dictionary", path.display()))
        })?;

        let field = |key: &str| dict.get(key).map(stringify).unwrap_or_default();
        Ok(Self {
            short_version: field(SHORT_VERSION_KEY),
            build: field(BUILD_KEY),
            unified: field(UNIFIED_VERSION_KEY),
        })
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Boolean(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Derives a release tag from version fields.
///
/// A non-empty unified version is used verbatim. Otherwise the tag is
/// `{short}+build.{build}` and both parts must be non-empty.
pub fn derive_tag(short_version: &str, build: &str, unified: &str) -> Result<String> {
    let unified = unified.trim();
    if !unified.is_empty() {
        return Ok(unified.to_string());
    }

    let short_version = short_version.trim();
    let build = build.trim();
    if short_version.is_empty() {
        return Err(Error::Metadata(format!("{SHORT_VERSION_KEY} not found")));
    }
    if build.is_empty() {
        return Err(Error::Metadata(format!("{BUILD_KEY} not found")));
    }
    Ok(format!("{short_version}+build.{build}"))
}

/// Reads the tag from `Info.plist` inside a mounted image.
///
/// Both `CFBundleShortVersionString` and `CFBundleVersion` must be present
/// even when the unified version wins; their absence means the bundle is not
/// the expected application.
pub fn extract_version_tag(info_plist: &Path) -> Result<String> {
    if !info_plist.is_file() {
        return Err(Error::Metadata(format!(
            "Info.plist not found in mounted volume ({})",
            info_plist.display()
        )));
    }

    let versions = BundleVersions::from_plist(info_plist)?;
    if versions.short_version.is_empty() {
        return Err(Error::Metadata(format!("{SHORT_VERSION_KEY} not found")));
    }
    if versions.build.is_empty() {
        return Err(Error::Metadata(format!("{BUILD_KEY} not found")));
    }
    derive_tag(&versions.short_version, &versions.build, &versions.unified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Dictionary;

    fn write_plist(dir: &Path, entries: &[(&str, Value)]) -> std::path::PathBuf {
        let mut dict = Dictionary::new();
        for (k, v) in entries {
            dict.insert(k.to_string(), v.clone());
        }
        let path = dir.join("Info.plist");
        Value::Dictionary(dict).to_file_xml(&path).unwrap();
        path
    }

    #[test]
    fn unified_version_wins() {
        assert_eq!(derive_tag("9.9", "1", "1.2.3").unwrap(), "1.2.3");
        assert_eq!(derive_tag("", "", "1.2.3").unwrap(), "1.2.3");
    }

    #[test]
    fn composed_fallback() {
        assert_eq!(derive_tag("1.2.3", "456", "").unwrap(), "1.2.3+build.456");
        assert_eq!(derive_tag(" 1.2.3 ", " 456 ", "  ").unwrap(), "1.2.3+build.456");
    }

    #[test]
    fn missing_build_is_metadata_error() {
        let err = derive_tag("1.2.3", "", "").unwrap_err();
        assert!(matches!(err, Error::Metadata(ref m) if m.contains(BUILD_KEY)));
        let err = derive_tag("", "456", "").unwrap_err();
        assert!(matches!(err, Error::Metadata(ref m) if m.contains(SHORT_VERSION_KEY)));
    }

    #[test]
    fn reads_plist_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plist(
            dir.path(),
            &[
                (SHORT_VERSION_KEY, Value::String("4.0.1".into())),
                (BUILD_KEY, Value::Integer(28i64.into())),
                (UNIFIED_VERSION_KEY, Value::String(" 4.0.1.28 ".into())),
            ],
        );
        assert_eq!(extract_version_tag(&path).unwrap(), "4.0.1.28");

        let path = write_plist(
            dir.path(),
            &[
                (SHORT_VERSION_KEY, Value::String("3.8.9".into())),
                (BUILD_KEY, Value::String("31927".into())),
            ],
        );
        assert_eq!(extract_version_tag(&path).unwrap(), "3.8.9+build.31927");
    }

    #[test]
    fn plist_without_build_fails_even_with_unified() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plist(
            dir.path(),
            &[
                (SHORT_VERSION_KEY, Value::String("4.0.1".into())),
                (UNIFIED_VERSION_KEY, Value::String("4.0.1.28".into())),
            ],
        );
        assert!(matches!(
            extract_version_tag(&path),
            Err(Error::Metadata(_))
        ));
    }

    #[test]
    fn missing_plist_is_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_version_tag(&dir.path().join("Info.plist")).unwrap_err();
        assert!(matches!(err, Error::Metadata(ref m) if m.contains("Info.plist not found")));
    }
}
