//! Download link extraction from vendor page markup.
//!
//! The page is expected to carry an anchor whose `class` list contains a
//! marker token (e.g. `<a class="btn download-button" href="...">`). Vendor
//! redesigns break this; a missing link is reported as
//! [`Error::NotFound`](crate::watcher::Error::NotFound) by the fetcher.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

// Comments and raw-text elements never contain live markup
static INERT_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("inert markup pattern is valid")
});

// A '>' inside a quoted attribute value does not close the tag
static ANCHOR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a(?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?>"#).expect("anchor pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Pulls the download URL out of page markup.
pub trait LinkExtractor {
    /// Returns the raw href of the download link, if present.
    fn extract(&self, html: &str) -> Option<String>;
}

/// Extracts the first anchor carrying a marker class token.
#[derive(Debug, Clone)]
pub struct MarkedLinkExtractor {
    marker: String,
}

impl MarkedLinkExtractor {
    /// Creates an extractor looking for `marker` in anchor class lists.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl LinkExtractor for MarkedLinkExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        extract_first_marked_link(html, &self.marker)
    }
}

/// Returns the trimmed, entity-decoded `href` of the first `<a>` whose class
/// list contains `marker`.
///
/// Anchors inside comments, `<script>` and `<style>` are ignored. Marked
/// anchors with an empty `href` are skipped.
pub fn extract_first_marked_link(html: &str, marker: &str) -> Option<String> {
    let live = INERT_MARKUP.replace_all(html, " ");
    ANCHOR_TAG.find_iter(&live).find_map(|tag| {
        let tag = tag.as_str();
        // Strip "<a" and the closing '>'
        let body = &tag[2..tag.len() - 1];

        let mut class = None;
        let mut href = None;
        for caps in ATTRIBUTE.captures_iter(body) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            match name.as_str() {
                "class" if class.is_none() => class = Some(value),
                "href" if href.is_none() => href = Some(value),
                _ => {}
            }
        }

        let marked = class
            .map(|c| c.split_whitespace().any(|token| token == marker))
            .unwrap_or(false);
        if !marked {
            return None;
        }

        let link = decode_entities(href?.trim());
        (!link.is_empty()).then_some(link)
    })
}

/// Decodes character references in one pass; unknown names stay verbatim.
fn decode_entities(value: &str) -> String {
    ENTITY
        .replace_all(value, |caps: &Captures<'_>| -> Cow<'static, str> {
            let reference = &caps[1];
            let hex = reference
                .strip_prefix("#x")
                .or_else(|| reference.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = reference.strip_prefix('#') {
                dec.parse().ok()
            } else {
                None
            };
            if let Some(c) = code.and_then(char::from_u32) {
                return Cow::Owned(c.to_string());
            }
            match reference {
                "amp" => Cow::Borrowed("&"),
                "lt" => Cow::Borrowed("<"),
                "gt" => Cow::Borrowed(">"),
                "quot" => Cow::Borrowed("\""),
                "apos" => Cow::Borrowed("'"),
                _ => Cow::Owned(caps[0].to_string()),
            }
        })
        .into_owned()
}
