//! Download link resolution and remote metadata probing.
//!
//! # Module Organization
//!
//! - [`link`] - Marked-anchor extraction from page markup
//!
//! The HTTP side lives in [`HttpFetcher`], which implements [`PageSource`].

pub mod link;

use crate::watcher::{
    error::{Error, Result},
    retry::{RetryPolicy, with_retry},
};
use link::{LinkExtractor, MarkedLinkExtractor};
use reqwest::header::{CONTENT_LENGTH, HeaderMap, LAST_MODIFIED, USER_AGENT};
use std::fmt;
use std::time::Duration;
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// The scraped download link.
///
/// `href` is written to notes and sidecars exactly as it appeared on the page
/// (after entity decoding). Relative links are the one exception: they are
/// recorded in their resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// Parsed URL used for requests
    pub url: Url,
    /// Link text as recorded in release documents
    pub href: String,
}

impl DownloadLink {
    /// Resolves `href` against the page it was found on.
    pub fn resolve(page: &Url, href: &str) -> Result<Self> {
        let url = page.join(href)?;
        let href = if Url::parse(href).is_ok() {
            href.to_string()
        } else {
            url.to_string()
        };
        Ok(Self { url, href })
    }

    /// Parses an absolute link, keeping its text verbatim.
    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(href)?,
            href: href.to_string(),
        })
    }
}

impl fmt::Display for DownloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

/// Metadata read from a header-only probe of the download URL.
///
/// All fields except the URL are advisory; a failed probe yields
/// [`RemoteMetadata::empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Resolved direct download URL
    pub download_url: Url,
    /// The link as recorded in release documents
    pub download_from: String,
    /// Vendor-published MD5 of the file body
    pub md5: Option<String>,
    /// `Content-Length` as sent by the server
    pub content_length: Option<String>,
    /// `Last-Modified` as sent by the server
    pub last_modified: Option<String>,
}

impl RemoteMetadata {
    /// Metadata with no header information.
    pub fn empty(link: &DownloadLink) -> Self {
        Self {
            download_url: link.url.clone(),
            download_from: link.href.clone(),
            md5: None,
            content_length: None,
            last_modified: None,
        }
    }

    /// Picks the interesting headers out of a probe response.
    pub fn from_headers(link: &DownloadLink, headers: &HeaderMap, md5_header: &str) -> Self {
        let md5_header = md5_header.to_ascii_lowercase();
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        Self {
            md5: get(&md5_header),
            content_length: get(CONTENT_LENGTH.as_str()),
            last_modified: get(LAST_MODIFIED.as_str()),
            ..Self::empty(link)
        }
    }
}

/// Source of the download link and its metadata.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Resolves the current direct download URL.
    ///
    /// Fails with [`Error::NotFound`] when the page carries no marked link.
    async fn fetch_download_link(&self) -> Result<DownloadLink>;

    /// Probes `link` for metadata. Never fails: probe errors yield empty metadata.
    async fn fetch_metadata(&self, link: &DownloadLink) -> RemoteMetadata;
}

/// [`PageSource`] backed by HTTP requests to the vendor site.
#[derive(Debug, Clone)]
pub struct HttpFetcher<E = MarkedLinkExtractor> {
    client: reqwest::Client,
    page_url: Url,
    extractor: E,
    md5_header: String,
    timeout: Duration,
    probe_retry: RetryPolicy,
}

impl HttpFetcher<MarkedLinkExtractor> {
    /// Creates a fetcher from the run configuration.
    pub fn from_config(config: &crate::watcher::WatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            page_url: Url::parse(&config.page_url)?,
            extractor: MarkedLinkExtractor::new(&config.link_marker),
            md5_header: config.md5_header.clone(),
            timeout: config.http_timeout,
            probe_retry: config.probe_retry,
        })
    }
}

impl<E: LinkExtractor> HttpFetcher<E> {
    /// Replaces the link extraction strategy.
    pub fn with_extractor<X: LinkExtractor>(self, extractor: X) -> HttpFetcher<X> {
        HttpFetcher {
            client: self.client,
            page_url: self.page_url,
            extractor,
            md5_header: self.md5_header,
            timeout: self.timeout,
            probe_retry: self.probe_retry,
        }
    }

    async fn probe(&self, url: &Url) -> Result<HeaderMap> {
        let response = self
            .client
            .head(url.clone())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.headers().clone())
    }
}

impl<E: LinkExtractor> PageSource for HttpFetcher<E> {
    async fn fetch_download_link(&self) -> Result<DownloadLink> {
        log::debug!("Fetching {}", self.page_url);
        let html = self
            .client
            .get(self.page_url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let href = self
            .extractor
            .extract(&html)
            .ok_or_else(|| Error::NotFound {
                page: self.page_url.to_string(),
            })?;

        DownloadLink::resolve(&self.page_url, &href)
    }

    async fn fetch_metadata(&self, link: &DownloadLink) -> RemoteMetadata {
        match with_retry(&self.probe_retry, "HEAD request", |_| self.probe(&link.url)).await {
            Ok(headers) => RemoteMetadata::from_headers(link, &headers, &self.md5_header),
            Err((attempts, e)) => {
                log::warn!("HEAD request failed after {} attempt(s): {}", attempts, e);
                RemoteMetadata::empty(link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn link() -> DownloadLink {
        DownloadLink::parse("https://cdn.example.com/WeChatMac.dmg").unwrap()
    }

    #[test]
    fn headers_are_trimmed_and_optional() {
        let mut headers = HeaderMap::new();
        headers.insert("x-cos-meta-md5", HeaderValue::from_static(" abc123 "));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1024"));
        headers.insert(LAST_MODIFIED, HeaderValue::from_static(""));

        let meta = RemoteMetadata::from_headers(&link(), &headers, "X-Cos-Meta-Md5");
        assert_eq!(meta.md5.as_deref(), Some("abc123"));
        assert_eq!(meta.content_length.as_deref(), Some("1024"));
        assert_eq!(meta.last_modified, None);
    }

    #[test]
    fn empty_metadata_keeps_url() {
        let meta = RemoteMetadata::empty(&link());
        assert_eq!(meta.download_url, link().url);
        assert_eq!(meta.download_from, "https://cdn.example.com/WeChatMac.dmg");
        assert!(meta.md5.is_none() && meta.content_length.is_none());
    }

    #[test]
    fn absolute_link_text_is_kept_verbatim() {
        let page = Url::parse("https://mac.weixin.qq.com/?t=mac").unwrap();
        let href = "https://dldir1.qq.com/weixin/Mac File/WeChatMac.dmg?a=1&b=x y";

        let link = DownloadLink::resolve(&page, href).unwrap();
        assert_eq!(link.href, href);
        assert_eq!(link.to_string(), href);
        assert_eq!(
            link.url.as_str(),
            "https://dldir1.qq.com/weixin/Mac%20File/WeChatMac.dmg?a=1&b=x%20y"
        );
        assert_eq!(RemoteMetadata::empty(&link).download_from, href);
    }

    #[test]
    fn relative_link_is_recorded_resolved() {
        let page = Url::parse("https://mac.weixin.qq.com/download/").unwrap();
        let link = DownloadLink::resolve(&page, "../WeChatMac.dmg").unwrap();
        assert_eq!(link.href, "https://mac.weixin.qq.com/WeChatMac.dmg");
        assert_eq!(link.url.as_str(), link.href);
    }
}
