//! HTTP adapters against a local mock server.

use mac_release_watcher::watcher::{
    ArtifactAcquirer, DownloadLink, Error, HttpFetcher, HttpTransfer, PageSource, WatchConfig,
    retry::RetryPolicy,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> WatchConfig {
    WatchConfig {
        page_url: format!("{}/download/?t=mac", server.uri()),
        probe_retry: RetryPolicy::immediate(2),
        download_retry: RetryPolicy::immediate(2),
        transfer_retry: RetryPolicy::immediate(2),
        ..Default::default()
    }
}

const PAGE: &str = r#"<html><body>
  <a class="nav" href="/home">Home</a>
  <a class="btn download-button" href="../files/WeChatMac.dmg?v=1&amp;lang=zh">Download</a>
  <a class="download-button" href="/second.dmg">Other</a>
</body></html>"#;

#[tokio::test]
async fn resolves_relative_link_against_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&config(&server)).unwrap();
    let link = fetcher.fetch_download_link().await.unwrap();

    let expected = format!("{}/files/WeChatMac.dmg?v=1&lang=zh", server.uri());
    assert_eq!(link.url.as_str(), expected);
    assert_eq!(link.href, expected);
}

#[tokio::test]
async fn page_without_marked_anchor_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<a href='/x.dmg'>x</a>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&config(&server)).unwrap();
    let err = fetcher.fetch_download_link().await.unwrap_err();

    assert!(matches!(err, Error::NotFound { ref page } if page.contains("/download/")));
}

#[tokio::test]
async fn page_error_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&config(&server)).unwrap();
    assert!(matches!(
        fetcher.fetch_download_link().await,
        Err(Error::Http(_))
    ));
}

#[tokio::test]
async fn head_probe_reads_vendor_headers() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/WeChatMac.dmg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-cos-meta-md5", "d41d8cd98f00b204e9800998ecf8427e")
                .insert_header("last-modified", "Tue, 14 Oct 2025 08:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&config(&server)).unwrap();
    let link = DownloadLink::parse(&format!("{}/WeChatMac.dmg", server.uri())).unwrap();
    let meta = fetcher.fetch_metadata(&link).await;

    assert_eq!(meta.download_url, link.url);
    assert_eq!(meta.md5.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    assert_eq!(
        meta.last_modified.as_deref(),
        Some("Tue, 14 Oct 2025 08:00:00 GMT")
    );
}

#[tokio::test]
async fn failed_probe_yields_empty_metadata_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&config(&server)).unwrap();
    let link = DownloadLink::parse(&format!("{}/WeChatMac.dmg", server.uri())).unwrap();
    let meta = fetcher.fetch_metadata(&link).await;

    assert!(meta.md5.is_none());
    assert!(meta.content_length.is_none());
    assert!(meta.last_modified.is_none());
}

#[tokio::test]
async fn download_streams_body_to_disk() {
    let server = MockServer::start().await;
    let body = vec![7u8; 256 * 1024];
    Mock::given(method("GET"))
        .and(path("/WeChatMac.dmg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let config = config(&server);
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("temp/WeChatMac.dmg");
    let acquirer = ArtifactAcquirer::new(
        HttpTransfer::from_config(&config).unwrap(),
        config.download_retry,
    );
    let url = Url::parse(&format!("{}/WeChatMac.dmg", server.uri())).unwrap();

    acquirer.download(&url, &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let server = MockServer::start().await;
    // 2 outer attempts x 2 inner tries
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let config = config(&server);
    let dir = TempDir::new().unwrap();
    let acquirer = ArtifactAcquirer::new(
        HttpTransfer::from_config(&config).unwrap(),
        config.download_retry,
    );
    let url = Url::parse(&format!("{}/busy.dmg", server.uri())).unwrap();

    let err = acquirer
        .download(&url, &dir.path().join("WeChatMac.dmg"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Download { attempts: 2, .. }), "{err:?}");
}

#[tokio::test]
async fn missing_file_fails_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server);
    let dir = TempDir::new().unwrap();
    let acquirer = ArtifactAcquirer::new(
        HttpTransfer::from_config(&config).unwrap(),
        config.download_retry,
    );
    let url = Url::parse(&format!("{}/missing.dmg", server.uri())).unwrap();

    let err = acquirer
        .download(&url, &dir.path().join("WeChatMac.dmg"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Download { attempts: 1, ref reason } if reason.contains("404")),
        "{err:?}"
    );
}
