//! Streaming HTTP transfer with inner retries.

use crate::watcher::{
    WatchConfig,
    error::{Error, ErrorExt, Result},
    retry::{RetryPolicy, with_retry_if},
};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Moves the bytes behind a URL onto local disk.
#[allow(async_fn_in_trait)]
pub trait Transfer {
    /// Writes the body of `url` to `dest`, replacing any existing file.
    async fn transfer(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// [`Transfer`] over HTTP with a bounded number of inner retries.
///
/// Connection failures (including refused connections), timeouts, 5xx and
/// 429 responses are retried. Other statuses fail on the first try.
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransfer {
    /// Creates a transfer client using the configured timeouts and inner retry policy.
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .read_timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            retry: config.transfer_retry,
        })
    }

    async fn fetch_once(&self, url: &Url, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .fs_context("creating download file", dest)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .fs_context("writing download file", dest)?;
            written += chunk.len() as u64;
        }
        file.flush().await.fs_context("flushing download file", dest)?;
        Ok(written)
    }
}

impl Transfer for HttpTransfer {
    async fn transfer(&self, url: &Url, dest: &Path) -> Result<()> {
        let written = with_retry_if(&self.retry, "Transfer", Error::is_transient, |_| {
            self.fetch_once(url, dest)
        })
        .await
        .map_err(|(attempts, e)| {
            log::warn!("Transfer of {} gave up after {} tries", url, attempts);
            e
        })?;
        log::debug!("Transferred {} bytes to {}", written, dest.display());
        Ok(())
    }
}
