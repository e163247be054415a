//! Source video download over HTTP.
//!
//! Streams the response body straight to disk so memory use stays flat
//! regardless of source size, and aborts once the configured byte limit is
//! exceeded.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Fetches remote source videos into local files.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
    max_bytes: u64,
}

impl SourceFetcher {
    /// Create a fetcher identifying itself with `user_agent`.
    ///
    /// `timeout` bounds connection setup and each read of the response, so a
    /// large source that keeps streaming is never cut off mid-transfer.
    pub fn new(user_agent: &str, timeout: Duration, max_bytes: u64) -> MediaResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| MediaError::download_failed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// Transport errors and non-2xx responses are `DownloadFailed`; a body
    /// larger than the limit is `ResourceLimit`. A partially written file is
    /// left in place for the caller's workspace to remove.
    pub async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        info!(url = %url, dest = %dest.display(), "Downloading source video");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "Source responded with HTTP {}",
                status
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large(length));
            }
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| MediaError::download_failed(format!("Body read failed: {}", e)))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(self.too_large(written));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(bytes = written, dest = %dest.display(), "Source video downloaded");
        Ok(written)
    }

    fn too_large(&self, size: u64) -> MediaError {
        MediaError::resource_limit(format!(
            "source video exceeds {} bytes (got at least {})",
            self.max_bytes, size
        ))
    }
}
