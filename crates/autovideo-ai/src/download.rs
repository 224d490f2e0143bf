//! Streaming file downloads.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AiError, AiResult};

const USER_AGENT: &str = concat!("autovideo/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client used by every service client.
pub fn http_client() -> AiResult<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(AiError::Network)
}

/// Fetches a remote asset to a local path.
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Download `url` into `dest`. On failure `dest` does not exist.
    async fn download(&self, url: &str, dest: &Path) -> AiResult<()>;
}

#[async_trait]
impl<T: AssetDownloader + ?Sized> AssetDownloader for Arc<T> {
    async fn download(&self, url: &str, dest: &Path) -> AiResult<()> {
        (**self).download(url, dest).await
    }
}

/// Downloader that streams response bodies straight to disk.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    http: Client,
}

impl HttpDownloader {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> AiResult<u64> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AiError::download_failed(url, format!("HTTP {}", status)));
        }

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(AiError::download_failed(url, "empty response body"));
        }
        Ok(written)
    }
}

#[async_trait]
impl AssetDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> AiResult<()> {
        match self.stream_to_file(url, dest).await {
            Ok(bytes) => {
                debug!(url, bytes, dest = %dest.display(), "Downloaded asset");
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }
}
