//! Asset probe and download
//!
//! [`AssetSource::probe_extension`] issues a HEAD request and turns the
//! `Content-Type` into a file extension. [`AssetSource::download_asset`] streams
//! a GET body into a file, replacing whatever was there before.

use crate::error::{DownloadError, ProbeError};
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Abstraction over asset probing and downloading, enabling testability.
#[async_trait::async_trait]
pub trait AssetSource: Send + Sync {
    /// Resolve the file extension for the asset at `url`
    async fn probe_extension(&self, url: &str) -> Result<String, ProbeError>;

    /// Download the asset at `url` into `destination`, returning bytes written
    async fn download_asset(&self, url: &str, destination: &Path) -> Result<u64, DownloadError>;
}

/// Map a `Content-Type` value to a file extension
///
/// Takes the subtype after the first `/` (or the whole value when there is no
/// `/`), drops any `;` parameters, and maps `jpeg` to `jpg`. Returns `None` for
/// a blank header.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let content_type = content_type.trim();
    if content_type.is_empty() {
        return None;
    }

    let subtype = match content_type.find('/') {
        Some(idx) => &content_type[idx + 1..],
        None => content_type,
    };
    let subtype = subtype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    Some(match subtype.as_str() {
        "jpeg" => "jpg".to_string(),
        _ => subtype,
    })
}

/// Production [`AssetSource`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
    strict_status: bool,
    strict_probe_status: bool,
}

impl HttpAssetFetcher {
    /// Create a fetcher sharing the given HTTP client
    ///
    /// With `strict_status` off, non-success download responses are written
    /// like any other. The HEAD probe only reads `Content-Type` unless
    /// [`with_probe_status_check`](Self::with_probe_status_check) turns its
    /// status check on.
    pub fn new(client: reqwest::Client, strict_status: bool) -> Self {
        Self {
            client,
            strict_status,
            strict_probe_status: false,
        }
    }

    /// Also reject non-success HEAD responses
    ///
    /// Off by default: hosts that refuse HEAD (405) but serve GET would
    /// otherwise never get past the probe.
    pub fn with_probe_status_check(mut self, check: bool) -> Self {
        self.strict_probe_status = check;
        self
    }
}

#[async_trait::async_trait]
impl AssetSource for HttpAssetFetcher {
    async fn probe_extension(&self, url: &str) -> Result<String, ProbeError> {
        let response = self.client.head(url).send().await?;

        if self.strict_probe_status && !response.status().is_success() {
            return Err(ProbeError::BadStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(extension_from_content_type)
            .ok_or_else(|| ProbeError::MissingHeader {
                url: url.to_string(),
            })
    }

    async fn download_asset(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        let mut response = self.client.get(url).send().await?;

        if self.strict_status && !response.status().is_success() {
            return Err(DownloadError::BadStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let io_err = |source: std::io::Error| DownloadError::Io {
            path: destination.to_path_buf(),
            source,
        };

        // File::create truncates, so a retry never leaves stale trailing bytes
        let mut file = tokio::fs::File::create(destination).await.map_err(io_err)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;

        tracing::debug!(url, path = %destination.display(), bytes = written, "asset written");
        Ok(written)
    }
}
