//! Error types for catalog-dl
//!
//! Each network operation has its own error enum so callers (and the retry
//! classifier) can tell a bad status from a transport failure:
//! - [`FetchError`] for the catalog listing request
//! - [`ProbeError`] for the asset content-type probe
//! - [`DownloadError`] for the asset download itself
//!
//! [`Error`] wraps all of them for the crate-level [`Result`] alias.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalog-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catalog-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "catalog.endpoint")
        key: Option<String>,
    },

    /// Catalog page could not be fetched
    #[error("catalog error: {0}")]
    Fetch(#[from] FetchError),

    /// Asset content-type probe failed
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Asset download failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of a specific fetch/probe/download step
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A spawned worker task panicked or was aborted
    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Errors from fetching one page of the catalog listing
#[derive(Debug, Error)]
pub enum FetchError {
    /// The listing endpoint answered with something other than 200 OK
    #[error("page {page} returned HTTP {status}")]
    BadStatus {
        /// Page number that was requested
        page: u32,
        /// Status code returned by the server
        status: u16,
    },

    /// The response body was not a valid listing document
    #[error("page {page} returned a malformed body: {source}")]
    Malformed {
        /// Page number that was requested
        page: u32,
        /// Underlying JSON decode error
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be sent or the body could not be read
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from probing an asset's content type
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The HEAD request could not be sent or completed
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The HEAD request returned a non-success status
    #[error("probe of {url} returned HTTP {status}")]
    BadStatus {
        /// Asset URL that was probed
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// The response carried no usable Content-Type header
    #[error("no Content-Type header for {url}")]
    MissingHeader {
        /// Asset URL that was probed
        url: String,
    },
}

/// Errors from downloading an asset to disk
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The GET request could not be sent or the body stream broke
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The GET request returned a non-success status
    #[error("download of {url} returned HTTP {status}")]
    BadStatus {
        /// Asset URL that was requested
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// The destination file could not be created or written
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
