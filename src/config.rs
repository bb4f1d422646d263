//! Configuration types for catalog-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default catalog listing endpoint
pub const DEFAULT_ENDPOINT: &str = "http://app-homevision-staging.herokuapp.com/api_project/houses";

/// Catalog listing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Listing endpoint; `page=<n>` is appended as the only query parameter
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Number of pages to fetch, starting at page 1 (default: 10)
    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// Records expected on each page, used only to size the progress display (default: 10)
    #[serde(default = "default_records_per_page")]
    pub records_per_page: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_count: default_page_count(),
            records_per_page: default_records_per_page(),
        }
    }
}

/// Asset download settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory the assets are written to (default: "./out")
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Treat non-success download statuses as errors (default: true)
    ///
    /// Setting this to false writes whatever body the server returns, error pages included.
    /// The HEAD probe is governed by `strict_probe_status` instead.
    #[serde(default = "default_true")]
    pub strict_status: bool,

    /// Treat non-success HEAD probe statuses as errors (default: false)
    ///
    /// When off, the probe only needs a `Content-Type` header, so hosts that
    /// answer HEAD with 405 but serve GET still work.
    #[serde(default)]
    pub strict_probe_status: bool,

    /// Per-request timeout (None = no timeout)
    #[serde(default, with = "optional_duration_millis")]
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            strict_status: true,
            strict_probe_status: false,
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Retry strategy shared by the page fetch and the per-record download chain
///
/// The default retries forever with no delay. Every other combination is opt-in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (None = unbounded)
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Delay before the first retry (default: 0)
    #[serde(default, with = "duration_millis")]
    pub initial_delay: Duration,

    /// Upper bound for any single delay (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after every retry (default: 1.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,

    /// Retry every error, not just transient ones (default: true)
    #[serde(default = "default_true")]
    pub retry_all_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::ZERO,
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
            retry_all_errors: true,
        }
    }
}

impl RetryConfig {
    /// True when this configuration never gives up
    pub fn is_unbounded(&self) -> bool {
        self.max_retries.is_none() && self.retry_all_errors
    }
}

/// Main configuration for [`Harvester`](crate::Harvester)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog listing settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Asset download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Retry strategy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Check settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.catalog.endpoint).map_err(|e| {
            Error::config(format!("invalid endpoint: {e}"), "catalog.endpoint")
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(
                format!("endpoint must be http or https, got {}", endpoint.scheme()),
                "catalog.endpoint",
            ));
        }
        if self.catalog.records_per_page == 0 {
            return Err(Error::config(
                "records_per_page must be at least 1",
                "catalog.records_per_page",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                format!(
                    "backoff_multiplier must be finite and >= 1.0, got {}",
                    self.retry.backoff_multiplier
                ),
                "retry.backoff_multiplier",
            ));
        }
        Ok(())
    }

    /// Save directory
    pub fn save_dir(&self) -> &Path {
        &self.download.save_dir
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_page_count() -> u32 {
    10
}

fn default_records_per_page() -> u32 {
    10
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

// Duration serialization helper (integer milliseconds)
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper
mod optional_duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
