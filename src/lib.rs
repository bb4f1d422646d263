//! # catalog-dl
//!
//! Downloads every photo referenced by a paginated house catalog.
//!
//! ## How a run works
//!
//! - One page worker per page number fetches its listing page
//! - One download worker per record probes the photo's content type,
//!   names the file `{id}-{homeowner}-{address}.{ext}` and writes it
//! - Every completed record is counted by a single progress aggregator
//! - Failures are retried; by default forever and without delay
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_dl::{Config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.catalog.page_count = 2;
//!     config.download.save_dir = "photos".into();
//!
//!     let harvester = Harvester::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = harvester.run().await?;
//!     println!("downloaded {}", summary.downloaded);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Asset probe and download
pub mod assets;
/// Catalog listing client
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Page and download workers plus the orchestrator
pub mod harvester;
/// Progress aggregation and display
pub mod progress;
/// Retry strategy
pub mod retry;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use assets::{AssetSource, HttpAssetFetcher};
pub use catalog::{CatalogSource, HttpCatalogClient};
pub use config::{CatalogConfig, Config, DownloadConfig, RetryConfig};
pub use error::{DownloadError, Error, FetchError, ProbeError, Result};
pub use harvester::Harvester;
pub use progress::{IndicatifReporter, ProgressReporter, SilentReporter};
pub use retry::{IsRetryable, retry_forever, with_retry};
pub use types::{Event, House, Page, PageReport, ProgressEvent, RunSummary, SavedAsset};
