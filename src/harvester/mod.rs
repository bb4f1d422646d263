//! Fetch-and-download orchestration split into focused submodules.
//!
//! The `Harvester` struct and its methods are organized by tier:
//! - [`run`] - Orchestrator: one page worker per page, waits for all of them
//! - [`page_worker`] - Fetch one page, fan out download workers, drain their signals
//! - [`download_worker`] - Probe, name, download and signal for one record

mod download_worker;
mod page_worker;
mod run;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::assets::{AssetSource, HttpAssetFetcher};
use crate::catalog::{CatalogSource, HttpCatalogClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::Event;

/// Capacity of the lifecycle event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main harvester instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Harvester {
    /// Configuration, shared read-only with every worker
    pub(crate) config: Arc<Config>,
    /// Source of catalog pages (trait object so tests can substitute it)
    pub(crate) catalog: Arc<dyn CatalogSource>,
    /// Source of asset probes and downloads
    pub(crate) assets: Arc<dyn AssetSource>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl Harvester {
    /// Create a harvester that talks HTTP to the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate, or
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.download.user_agent.clone());
        if let Some(timeout) = config.download.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let endpoint = url::Url::parse(&config.catalog.endpoint).map_err(|e| {
            Error::config(format!("invalid endpoint: {e}"), "catalog.endpoint")
        })?;

        let catalog = Arc::new(HttpCatalogClient::new(client.clone(), endpoint));
        let assets = Arc::new(
            HttpAssetFetcher::new(client, config.download.strict_status)
                .with_probe_status_check(config.download.strict_probe_status),
        );

        Ok(Self::with_sources(config, catalog, assets))
    }

    /// Create a harvester over custom catalog and asset sources
    pub fn with_sources(
        config: Config,
        catalog: Arc<dyn CatalogSource>,
        assets: Arc<dyn AssetSource>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            catalog,
            assets,
            event_tx,
        }
    }

    /// Configuration this harvester runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to lifecycle events
    ///
    /// Slow subscribers may observe `RecvError::Lagged`; progress counting does
    /// not depend on this channel.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event; having no subscribers is fine
    pub(crate) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
