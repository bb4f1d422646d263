//! Page worker: Fetching -> Dispatching -> Collecting -> Done for one page.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::retry::with_retry;
use crate::types::{Completion, Event, PageReport, ProgressEvent};

use super::Harvester;

impl Harvester {
    /// Process one page of the catalog
    ///
    /// The listing fetch runs under the retry policy. Each record gets its own
    /// download worker in a `JoinSet`; the page then drains exactly one
    /// completion signal per record from a channel sized to the record count,
    /// emitting one [`ProgressEvent`] per downloaded asset, and finally joins
    /// every worker so nothing outlives the page.
    pub(crate) async fn process_page(
        &self,
        page: u32,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> PageReport {
        // Fetching
        let catalog = Arc::clone(&self.catalog);
        let fetched = with_retry(&self.config.retry, || {
            let catalog = Arc::clone(&catalog);
            async move { catalog.fetch_page(page).await }
        })
        .await;

        let listing = match fetched {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!(page, error = %e, "Giving up on catalog page");
                self.emit(Event::PageFetchFailed {
                    page,
                    error: e.to_string(),
                });
                self.emit(Event::PageComplete {
                    page,
                    downloaded: 0,
                    failed: 0,
                });
                return PageReport {
                    page,
                    fetch_error: Some(e.to_string()),
                    ..PageReport::default()
                };
            }
        };

        if !listing.ok {
            tracing::debug!(page, "Catalog page reported ok=false, processing records anyway");
        }
        let total = listing.houses.len();
        self.emit(Event::PageFetched {
            page,
            records: total,
        });

        // Dispatching
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(total.max(1));
        let mut workers = JoinSet::new();
        for house in listing.houses {
            let harvester = self.clone();
            let done = done_tx.clone();
            workers.spawn(async move { harvester.download_record(page, house, done).await });
        }
        // Only workers hold senders now, so a dead worker shows up as a closed channel
        drop(done_tx);

        // Collecting
        let mut downloaded = 0usize;
        let mut failed = 0usize;
        for _ in 0..total {
            match done_rx.recv().await {
                Some(Ok(asset)) => {
                    downloaded += 1;
                    progress
                        .send(ProgressEvent {
                            page,
                            total,
                            current: downloaded,
                        })
                        .ok();
                    self.emit(Event::AssetSaved {
                        page,
                        record_id: asset.record_id,
                        path: asset.path,
                        bytes: asset.bytes,
                    });
                }
                Some(Err((record_id, e))) => {
                    failed += 1;
                    tracing::error!(page, record_id, error = %e, "Giving up on asset");
                    self.emit(Event::AssetFailed {
                        page,
                        record_id,
                        error: e.to_string(),
                    });
                }
                None => break,
            }
        }

        // Done
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(page, error = %e, "Download worker task failed");
            }
        }
        // Workers that died without signalling count as failures
        failed += total - downloaded - failed;

        tracing::debug!(page, total, downloaded, failed, "Page complete");
        self.emit(Event::PageComplete {
            page,
            downloaded,
            failed,
        });

        PageReport {
            page,
            records: total,
            downloaded,
            failed,
            fetch_error: None,
        }
    }
}
