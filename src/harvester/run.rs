//! Orchestrator: one page worker per page, then totals.

use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::progress::{ProgressAggregator, ProgressReporter, SilentReporter};
use crate::types::{Event, RunSummary};
use crate::utils;

use super::Harvester;

impl Harvester {
    /// Run the whole catalog without a progress display
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_with_progress(Box::new(SilentReporter)).await
    }

    /// Run the whole catalog, feeding progress to `reporter`
    ///
    /// Steps:
    /// 1. Create the save directory if it is missing
    /// 2. Start the progress aggregator
    /// 3. Spawn one page worker per page `1..=page_count`
    /// 4. Wait for every page worker, then for the aggregator
    ///
    /// With the default retry policy this returns only once every record of
    /// every page is on disk, which may be never if a resource fails permanently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the save directory cannot be created and
    /// [`Error::TaskFailed`] if a worker task panicked.
    pub async fn run_with_progress(
        &self,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<RunSummary> {
        let page_count = self.config.catalog.page_count;
        utils::ensure_dir(self.config.save_dir()).await?;

        tracing::info!(
            page_count,
            save_dir = %self.config.save_dir().display(),
            unbounded_retry = self.config.retry.is_unbounded(),
            "Starting catalog download"
        );

        let aggregator =
            ProgressAggregator::spawn(reporter, page_count, self.config.catalog.records_per_page);

        let mut pages = JoinSet::new();
        for page in 1..=page_count {
            let harvester = self.clone();
            let progress = aggregator.sender();
            pages.spawn(async move { harvester.process_page(page, progress).await });
        }

        let mut summary = RunSummary::default();
        let mut task_failure = None;
        while let Some(joined) = pages.join_next().await {
            match joined {
                Ok(report) => summary.record(&report),
                Err(e) => {
                    tracing::error!(error = %e, "Page worker task failed");
                    task_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        let counted = aggregator.finish().await?;
        if let Some(message) = task_failure {
            return Err(Error::TaskFailed(message));
        }
        if counted != summary.downloaded {
            tracing::warn!(
                counted,
                reported = summary.downloaded,
                "Progress total disagrees with page reports"
            );
        }

        self.emit(Event::RunComplete {
            downloaded: summary.downloaded,
        });
        tracing::info!(
            pages = summary.pages,
            downloaded = summary.downloaded,
            failed_assets = summary.failed_assets,
            failed_pages = summary.failed_pages,
            "Catalog download finished"
        );

        Ok(summary)
    }
}
