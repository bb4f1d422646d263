//! Progress aggregation across all page workers
//!
//! Every page worker sends [`ProgressEvent`]s into one channel. A single
//! aggregator task owns the running total and the [`ProgressReporter`], so the
//! rendering surface is only ever touched from one place.

use crate::types::ProgressEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sink for aggregated progress
pub trait ProgressReporter: Send {
    /// The best current estimate of how many assets the run will download
    fn set_expected(&mut self, expected: u64);

    /// One more asset was downloaded; `downloaded` is the run-wide total so far
    fn advance(&mut self, event: &ProgressEvent, downloaded: u64);

    /// The run is over
    fn finish(&mut self, downloaded: u64);
}

/// Reporter that discards everything
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn set_expected(&mut self, _expected: u64) {}
    fn advance(&mut self, _event: &ProgressEvent, _downloaded: u64) {}
    fn finish(&mut self, _downloaded: u64) {}
}

/// Terminal progress bar
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    /// Create a bar titled "Downloading images..." sized for `expected` assets
    pub fn new(expected: u64) -> Self {
        let bar = ProgressBar::new(expected);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed_precise})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar.set_message("Downloading images...");
        Self { bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn set_expected(&mut self, expected: u64) {
        self.bar.set_length(expected);
    }

    fn advance(&mut self, _event: &ProgressEvent, downloaded: u64) {
        self.bar.set_position(downloaded);
    }

    fn finish(&mut self, downloaded: u64) {
        self.bar.finish_and_clear();
        println!("✓ Downloaded {downloaded} images");
    }
}

/// Handle to a running aggregator task
pub struct ProgressAggregator {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    handle: JoinHandle<u64>,
}

impl ProgressAggregator {
    /// Start the aggregator
    ///
    /// The expected total starts at `page_count * records_per_page` and is
    /// corrected per page as soon as that page's real record count is known.
    pub fn spawn(
        mut reporter: Box<dyn ProgressReporter>,
        page_count: u32,
        records_per_page: u32,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

        let handle = tokio::spawn(async move {
            let estimate = u64::from(records_per_page);
            let mut expected = u64::from(page_count) * estimate;
            let mut page_totals: HashMap<u32, u64> = HashMap::new();
            let mut downloaded: u64 = 0;

            reporter.set_expected(expected);

            while let Some(event) = rx.recv().await {
                if !page_totals.contains_key(&event.page) {
                    let actual = event.total as u64;
                    page_totals.insert(event.page, actual);
                    expected = expected.saturating_sub(estimate) + actual;
                    reporter.set_expected(expected);
                }

                downloaded += 1;
                reporter.advance(&event, downloaded);
            }

            reporter.finish(downloaded);
            downloaded
        });

        Self { tx, handle }
    }

    /// Sender for page workers
    pub fn sender(&self) -> mpsc::UnboundedSender<ProgressEvent> {
        self.tx.clone()
    }

    /// Close the channel and wait for the final total
    ///
    /// Every sender handed out by [`sender`](Self::sender) must be dropped first.
    pub async fn finish(self) -> crate::Result<u64> {
        drop(self.tx);
        self.handle
            .await
            .map_err(|e| crate::Error::TaskFailed(format!("progress aggregator: {e}")))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// What a [`RecordingReporter`] saw
    #[derive(Debug, Default)]
    pub(crate) struct Recorded {
        pub(crate) expected: Vec<u64>,
        pub(crate) events: Vec<(ProgressEvent, u64)>,
        pub(crate) finished: Option<u64>,
    }

    /// Reporter that stores every call for later assertions
    #[derive(Clone, Default)]
    pub(crate) struct RecordingReporter(pub(crate) Arc<Mutex<Recorded>>);

    impl ProgressReporter for RecordingReporter {
        fn set_expected(&mut self, expected: u64) {
            self.0.lock().unwrap().expected.push(expected);
        }

        fn advance(&mut self, event: &ProgressEvent, downloaded: u64) {
            self.0.lock().unwrap().events.push((*event, downloaded));
        }

        fn finish(&mut self, downloaded: u64) {
            self.0.lock().unwrap().finished = Some(downloaded);
        }
    }

    fn event(page: u32, total: usize, current: usize) -> ProgressEvent {
        ProgressEvent {
            page,
            total,
            current,
        }
    }

    #[tokio::test]
    async fn counts_every_event_across_senders() {
        let reporter = RecordingReporter::default();
        let aggregator = ProgressAggregator::spawn(Box::new(reporter.clone()), 2, 3);

        let mut workers = Vec::new();
        for page in 1..=2u32 {
            let tx = aggregator.sender();
            workers.push(tokio::spawn(async move {
                for current in 1..=3 {
                    tx.send(event(page, 3, current)).unwrap();
                }
            }));
        }
        for worker in workers {
            worker.await.unwrap();
        }

        let total = aggregator.finish().await.unwrap();

        assert_eq!(total, 6);
        let recorded = reporter.0.lock().unwrap();
        assert_eq!(recorded.finished, Some(6));
        let running: Vec<u64> = recorded.events.iter().map(|(_, n)| *n).collect();
        assert_eq!(running, vec![1, 2, 3, 4, 5, 6], "total must be monotonic");
    }

    #[tokio::test]
    async fn expected_total_is_refined_by_real_page_sizes() {
        let reporter = RecordingReporter::default();
        let aggregator = ProgressAggregator::spawn(Box::new(reporter.clone()), 3, 10);
        let tx = aggregator.sender();

        tx.send(event(1, 4, 1)).unwrap();
        tx.send(event(1, 4, 2)).unwrap();
        tx.send(event(3, 12, 1)).unwrap();
        drop(tx);

        aggregator.finish().await.unwrap();

        let recorded = reporter.0.lock().unwrap();
        // 30 estimated, page 1 has 4 (-> 24), page 3 has 12 (-> 26)
        assert_eq!(recorded.expected, vec![30, 24, 26]);
    }

    #[tokio::test]
    async fn zero_pages_finishes_with_zero() {
        let reporter = RecordingReporter::default();
        let aggregator = ProgressAggregator::spawn(Box::new(reporter.clone()), 0, 10);

        let total = aggregator.finish().await.unwrap();

        assert_eq!(total, 0);
        let recorded = reporter.0.lock().unwrap();
        assert_eq!(recorded.expected, vec![0]);
        assert_eq!(recorded.finished, Some(0));
    }
}
