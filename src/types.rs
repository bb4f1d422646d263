//! Core types for catalog-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;

/// One catalog record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    /// Identifier, unique within the catalog
    pub id: i64,
    /// Display address
    pub address: String,
    /// Owner name
    pub homeowner: String,
    /// Asking price
    pub price: i64,
    /// Absolute URL of the record's photo
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

/// One page of the catalog listing, as returned by the endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Records on this page, in listing order
    #[serde(default)]
    pub houses: Vec<House>,
    /// Success flag reported by the endpoint
    #[serde(default)]
    pub ok: bool,
}

/// An asset that has been fully written to disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedAsset {
    /// Record the asset belongs to
    pub record_id: i64,
    /// Destination path
    pub path: PathBuf,
    /// Number of bytes written
    pub bytes: u64,
}

/// Completion signal sent by a download worker to its page worker
///
/// Exactly one is sent per record. `Err` only occurs under a bounded retry policy.
pub type Completion = std::result::Result<SavedAsset, (i64, Error)>;

/// Progress update for the aggregator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Page the update belongs to
    pub page: u32,
    /// Records on that page
    pub total: usize,
    /// Records of that page downloaded so far (1-based, in completion order)
    pub current: usize,
}

/// What happened to one page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageReport {
    /// Page number
    pub page: u32,
    /// Records listed on the page (0 if the fetch failed)
    pub records: usize,
    /// Assets written to disk
    pub downloaded: usize,
    /// Assets abandoned by a bounded retry policy
    pub failed: usize,
    /// Final fetch error when a bounded retry policy gave up on the listing
    pub fetch_error: Option<String>,
}

/// Totals for a finished run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Pages processed
    pub pages: u32,
    /// Assets written to disk across all pages
    pub downloaded: u64,
    /// Assets abandoned by a bounded retry policy
    pub failed_assets: u64,
    /// Pages whose listing could not be fetched under a bounded retry policy
    pub failed_pages: u32,
}

impl RunSummary {
    /// True when every page was fetched and every asset was written
    pub fn is_complete(&self) -> bool {
        self.failed_assets == 0 && self.failed_pages == 0
    }

    pub(crate) fn record(&mut self, report: &PageReport) {
        self.pages += 1;
        self.downloaded += report.downloaded as u64;
        self.failed_assets += report.failed as u64;
        if report.fetch_error.is_some() {
            self.failed_pages += 1;
        }
    }
}

/// Event emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A page listing was fetched
    PageFetched {
        /// Page number
        page: u32,
        /// Records on the page
        records: usize,
    },

    /// A page listing was abandoned by a bounded retry policy
    PageFetchFailed {
        /// Page number
        page: u32,
        /// Error message
        error: String,
    },

    /// An asset was written to disk
    AssetSaved {
        /// Page number
        page: u32,
        /// Record identifier
        record_id: i64,
        /// Destination path
        path: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// An asset was abandoned by a bounded retry policy
    AssetFailed {
        /// Page number
        page: u32,
        /// Record identifier
        record_id: i64,
        /// Error message
        error: String,
    },

    /// Every record of a page has been accounted for
    PageComplete {
        /// Page number
        page: u32,
        /// Assets written
        downloaded: usize,
        /// Assets abandoned
        failed: usize,
    },

    /// The whole run finished
    RunComplete {
        /// Assets written across all pages
        downloaded: u64,
    },
}
