//! In-memory catalog and asset sources for exercising the workers without HTTP.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::assets::AssetSource;
use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::error::{DownloadError, FetchError, ProbeError};
use crate::harvester::Harvester;
use crate::types::{House, Page};

/// Build a record whose photo lives at `http://img.test/<id>`
pub(crate) fn house(id: i64) -> House {
    House {
        id,
        address: format!("{id} Test Ave"),
        homeowner: format!("Owner {id}"),
        price: 100_000 + id,
        photo_url: format!("http://img.test/{id}"),
    }
}

/// Pages of `per_page` records each, ids numbered consecutively from 1
pub(crate) fn pages(page_count: u32, per_page: usize) -> HashMap<u32, Vec<House>> {
    let mut next_id = 1i64;
    (1..=page_count)
        .map(|page| {
            let houses = (0..per_page)
                .map(|_| {
                    let h = house(next_id);
                    next_id += 1;
                    h
                })
                .collect();
            (page, houses)
        })
        .collect()
}

/// Catalog that serves fixed pages and can fail a page a set number of times
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub(crate) pages: HashMap<u32, Vec<House>>,
    /// Remaining failures per page (`u32::MAX` = always fail)
    pub(crate) failures: Mutex<HashMap<u32, u32>>,
    /// Calls per page
    pub(crate) calls: Mutex<HashMap<u32, u32>>,
}

impl FakeCatalog {
    pub(crate) fn new(pages: HashMap<u32, Vec<House>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub(crate) fn fail_page(self, page: u32, times: u32) -> Self {
        self.failures.lock().unwrap().insert(page, times);
        self
    }

    pub(crate) fn calls_for(&self, page: u32) -> u32 {
        self.calls.lock().unwrap().get(&page).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_page(&self, page: u32) -> Result<Page, FetchError> {
        *self.calls.lock().unwrap().entry(page).or_insert(0) += 1;

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&page) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(FetchError::BadStatus { page, status: 500 });
                }
            }
        }

        Ok(Page {
            houses: self.pages.get(&page).cloned().unwrap_or_default(),
            ok: true,
        })
    }
}

/// Asset source that writes `asset:<url>` into the destination
///
/// Probe and download failures can be injected per URL. Downloads sleep a
/// little, longer for lower ids, so completion order differs from record order.
#[derive(Default)]
pub(crate) struct FakeAssets {
    /// Content type subtype per URL (default "png")
    pub(crate) subtypes: HashMap<String, String>,
    pub(crate) probe_failures: Mutex<HashMap<String, u32>>,
    pub(crate) download_failures: Mutex<HashMap<String, u32>>,
    pub(crate) probe_calls: Mutex<HashMap<String, u32>>,
    pub(crate) download_calls: AtomicU32,
}

impl FakeAssets {
    pub(crate) fn with_subtype(mut self, url: &str, subtype: &str) -> Self {
        self.subtypes.insert(url.to_string(), subtype.to_string());
        self
    }

    pub(crate) fn fail_probe(self, url: &str, times: u32) -> Self {
        self.probe_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub(crate) fn fail_download(self, url: &str, times: u32) -> Self {
        self.download_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub(crate) fn probe_calls_for(&self, url: &str) -> u32 {
        self.probe_calls
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    fn take_failure(map: &Mutex<HashMap<String, u32>>, url: &str) -> bool {
        let mut map = map.lock().unwrap();
        match map.get_mut(url) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                true
            }
            _ => false,
        }
    }
}

#[async_trait::async_trait]
impl AssetSource for FakeAssets {
    async fn probe_extension(&self, url: &str) -> Result<String, ProbeError> {
        *self
            .probe_calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if Self::take_failure(&self.probe_failures, url) {
            return Err(ProbeError::MissingHeader {
                url: url.to_string(),
            });
        }

        let subtype = self
            .subtypes
            .get(url)
            .cloned()
            .unwrap_or_else(|| "png".to_string());
        Ok(match subtype.as_str() {
            "jpeg" => "jpg".to_string(),
            _ => subtype,
        })
    }

    async fn download_asset(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let id: u64 = url.rsplit('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(id))).await;

        // The file exists before the failure, like a broken stream would leave it
        let body = format!("asset:{url}");
        tokio::fs::write(destination, body.as_bytes())
            .await
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        if Self::take_failure(&self.download_failures, url) {
            return Err(DownloadError::BadStatus {
                url: url.to_string(),
                status: 503,
            });
        }

        Ok(body.len() as u64)
    }
}

/// Config pointing the save directory into `dir`
pub(crate) fn test_config(dir: &Path, page_count: u32, per_page: u32) -> Config {
    let mut config = Config::default();
    config.catalog.page_count = page_count;
    config.catalog.records_per_page = per_page;
    config.download.save_dir = dir.join("out");
    config
}

/// Harvester over the given fakes, plus handles to inspect them afterwards
pub(crate) fn create_test_harvester(
    config: Config,
    catalog: FakeCatalog,
    assets: FakeAssets,
) -> (Harvester, Arc<FakeCatalog>, Arc<FakeAssets>) {
    let catalog = Arc::new(catalog);
    let assets = Arc::new(assets);
    let harvester = Harvester::with_sources(config, catalog.clone(), assets.clone());
    (harvester, catalog, assets)
}
