//! Download worker: probe, name, download and signal for one record.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::assets::AssetSource;
use crate::error::Result;
use crate::retry::with_retry;
use crate::types::{Completion, House, SavedAsset};
use crate::utils;

use super::Harvester;

impl Harvester {
    /// Download one record's asset and send exactly one completion signal
    ///
    /// The probe and the download are retried together: a failed download
    /// re-runs the probe on the next attempt.
    pub(crate) async fn download_record(
        &self,
        page: u32,
        house: House,
        done: mpsc::Sender<Completion>,
    ) {
        let house = Arc::new(house);
        let record_id = house.id;

        let outcome = with_retry(&self.config.retry, || {
            let assets = Arc::clone(&self.assets);
            let house = Arc::clone(&house);
            let config = Arc::clone(&self.config);
            async move { fetch_asset(assets.as_ref(), &house, config.save_dir()).await }
        })
        .await;

        if done.send(outcome.map_err(|e| (record_id, e))).await.is_err() {
            tracing::warn!(page, record_id, "Page worker stopped listening for completions");
        }
    }
}

/// One attempt: probe the extension, derive the path, download into it
async fn fetch_asset(assets: &dyn AssetSource, house: &House, save_dir: &Path) -> Result<SavedAsset> {
    let extension = assets.probe_extension(&house.photo_url).await?;
    let path = utils::asset_path(save_dir, house, &extension);
    let bytes = assets.download_asset(&house.photo_url, &path).await?;
    Ok(SavedAsset {
        record_id: house.id,
        path,
        bytes,
    })
}
