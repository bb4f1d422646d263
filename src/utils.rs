//! Utility functions for file naming and directory setup

use crate::error::{Error, Result};
use crate::types::House;
use std::path::{Path, PathBuf};

/// Build the on-disk file name for a record's asset
///
/// The name is `{id}-{homeowner}-{address}.{extension}`. Fields are used verbatim
/// except that path separators and NUL are replaced with `_`, so the result is
/// always a single path component.
///
/// # Examples
///
/// ```
/// use catalog_dl::types::House;
/// use catalog_dl::utils::asset_file_name;
///
/// let house = House {
///     id: 42,
///     address: "1 Main St".to_string(),
///     homeowner: "Jane Doe".to_string(),
///     price: 100_000,
///     photo_url: "http://img.example/42".to_string(),
/// };
/// assert_eq!(asset_file_name(&house, "jpg"), "42-Jane Doe-1 Main St.jpg");
/// ```
pub fn asset_file_name(house: &House, extension: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        house.id,
        sanitize_component(&house.homeowner),
        sanitize_component(&house.address),
        sanitize_component(extension)
    )
}

/// Destination path for a record's asset inside `save_dir`
pub fn asset_path(save_dir: &Path, house: &House, extension: &str) -> PathBuf {
    save_dir.join(asset_file_name(house, extension))
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}

/// Create `dir` (and any missing parents) if it does not exist yet
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| Error::Config {
        message: format!("cannot create save directory {}: {}", dir.display(), e),
        key: Some("download.save_dir".to_string()),
    })
}
