//! Mock catalog server helpers built on wiremock

use catalog_dl::Config;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock listing endpoint is mounted on
pub const LISTING_PATH: &str = "/api_project/houses";

/// One record to serve from the mock catalog
pub struct MockHouse {
    pub id: i64,
    pub homeowner: &'static str,
    pub address: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl MockHouse {
    /// Photo path on the mock server
    pub fn photo_path(&self) -> String {
        format!("/photos/{}", self.id)
    }
}

/// Mount a listing page plus a HEAD and GET route for each of its photos
pub async fn mount_page(server: &MockServer, page: u32, houses: &[MockHouse]) {
    let listing: Vec<_> = houses
        .iter()
        .map(|h| {
            json!({
                "id": h.id,
                "address": h.address,
                "homeowner": h.homeowner,
                "price": 100_000 + h.id,
                "photoURL": format!("{}{}", server.uri(), h.photo_path()),
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "houses": listing,
            "ok": true,
        })))
        .mount(server)
        .await;

    for house in houses {
        Mock::given(method("HEAD"))
            .and(path(house.photo_path()))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", house.content_type))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(house.photo_path()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", house.content_type)
                    .set_body_bytes(house.body.clone()),
            )
            .mount(server)
            .await;
    }
}

/// Config pointing at the mock server and saving into `dir`
pub fn mock_config(server: &MockServer, dir: &Path, page_count: u32) -> Config {
    let mut config = Config::default();
    config.catalog.endpoint = format!("{}{}", server.uri(), LISTING_PATH);
    config.catalog.page_count = page_count;
    config.download.save_dir = dir.join("out");
    config
}

/// Sorted file names in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
