//! Catalog listing client
//!
//! One call to [`CatalogSource::fetch_page`] is one HTTP GET against the listing
//! endpoint. Retries are the caller's business.

use crate::error::FetchError;
use crate::types::Page;
use url::Url;

/// Abstraction over the paginated listing, enabling testability.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch and decode one page of the listing
    async fn fetch_page(&self, page: u32) -> Result<Page, FetchError>;
}

/// Production [`CatalogSource`] that talks HTTP to the listing endpoint.
#[derive(Clone, Debug)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCatalogClient {
    /// Create a client for `endpoint` sharing the given HTTP client
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// URL for one page; `page` is the only query parameter
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string());
        url
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn fetch_page(&self, page: u32) -> Result<Page, FetchError> {
        let url = self.page_url(page);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::BadStatus {
                page,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let listing: Page =
            serde_json::from_slice(&body).map_err(|source| FetchError::Malformed { page, source })?;

        if !listing.ok {
            tracing::debug!(page, "listing reported ok=false");
        }
        tracing::debug!(page, records = listing.houses.len(), "fetched catalog page");

        Ok(listing)
    }
}
