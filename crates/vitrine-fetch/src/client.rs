//! HTTP asset fetcher

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::response::AssetResponse;

/// Network fetch collaborator
///
/// The coordinator talks to the network exclusively through this trait so
/// that tests can substitute a recording stub.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Issue a GET for the given absolute URL
    async fn fetch(&self, url: &Url) -> Result<AssetResponse, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<AssetResponse, FetchError> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();

        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        // Non-2xx statuses are still responses; the policy layer decides
        // what to do with them. Only transport failures are errors here.
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(FetchError::Http));

        Ok(AssetResponse::from_stream(status, content_type, Box::pin(body)))
    }
}
