//! Generation store trait

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A captured response, stored under a normalized request URL.
///
/// The body is an immutable snapshot taken at fetch time; the store never
/// revalidates an entry against the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredResponse {
    /// Normalized request URL this entry is keyed by
    pub url: String,
    /// HTTP status code captured at fetch time
    pub status: u16,
    /// Content type of the captured body
    pub content_type: String,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
    /// Captured response body
    #[serde(skip)]
    pub body: Bytes,
}

impl StoredResponse {
    pub fn new(url: impl Into<String>, status: u16, content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            url: url.into(),
            status,
            content_type: content_type.into(),
            stored_at: Utc::now(),
            body,
        }
    }
}

/// Cache storage primitive
///
/// Implementations provide named generations, each an independent mapping
/// from normalized request URL to a captured response. Writes within a
/// generation are idempotent by key: re-storing the same URL overwrites
/// (last write wins). At steady state the coordinator retains exactly one
/// generation; everything else here is mechanism, not policy.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Open a generation, creating it if absent. Idempotent.
    async fn open(&self, generation: &str) -> Result<(), StoreError>;

    /// Enumerate all existing generation names.
    async fn list_generations(&self) -> Result<Vec<String>, StoreError>;

    /// Delete an entire generation. Returns false if it did not exist.
    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError>;

    /// Look up an entry by normalized URL.
    async fn get(&self, generation: &str, url: &str) -> Result<Option<StoredResponse>, StoreError>;

    /// Insert or overwrite an entry.
    async fn put(&self, generation: &str, response: StoredResponse) -> Result<(), StoreError>;

    /// Check whether an entry exists without reading its body.
    async fn contains(&self, generation: &str, url: &str) -> Result<bool, StoreError>;

    /// List the URLs of all entries in a generation.
    async fn list_urls(&self, generation: &str) -> Result<Vec<String>, StoreError>;
}

/// Compute the on-disk key for a URL
pub fn entry_key(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
