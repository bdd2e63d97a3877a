//! Local disk generation store

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::backend::{GenerationStore, StoredResponse, entry_key};
use crate::error::StoreError;

/// Local disk generation store
///
/// Each generation is a directory under the root. An entry is a pair of
/// files keyed by the SHA-256 of its URL: `<key>.json` holds the metadata,
/// `<key>.body` holds the captured body.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local store rooted at the given path
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        info!("Initialized local generation store at {:?}", root);
        Ok(Self { root })
    }

    fn generation_path(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    fn meta_path(&self, generation: &str, url: &str) -> PathBuf {
        self.generation_path(generation)
            .join(format!("{}.json", entry_key(url)))
    }

    fn body_path(&self, generation: &str, url: &str) -> PathBuf {
        self.generation_path(generation)
            .join(format!("{}.body", entry_key(url)))
    }
}

#[async_trait]
impl GenerationStore for LocalStore {
    async fn open(&self, generation: &str) -> Result<(), StoreError> {
        let path = self.generation_path(generation);
        fs::create_dir_all(&path).await?;
        debug!("Opened generation {:?}", path);
        Ok(())
    }

    async fn list_generations(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        let path = self.generation_path(generation);
        debug!("Deleting generation {:?}", path);

        match fs::remove_dir_all(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn get(&self, generation: &str, url: &str) -> Result<Option<StoredResponse>, StoreError> {
        let meta_path = self.meta_path(generation, url);

        let meta = match fs::read(&meta_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut response: StoredResponse = serde_json::from_slice(&meta)
            .map_err(|e| StoreError::InvalidEntry(format!("{}: {}", url, e)))?;

        // Body file missing while metadata exists means a torn write; treat
        // the entry as absent rather than serving a truncated response.
        match fs::read(self.body_path(generation, url)).await {
            Ok(body) => {
                response.body = body.into();
                Ok(Some(response))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn put(&self, generation: &str, response: StoredResponse) -> Result<(), StoreError> {
        let meta_path = self.meta_path(generation, &response.url);
        let body_path = self.body_path(generation, &response.url);

        if let Some(parent) = meta_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!(
            "Storing {} ({} bytes) into generation {}",
            response.url,
            response.body.len(),
            generation
        );

        // Write body first, metadata last, each via temp file + rename so a
        // concurrent reader never observes a half-written entry.
        let body_tmp = body_path.with_extension("body.tmp");
        fs::write(&body_tmp, &response.body).await?;
        fs::rename(&body_tmp, &body_path).await?;

        let meta = serde_json::to_vec(&response)
            .map_err(|e| StoreError::InvalidEntry(format!("{}: {}", response.url, e)))?;
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, &meta).await?;
        fs::rename(&meta_tmp, &meta_path).await?;

        Ok(())
    }

    async fn contains(&self, generation: &str, url: &str) -> Result<bool, StoreError> {
        Ok(self.meta_path(generation, url).exists() && self.body_path(generation, url).exists())
    }

    async fn list_urls(&self, generation: &str) -> Result<Vec<String>, StoreError> {
        let path = self.generation_path(generation);
        let mut urls = Vec::new();

        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(urls),
            Err(e) => return Err(StoreError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".json") {
                continue;
            }
            let meta = fs::read(entry.path()).await?;
            let response: StoredResponse = serde_json::from_slice(&meta)
                .map_err(|e| StoreError::InvalidEntry(format!("{}: {}", name, e)))?;
            urls.push(response.url);
        }

        urls.sort();
        Ok(urls)
    }
}
