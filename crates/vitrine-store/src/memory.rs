//! In-memory generation store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::backend::{GenerationStore, StoredResponse};
use crate::error::StoreError;

/// In-memory generation store, used by tests and short-lived agents
#[derive(Default)]
pub struct MemoryStore {
    generations: RwLock<HashMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<(), StoreError> {
        self.generations
            .write()
            .entry(generation.to_string())
            .or_default();
        Ok(())
    }

    async fn list_generations(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.generations.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, StoreError> {
        Ok(self.generations.write().remove(generation).is_some())
    }

    async fn get(&self, generation: &str, url: &str) -> Result<Option<StoredResponse>, StoreError> {
        Ok(self
            .generations
            .read()
            .get(generation)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    async fn put(&self, generation: &str, response: StoredResponse) -> Result<(), StoreError> {
        self.generations
            .write()
            .entry(generation.to_string())
            .or_default()
            .insert(response.url.clone(), response);
        Ok(())
    }

    async fn contains(&self, generation: &str, url: &str) -> Result<bool, StoreError> {
        Ok(self
            .generations
            .read()
            .get(generation)
            .is_some_and(|entries| entries.contains_key(url)))
    }

    async fn list_urls(&self, generation: &str) -> Result<Vec<String>, StoreError> {
        let mut urls: Vec<String> = self
            .generations
            .read()
            .get(generation)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        urls.sort();
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let store = MemoryStore::new();
        store
            .put("v1", StoredResponse::new("/a.css", 200, "text/css", Bytes::from_static(b"a")))
            .await
            .unwrap();

        assert!(store.contains("v1", "/a.css").await.unwrap());
        assert!(!store.contains("v2", "/a.css").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let store = MemoryStore::new();
        store.open("v1").await.unwrap();
        store
            .put("v1", StoredResponse::new("/a.css", 200, "text/css", Bytes::from_static(b"a")))
            .await
            .unwrap();
        store.open("v1").await.unwrap();

        assert!(store.contains("v1", "/a.css").await.unwrap());
    }
}
