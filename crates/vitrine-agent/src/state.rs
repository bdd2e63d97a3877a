//! Application state

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use vitrine_cart::{Catalog, CartSnapshots, CartState};
use vitrine_core::{CacheCoordinator, CoreError};

use crate::error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<CacheCoordinator>,
    pub cart: Arc<RwLock<CartState>>,
    pub snapshots: Arc<dyn CartSnapshots>,
    catalog: Arc<RwLock<Option<Catalog>>>,
    catalog_url: String,
}

impl AppState {
    pub fn new(
        coordinator: Arc<CacheCoordinator>,
        cart: CartState,
        snapshots: Arc<dyn CartSnapshots>,
        catalog_url: String,
    ) -> Self {
        Self {
            coordinator,
            cart: Arc::new(RwLock::new(cart)),
            snapshots,
            catalog: Arc::new(RwLock::new(None)),
            catalog_url,
        }
    }

    /// The product catalog, loaded once through the cache policy and kept
    /// for the lifetime of the process
    pub async fn catalog(&self) -> Result<Catalog, ApiError> {
        if let Some(catalog) = self.catalog.read().await.clone() {
            return Ok(catalog);
        }

        let response = self.coordinator.handle_fetch(&self.catalog_url).await?;
        let (_, _, body) = response.buffer().await.map_err(CoreError::Fetch)?;
        let catalog = Catalog::from_json(&body)?;
        info!("Loaded catalog ({} products)", catalog.len());

        *self.catalog.write().await = Some(catalog.clone());
        Ok(catalog)
    }
}
