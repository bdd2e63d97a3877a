//! Cart snapshot persistence

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::CartError;
use crate::state::CartState;

/// Persistence adapter for cart snapshots.
///
/// The cart is mutated in memory; every accepted command is followed by an
/// explicit `save`, and `load` restores the last snapshot on startup.
#[async_trait]
pub trait CartSnapshots: Send + Sync {
    /// Load the last saved snapshot, `None` when none exists yet
    async fn load(&self) -> Result<Option<CartState>, CartError>;

    /// Persist a snapshot, replacing any previous one
    async fn save(&self, state: &CartState) -> Result<(), CartError>;
}

/// JSON file snapshot store
pub struct JsonSnapshots {
    path: PathBuf,
}

impl JsonSnapshots {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CartSnapshots for JsonSnapshots {
    async fn load(&self) -> Result<Option<CartState>, CartError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cart snapshot at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(CartError::Io(e)),
        };

        let state: CartState = serde_json::from_slice(&data)?;
        info!(
            "Restored cart snapshot from {:?} ({} line(s))",
            self.path,
            state.items.len()
        );
        Ok(Some(state))
    }

    async fn save(&self, state: &CartState) -> Result<(), CartError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Temp file + rename so a crash mid-write never corrupts the
        // previous snapshot.
        let data = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!("Saved cart snapshot to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::state::CartItem;

    fn sample_state() -> CartState {
        CartState {
            items: vec![CartItem {
                product: Product {
                    id: "1".to_string(),
                    title: "bed".to_string(),
                    price: 10000,
                    image: "p1.jpeg".to_string(),
                },
                amount: 2,
            }],
        }
    }

    #[tokio::test]
    async fn test_load_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonSnapshots::new(dir.path().join("cart.json"));
        assert!(snapshots.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonSnapshots::new(dir.path().join("cart.json"));

        let state = sample_state();
        snapshots.save(&state).await.unwrap();

        let restored = snapshots.load().await.unwrap().unwrap();
        assert_eq!(restored, state);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonSnapshots::new(dir.path().join("cart.json"));

        snapshots.save(&sample_state()).await.unwrap();
        snapshots.save(&CartState::default()).await.unwrap();

        let restored = snapshots.load().await.unwrap().unwrap();
        assert!(restored.is_empty());
    }
}
