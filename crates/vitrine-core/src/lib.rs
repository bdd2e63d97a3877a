//! Vitrine Core
//!
//! This crate provides the offline-asset cache coordinator: the asset
//! manifest, the agent lifecycle state machine, and the
//! cache-first-populate-on-miss interception policy over a single named
//! cache generation.

pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod manifest;

pub use coordinator::{CacheCoordinator, CacheStats};
pub use error::CoreError;
pub use lifecycle::AgentPhase;
pub use manifest::AssetManifest;
