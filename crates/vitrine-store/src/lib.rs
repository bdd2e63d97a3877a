//! Vitrine Cache Storage Layer
//!
//! This crate provides the cache storage primitive for Vitrine: named
//! generations, each mapping normalized request URLs to captured responses.

pub mod backend;
pub mod error;
pub mod local;
pub mod memory;

pub use backend::{GenerationStore, StoredResponse, entry_key};
pub use error::StoreError;
pub use local::LocalStore;
pub use memory::MemoryStore;
