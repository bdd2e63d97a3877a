//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Invalid entry metadata: {0}")]
    InvalidEntry(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}
