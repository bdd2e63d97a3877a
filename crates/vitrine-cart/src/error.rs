//! Cart error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Invalid catalog document: {0}")]
    Catalog(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
