//! Core error types

use thiserror::Error;

use crate::lifecycle::AgentPhase;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(#[from] vitrine_store::StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] vitrine_fetch::FetchError),

    #[error("Invalid manifest entry: {0}")]
    Manifest(String),

    #[error("Bulk prime failed: {0}")]
    Prime(String),

    #[error("Invalid lifecycle transition: {from} -> {to}")]
    Lifecycle { from: AgentPhase, to: AgentPhase },
}
