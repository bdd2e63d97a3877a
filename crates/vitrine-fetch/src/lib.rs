//! Vitrine Network Fetch Layer
//!
//! This crate provides the network collaborator for the cache coordinator:
//! a fetcher trait over single-read response bodies, with an explicit tee
//! operation for dual consumption (cache + caller).

pub mod client;
pub mod error;
pub mod response;

pub use client::{AssetFetcher, HttpFetcher};
pub use error::FetchError;
pub use response::{AssetResponse, BodyStream};
