//! Vitrine Agent - offline-asset cache agent and storefront cart service

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

mod config;
mod error;
mod routes;
mod state;

use config::Config;
use routes::create_router;
use state::AppState;
use vitrine_cart::{CartSnapshots, CartState, JsonSnapshots};
use vitrine_core::{AssetManifest, CacheCoordinator};
use vitrine_fetch::HttpFetcher;
use vitrine_store::LocalStore;

/// Vitrine Agent - offline-asset cache agent with a storefront cart
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "VITRINE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "VITRINE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging.level);

    info!("Starting Vitrine Agent v{}", env!("CARGO_PKG_VERSION"));

    let base: Url = config.upstream.origin.parse()?;

    // Storage, network, and the cache coordinator.
    let store = Arc::new(LocalStore::new(&config.storage.path).await?);
    let fetcher = Arc::new(HttpFetcher::new()?);
    let manifest = AssetManifest::new(config.cache.manifest.iter().cloned());
    let coordinator = Arc::new(CacheCoordinator::new(
        store,
        fetcher,
        config.cache.generation.clone(),
        manifest,
        base,
    ));

    // Lifecycle: prime the generation, then evict every stale one. Serving
    // only starts once the agent is activated.
    coordinator.install().await?;
    coordinator.activate().await?;

    // Restore the last cart snapshot.
    let snapshots: Arc<dyn CartSnapshots> = Arc::new(JsonSnapshots::new(&config.cart.snapshot_path));
    let cart = snapshots.load().await?.unwrap_or_else(CartState::default);

    let app_state = AppState::new(
        coordinator,
        cart,
        snapshots,
        config.cart.catalog_url.clone(),
    );

    let app = create_router(app_state).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!("Upstream origin: {}", config.upstream.origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Agent stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
