//! Cache coordinator implementation

use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use vitrine_fetch::{AssetFetcher, AssetResponse};
use vitrine_store::{GenerationStore, StoredResponse};

use crate::error::CoreError;
use crate::lifecycle::AgentPhase;
use crate::manifest::{AssetManifest, resolve_entry};

/// Hit/miss counters for the interception policy
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub primed_count: u64,
}

/// Coordinator for a single named cache generation.
///
/// Owns the generation lifecycle: bulk priming on install, stale-generation
/// eviction on activate, and cache-first-populate-on-miss interception for
/// every request routed through it. All durable state lives in the store;
/// the coordinator itself only carries the phase and counters.
pub struct CacheCoordinator {
    store: Arc<dyn GenerationStore>,
    fetcher: Arc<dyn AssetFetcher>,
    generation: String,
    manifest: AssetManifest,
    base: Url,
    phase: RwLock<AgentPhase>,
    stats: RwLock<CacheStats>,
}

impl CacheCoordinator {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        fetcher: Arc<dyn AssetFetcher>,
        generation: impl Into<String>,
        manifest: AssetManifest,
        base: Url,
    ) -> Self {
        let generation = generation.into();
        info!(
            "Initializing cache coordinator (generation: {}, manifest: {} assets)",
            generation,
            manifest.len()
        );

        Self {
            store,
            fetcher,
            generation,
            manifest,
            base,
            phase: RwLock::new(AgentPhase::Installing),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Name of the generation this coordinator serves
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> AgentPhase {
        *self.phase.read().await
    }

    /// Current hit/miss counters
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Install handler: open the generation and bulk-prime it from the
    /// manifest.
    ///
    /// Priming is all-or-nothing; a failure is caught and logged rather
    /// than propagated, so a missing asset degrades the cache without
    /// crashing the agent. The phase still moves to `Installed`.
    pub async fn install(&self) -> Result<(), CoreError> {
        let phase = self.phase().await;
        if !phase.can_install() {
            return Err(CoreError::Lifecycle {
                from: phase,
                to: AgentPhase::Installed,
            });
        }

        match self.prime().await {
            Ok(count) => info!(
                "Primed {} assets into generation {}",
                count, self.generation
            ),
            Err(e) => warn!("Bulk prime failed for generation {}: {}", self.generation, e),
        }

        *self.phase.write().await = AgentPhase::Installed;
        Ok(())
    }

    /// Fetch every manifest asset and, only once all of them succeeded,
    /// write them into the generation.
    async fn prime(&self) -> Result<usize, CoreError> {
        self.store.open(&self.generation).await?;

        let urls = self.manifest.resolve(&self.base)?;

        // Fetch everything up front so a single failure leaves the
        // generation untouched (addAll semantics).
        let fetched = try_join_all(urls.iter().map(|url| async move {
            let response = self
                .fetcher
                .fetch(url)
                .await
                .map_err(|e| CoreError::Prime(format!("{}: {}", url, e)))?;
            let (status, content_type, body) = response
                .buffer()
                .await
                .map_err(|e| CoreError::Prime(format!("{}: {}", url, e)))?;
            if status >= 400 {
                return Err(CoreError::Prime(format!("{}: status {}", url, status)));
            }
            Ok(StoredResponse::new(url.as_str(), status, content_type, body))
        }))
        .await?;

        let count = fetched.len();
        for entry in fetched {
            self.store.put(&self.generation, entry).await?;
        }

        let mut stats = self.stats.write().await;
        stats.primed_count += count as u64;
        Ok(count)
    }

    /// Activate handler: delete every generation whose name differs from
    /// this coordinator's, in parallel, then mark the agent activated.
    ///
    /// The first deletion failure aborts the aggregate wait and surfaces
    /// to the caller, matching the all-settle primitive underneath.
    pub async fn activate(&self) -> Result<(), CoreError> {
        let phase = self.phase().await;
        if !phase.can_activate() {
            return Err(CoreError::Lifecycle {
                from: phase,
                to: AgentPhase::Activated,
            });
        }
        *self.phase.write().await = AgentPhase::Activating;

        let names = self.store.list_generations().await?;
        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| name != &self.generation)
            .collect();

        if !stale.is_empty() {
            info!("Evicting {} stale generation(s): {:?}", stale.len(), stale);
            try_join_all(
                stale
                    .iter()
                    .map(|name| self.store.delete_generation(name)),
            )
            .await?;
        }

        *self.phase.write().await = AgentPhase::Activated;
        info!("Cache agent activated (generation: {})", self.generation);
        Ok(())
    }

    /// Fetch interception: serve from the generation when a match exists,
    /// otherwise fetch from the network, store one copy, and return the
    /// other.
    ///
    /// Cached entries are never revalidated; rotating the generation key is
    /// the only invalidation mechanism. A network failure on a miss
    /// propagates to the caller unchanged. Concurrent misses for the same
    /// URL are not deduplicated, the store's last write wins.
    pub async fn handle_fetch(&self, request_url: &str) -> Result<AssetResponse, CoreError> {
        let url = resolve_entry(&self.base, request_url)?;
        let key = url.as_str();

        if let Some(stored) = self.store.get(&self.generation, key).await? {
            debug!("Cache hit: {}", key);
            self.stats.write().await.hit_count += 1;
            return Ok(AssetResponse::from_bytes(
                stored.status,
                stored.content_type,
                stored.body,
            ));
        }

        info!("Cache miss: {}, fetching from network", key);
        self.stats.write().await.miss_count += 1;

        let response = self.fetcher.fetch(&url).await?;

        // One tee, two consumers: the caller's copy is returned, the cache
        // copy is buffered and stored before we hand the caller's back.
        let (caller_copy, cache_copy) = response.tee();
        match cache_copy.buffer().await {
            Ok((status, content_type, body)) => {
                let entry = StoredResponse::new(key, status, content_type, body);
                if let Err(e) = self.store.put(&self.generation, entry).await {
                    warn!("Failed to cache {}: {}", key, e);
                }
            }
            Err(e) => warn!("Failed to capture body for {}: {}", key, e),
        }

        Ok(caller_copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use vitrine_fetch::FetchError;
    use vitrine_store::MemoryStore;

    /// Recording fetcher backed by a canned URL -> response table
    #[derive(Default)]
    struct StubFetcher {
        responses: Mutex<HashMap<String, (u16, String, Bytes)>>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn with(responses: &[(&str, u16, &str, &'static [u8])]) -> Arc<Self> {
            let stub = Self::default();
            {
                let mut table = stub.responses.lock();
                for (url, status, content_type, body) in responses {
                    table.insert(
                        url.to_string(),
                        (*status, content_type.to_string(), Bytes::from_static(body)),
                    );
                }
            }
            Arc::new(stub)
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().iter().filter(|c| *c == url).count()
        }
    }

    #[async_trait]
    impl AssetFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<AssetResponse, FetchError> {
            self.calls.lock().push(url.to_string());
            match self.responses.lock().get(url.as_str()) {
                Some((status, content_type, body)) => Ok(AssetResponse::from_bytes(
                    *status,
                    content_type.clone(),
                    body.clone(),
                )),
                None => Err(FetchError::Stream(format!("unreachable: {}", url))),
            }
        }
    }

    fn base() -> Url {
        Url::parse("https://shop.test/").unwrap()
    }

    fn coordinator(
        store: Arc<MemoryStore>,
        fetcher: Arc<StubFetcher>,
        generation: &str,
        manifest: &[&str],
    ) -> CacheCoordinator {
        CacheCoordinator::new(
            store,
            fetcher,
            generation,
            AssetManifest::new(manifest.iter().copied()),
            base(),
        )
    }

    #[tokio::test]
    async fn test_install_primes_all_manifest_assets() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StubFetcher::with(&[
            ("https://shop.test/a.css", 200, "text/css", b"a { color: red }"),
            ("https://shop.test/b.png", 200, "image/png", b"\x89PNG"),
        ]);
        let agent = coordinator(store.clone(), fetcher, "site-cache", &["a.css", "b.png"]);

        agent.install().await.unwrap();

        let a = store
            .get("site-cache", "https://shop.test/a.css")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.body, Bytes::from_static(b"a { color: red }"));
        let b = store
            .get("site-cache", "https://shop.test/b.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(b.body, Bytes::from_static(b"\x89PNG"));
        assert_eq!(agent.phase().await, AgentPhase::Installed);
    }

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/a.css",
            200,
            "text/css",
            b"a",
        )]);
        let agent = coordinator(store.clone(), fetcher, "site-cache", &["a.css"]);

        agent.install().await.unwrap();
        let after_first = store.list_urls("site-cache").await.unwrap();
        agent.install().await.unwrap();
        let after_second = store.list_urls("site-cache").await.unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_prime_failure_is_caught_and_leaves_generation_untouched() {
        let store = Arc::new(MemoryStore::new());
        // b.png is missing from the stub, so the bulk prime fails.
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/a.css",
            200,
            "text/css",
            b"a",
        )]);
        let agent = coordinator(store.clone(), fetcher, "site-cache", &["a.css", "b.png"]);

        // Install itself must not fail.
        agent.install().await.unwrap();

        assert!(store.list_urls("site-cache").await.unwrap().is_empty());
        assert_eq!(agent.phase().await, AgentPhase::Installed);
    }

    #[tokio::test]
    async fn test_activate_evicts_every_other_generation() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "site-cache-v1",
                StoredResponse::new("https://shop.test/a.css", 200, "text/css", Bytes::from_static(b"old")),
            )
            .await
            .unwrap();
        store
            .put(
                "site-cache-v2",
                StoredResponse::new("https://shop.test/a.css", 200, "text/css", Bytes::from_static(b"new")),
            )
            .await
            .unwrap();

        let fetcher = StubFetcher::with(&[]);
        let agent = coordinator(store.clone(), fetcher, "site-cache-v2", &[]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        assert_eq!(
            store.list_generations().await.unwrap(),
            vec!["site-cache-v2"]
        );
        let kept = store
            .get("site-cache-v2", "https://shop.test/a.css")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.body, Bytes::from_static(b"new"));
        assert_eq!(agent.phase().await, AgentPhase::Activated);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let agent = coordinator(store, StubFetcher::with(&[]), "site-cache", &[]);

        let err = agent.activate().await.unwrap_err();
        assert!(matches!(err, CoreError::Lifecycle { .. }));
    }

    #[tokio::test]
    async fn test_hit_never_touches_the_network() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/styles.css",
            200,
            "text/css",
            b"cached",
        )]);
        let agent = coordinator(store, fetcher.clone(), "site-cache", &["styles.css"]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();
        let primed_calls = fetcher.call_count();

        let response = agent.handle_fetch("styles.css").await.unwrap();
        let (status, _, body) = response.buffer().await.unwrap();

        assert_eq!(status, 200);
        assert_eq!(body, Bytes::from_static(b"cached"));
        assert_eq!(fetcher.call_count(), primed_calls);
        assert_eq!(agent.stats().await.hit_count, 1);
    }

    #[tokio::test]
    async fn test_miss_populates_then_hits() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/missing.json",
            200,
            "application/json",
            br#"{"ok":true}"#,
        )]);
        let agent = coordinator(store.clone(), fetcher.clone(), "site-cache", &[]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        // First interception: miss, network fetch, populate.
        let first = agent.handle_fetch("/missing.json").await.unwrap();
        let (_, _, body) = first.buffer().await.unwrap();
        assert_eq!(body, Bytes::from_static(br#"{"ok":true}"#));
        assert!(
            store
                .contains("site-cache", "https://shop.test/missing.json")
                .await
                .unwrap()
        );

        // Second interception: served from the generation, no new call.
        let second = agent.handle_fetch("/missing.json").await.unwrap();
        let (_, _, body) = second.buffer().await.unwrap();
        assert_eq!(body, Bytes::from_static(br#"{"ok":true}"#));
        assert_eq!(fetcher.calls_for("https://shop.test/missing.json"), 1);

        let stats = agent.stats().await;
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[tokio::test]
    async fn test_caller_copy_survives_the_cache_write() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/hero-bcg.jpeg",
            200,
            "image/jpeg",
            b"jpeg bytes",
        )]);
        let agent = coordinator(store.clone(), fetcher, "site-cache", &[]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        let response = agent.handle_fetch("/hero-bcg.jpeg").await.unwrap();
        let (_, _, caller_body) = response.buffer().await.unwrap();
        let cached = store
            .get("site-cache", "https://shop.test/hero-bcg.jpeg")
            .await
            .unwrap()
            .unwrap();

        // Both copies of the teed body are complete.
        assert_eq!(caller_body, Bytes::from_static(b"jpeg bytes"));
        assert_eq!(cached.body, caller_body);
    }

    #[tokio::test]
    async fn test_network_failure_on_miss_propagates() {
        let store = Arc::new(MemoryStore::new());
        let agent = coordinator(store, StubFetcher::with(&[]), "site-cache", &[]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        let err = agent.handle_fetch("/unreachable.css").await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_cached_entries_are_never_revalidated() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "site-cache",
                StoredResponse::new(
                    "https://shop.test/products.json",
                    200,
                    "application/json",
                    Bytes::from_static(b"stale"),
                ),
            )
            .await
            .unwrap();

        // The network has fresher content, but a hit never reaches it.
        let fetcher = StubFetcher::with(&[(
            "https://shop.test/products.json",
            200,
            "application/json",
            b"fresh",
        )]);
        let agent = coordinator(store, fetcher.clone(), "site-cache", &[]);
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        let response = agent.handle_fetch("products.json").await.unwrap();
        let (_, _, body) = response.buffer().await.unwrap();
        assert_eq!(body, Bytes::from_static(b"stale"));
        assert_eq!(fetcher.calls_for("https://shop.test/products.json"), 0);
    }
}
