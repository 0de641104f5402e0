//! Concurrent first-use tests for RuleStore

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tzdb_codec::fixtures;
use tzdb_repository::{
    CacheableProvider, FetchError, MemoryProvider, RegistryConfig, ResourceProvider, RuleStore,
    ZoneRulesProvider,
};

const TASKS: usize = 64;

/// Slow provider so concurrent lookups overlap inside the load
struct SlowProvider {
    inner: MemoryProvider,
    fetches: AtomicUsize,
}

impl SlowProvider {
    fn new() -> Arc<Self> {
        let inner = MemoryProvider::new()
            .with_resource(
                "tzdb/America/New_York.dat",
                fixtures::zone_file(&fixtures::new_york()),
            )
            .with_resource("tzdb/Etc/UTC.dat", fixtures::zone_file(&fixtures::utc()))
            .with_resource(
                "tzdb/Asia/Kathmandu.dat",
                fixtures::zone_file(&fixtures::fixed(20_700)),
            );
        Arc::new(Self {
            inner,
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ResourceProvider for SlowProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.fetch(path).await
    }
}

fn config(single_flight: bool) -> RegistryConfig {
    RegistryConfig::new("2020a", ["America/New_York", "Asia/Kathmandu", "Etc/UTC"])
        .with_single_flight(single_flight)
}

async fn hammer(store: Arc<RuleStore>, zone_ids: &[&'static str]) {
    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let store = Arc::clone(&store);
            let zone_id = zone_ids[i % zone_ids.len()];
            tokio::spawn(async move { (zone_id, store.rules_for(zone_id).await) })
        })
        .collect();

    let mut first_seen = std::collections::HashMap::new();
    for handle in handles {
        let (zone_id, result) = handle.await.expect("task panicked");
        let rules = result.expect("lookup failed");
        let first = first_seen.entry(zone_id).or_insert_with(|| Arc::clone(&rules));
        assert_eq!(**first, *rules);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_use_single_flight() {
    let provider = SlowProvider::new();
    let store = Arc::new(RuleStore::new(config(true), provider.clone()).unwrap());

    hammer(Arc::clone(&store), &["America/New_York"]).await;

    assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(store.resolved_zone_ids().await.len(), 1);

    let stats = store.cache_stats();
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.hits + stats.misses, TASKS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_use_without_single_flight() {
    let provider = SlowProvider::new();
    let store = Arc::new(RuleStore::new(config(false), provider.clone()).unwrap());

    hammer(Arc::clone(&store), &["America/New_York"]).await;

    // Duplicate loads may race; the cache still ends with one entry
    let fetches = provider.fetches.load(Ordering::SeqCst);
    assert!((1..=TASKS).contains(&fetches));
    assert_eq!(store.resolved_zone_ids().await.len(), 1);

    let cached = store.rules_for("America/New_York").await.unwrap();
    assert_eq!(*cached, fixtures::new_york());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mixed_zones() {
    let provider = SlowProvider::new();
    let store = Arc::new(RuleStore::new(config(true), provider.clone()).unwrap());

    hammer(
        Arc::clone(&store),
        &["America/New_York", "Etc/UTC", "Asia/Kathmandu"],
    )
    .await;

    assert_eq!(provider.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(store.resolved_zone_ids().await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_missing_zone() {
    let provider = SlowProvider::new();
    let store = Arc::new(RuleStore::new(config(true), provider.clone()).unwrap());

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.rules_for("Europe/Atlantis").await })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_packaging_defect());
    }
    assert!(store.resolved_zone_ids().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_preload_and_lookups() {
    let provider = SlowProvider::new();
    let store = Arc::new(RuleStore::new(config(true), provider.clone()).unwrap());

    let preload = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.preload(Some("Etc/UTC")).await })
    };
    hammer(Arc::clone(&store), &["Asia/Kathmandu", "America/New_York"]).await;

    assert_eq!(preload.await.unwrap().unwrap(), 3);
    assert_eq!(provider.fetches.load(Ordering::SeqCst), 3);
}

/// Holds `America/New_York` until the gate opens; everything else is served
/// straight away
struct GatedProvider {
    inner: MemoryProvider,
    gate: tokio::sync::Notify,
}

#[async_trait]
impl ResourceProvider for GatedProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        if path == "tzdb/America/New_York.dat" {
            self.gate.notified().await;
        }
        self.inner.fetch(path).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stalled_load_does_not_block_other_zones() {
    let provider = Arc::new(GatedProvider {
        inner: MemoryProvider::new()
            .with_resource(
                "tzdb/America/New_York.dat",
                fixtures::zone_file(&fixtures::new_york()),
            )
            .with_resource("tzdb/Etc/UTC.dat", fixtures::zone_file(&fixtures::utc())),
        gate: tokio::sync::Notify::new(),
    });
    let store = Arc::new(RuleStore::new(config(true), Arc::clone(&provider)).unwrap());

    let stalled = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.rules_for("America/New_York").await })
    };

    for _ in 0..TASKS {
        let rules = tokio::time::timeout(Duration::from_secs(1), store.rules_for("Etc/UTC"))
            .await
            .expect("lookup waited on an unrelated zone")
            .unwrap();
        assert_eq!(*rules, fixtures::utc());
    }
    assert!(!stalled.is_finished());

    provider.gate.notify_one();
    assert_eq!(*stalled.await.unwrap().unwrap(), fixtures::new_york());

    let resolved: Vec<String> = store
        .resolved_zone_ids()
        .await
        .into_iter()
        .map(|id| id.into_inner())
        .collect();
    assert_eq!(resolved, vec!["America/New_York", "Etc/UTC"]);
}
