//! Unit tests for RuleStore
//!
//! These tests focus on lazy loading, caching behavior, and error
//! classification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tzdb_codec::{fixtures, DecodeError, PayloadError, ZoneFileDecoder};
use tzdb_core::{ZoneOffset, ZoneRules};
use tzdb_repository::{
    CacheableProvider, FetchError, MemoryProvider, RegistryConfig, ResourceProvider, RuleStore,
    StoreError, ZoneRulesProvider,
};

/// Provider double that counts fetches and can be switched between two
/// bundles
struct CountingProvider {
    inner: std::sync::RwLock<MemoryProvider>,
    fetches: AtomicUsize,
}

impl CountingProvider {
    fn new(inner: MemoryProvider) -> Arc<Self> {
        Arc::new(Self {
            inner: std::sync::RwLock::new(inner),
            fetches: AtomicUsize::new(0),
        })
    }

    fn replace(&self, inner: MemoryProvider) {
        *self.inner.write().unwrap() = inner;
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceProvider for CountingProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().unwrap().clone();
        inner.fetch(path).await
    }
}

/// Provider that fails every read with an I/O error
struct BrokenProvider;

#[async_trait]
impl ResourceProvider for BrokenProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        Err(FetchError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}

fn bundle() -> MemoryProvider {
    MemoryProvider::new()
        .with_resource(
            "tzdb/America/New_York.dat",
            fixtures::zone_file(&fixtures::new_york()),
        )
        .with_resource("tzdb/Etc/UTC.dat", fixtures::zone_file(&fixtures::utc()))
        .with_resource(
            "tzdb/Asia/Kolkata.dat",
            fixtures::zone_file(&fixtures::fixed(19_800)),
        )
}

fn config() -> RegistryConfig {
    RegistryConfig::new("2020a", ["America/New_York", "Asia/Kolkata", "Etc/UTC"])
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_rules_for_decodes_resource() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let rules = store.rules_for("America/New_York").await.unwrap();

    assert_eq!(*rules, fixtures::new_york());
}

#[tokio::test]
async fn test_rules_for_is_deterministic() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let first = store.rules_for("America/New_York").await.unwrap();
    let second = store.rules_for("America/New_York").await.unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_cache_hit_skips_fetch() {
    let provider = CountingProvider::new(bundle());
    let store = RuleStore::new(config(), provider.clone()).unwrap();

    store.rules_for("Etc/UTC").await.unwrap();
    store.rules_for("Etc/UTC").await.unwrap();
    store.rules_for("Etc/UTC").await.unwrap();

    assert_eq!(provider.fetches(), 1);

    let stats = store.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn test_zone_ids_are_case_sensitive() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let err = store.rules_for("etc/utc").await.unwrap_err();

    assert!(matches!(err, StoreError::ResourceMissing { .. }));
}

#[tokio::test]
async fn test_versions_for_single_entry() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let history = store.versions_for("Asia/Kolkata").await.unwrap();
    let rules = store.rules_for("Asia/Kolkata").await.unwrap();

    assert_eq!(history.len(), 1);
    let (version, history_rules) = history.iter().next().unwrap();
    assert_eq!(version, "2020a");
    assert_eq!(version, store.version());
    assert!(Arc::ptr_eq(history_rules, &rules));
}

#[tokio::test]
async fn test_versions_for_propagates_errors() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let err = store.versions_for("Europe/Atlantis").await.unwrap_err();

    assert!(err.is_packaging_defect());
}

// ============================================================================
// Supported ids
// ============================================================================

#[tokio::test]
async fn test_supported_ids_independent_of_cache() {
    let store = RuleStore::new(config(), bundle()).unwrap();
    let before = store.supported_zone_ids().clone();

    store.rules_for("Etc/UTC").await.unwrap();
    let _ = store.rules_for("Europe/Atlantis").await;

    assert_eq!(store.supported_zone_ids(), &before);
    let ids: Vec<&str> = before.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["America/New_York", "Asia/Kolkata", "Etc/UTC"]);
}

#[tokio::test]
async fn test_resolved_ids_ordered() {
    let store = RuleStore::new(config(), bundle()).unwrap();
    assert!(store.resolved_zone_ids().await.is_empty());

    store.rules_for("Etc/UTC").await.unwrap();
    store.rules_for("America/New_York").await.unwrap();

    let resolved: Vec<String> = store
        .resolved_zone_ids()
        .await
        .into_iter()
        .map(|id| id.into_inner())
        .collect();
    assert_eq!(resolved, vec!["America/New_York", "Etc/UTC"]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unsupported_id_is_missing_and_uncached() {
    let provider = CountingProvider::new(bundle());
    let store = RuleStore::new(config(), provider.clone()).unwrap();

    let err = store.rules_for("Europe/Atlantis").await.unwrap_err();

    match &err {
        StoreError::ResourceMissing { zone_id, path } => {
            assert_eq!(zone_id, "Europe/Atlantis");
            assert_eq!(path, "tzdb/Europe/Atlantis.dat");
        }
        other => panic!("Expected ResourceMissing, got {other:?}"),
    }
    assert!(store.resolved_zone_ids().await.is_empty());

    // Not negatively cached: a second lookup fetches again
    let _ = store.rules_for("Europe/Atlantis").await;
    assert_eq!(provider.fetches(), 2);
    assert_eq!(store.cache_stats().failures, 2);
}

#[tokio::test]
async fn test_escaping_id_is_missing() {
    let store = RuleStore::new(config(), bundle()).unwrap();

    let err = store.rules_for("../../etc/passwd").await.unwrap_err();

    assert!(err.is_packaging_defect());
}

#[tokio::test]
async fn test_corrupt_marker() {
    let bundle = MemoryProvider::new().with_resource(
        "tzdb/Etc/UTC.dat",
        fixtures::zone_file_with_header(2, "TZDB-ZONE", &fixtures::utc()),
    );
    let store = RuleStore::new(config(), bundle).unwrap();

    let err = store.rules_for("Etc/UTC").await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::CorruptFormat {
            source: DecodeError::FormatMarkerMismatch {
                expected: 1,
                found: Some(2)
            },
            ..
        }
    ));
    assert!(!err.is_packaging_defect());
}

#[tokio::test]
async fn test_corrupt_tag() {
    let bundle = MemoryProvider::new().with_resource(
        "tzdb/Etc/UTC.dat",
        fixtures::zone_file_with_header(1, "TZDB", &fixtures::utc()),
    );
    let store = RuleStore::new(config(), bundle).unwrap();

    let err = store.rules_for("Etc/UTC").await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::CorruptFormat {
            source: DecodeError::TagMismatch { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_truncated_payload() {
    let bytes = fixtures::zone_file(&fixtures::new_york());
    let bundle = MemoryProvider::new().with_resource(
        "tzdb/America/New_York.dat",
        bytes[..bytes.len() - 2].to_vec(),
    );
    let store = RuleStore::new(config(), bundle).unwrap();

    let err = store.rules_for("America/New_York").await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::CorruptFormat {
            source: DecodeError::PayloadDecodeError(PayloadError::UnexpectedEof { .. }),
            ..
        }
    ));
    assert!(store.resolved_zone_ids().await.is_empty());
}

#[tokio::test]
async fn test_corrupt_then_repaired() {
    let broken = MemoryProvider::new().with_resource("tzdb/Etc/UTC.dat", vec![9u8, 9, 9]);
    let provider = CountingProvider::new(broken);
    let store = RuleStore::new(config(), provider.clone()).unwrap();

    assert!(store.rules_for("Etc/UTC").await.is_err());

    provider.replace(bundle());
    let rules = store.rules_for("Etc/UTC").await.unwrap();

    assert!(rules.is_fixed_offset());
    assert_eq!(store.resolved_zone_ids().await.len(), 1);
}

#[tokio::test]
async fn test_unreadable_resource() {
    let store = RuleStore::new(config(), BrokenProvider).unwrap();

    let err = store.rules_for("Etc/UTC").await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::ResourceUnreadable {
            source: FetchError::Io { .. },
            ..
        }
    ));
    assert!(!err.is_packaging_defect());
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_custom_resource_dir() {
    let bundle = MemoryProvider::new().with_resource(
        "zones/2020a/Etc/UTC.dat",
        fixtures::zone_file(&fixtures::utc()),
    );
    let config = RegistryConfig::new("2020a", ["Etc/UTC"]).with_resource_dir("zones/2020a");
    let store = RuleStore::new(config, bundle).unwrap();

    assert!(store.rules_for("Etc/UTC").await.is_ok());
}

fn fixed_offset_only(
    input: &mut tzdb_codec::DataReader<'_>,
) -> Result<ZoneRules, PayloadError> {
    let seconds = input.read_i32()?;
    Ok(ZoneRules::fixed(ZoneOffset::from_total_seconds(seconds)?))
}

#[tokio::test]
async fn test_custom_decoder() {
    let mut bytes = fixtures::header(1, "TZDB-ZONE");
    bytes.extend_from_slice(&(-3600i32).to_be_bytes());
    let bundle = MemoryProvider::new().with_resource("tzdb/Atlantic/Azores.dat", bytes);
    let store = RuleStore::new(RegistryConfig::new("2020a", ["Atlantic/Azores"]), bundle)
        .unwrap()
        .with_decoder(ZoneFileDecoder::with_deserializer(fixed_offset_only));

    let rules = store.rules_for("Atlantic/Azores").await.unwrap();

    assert_eq!(rules.standard_offsets()[0].total_seconds(), -3600);
}

// ============================================================================
// Preload
// ============================================================================

#[tokio::test]
async fn test_preload_all() {
    let provider = CountingProvider::new(bundle());
    let store = RuleStore::new(config(), provider.clone()).unwrap();

    let loaded = store.preload(Some("America/New_York")).await.unwrap();

    assert_eq!(loaded, 3);
    assert_eq!(provider.fetches(), 3);
    assert_eq!(store.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_preload_stops_on_missing_zone() {
    let config = config().with_zone_ids(["Etc/UTC", "Europe/Atlantis"]);
    let store = RuleStore::new(config, bundle()).unwrap();

    let err = store.preload(None).await.unwrap_err();

    assert_eq!(err.zone_id(), "Europe/Atlantis");
}
