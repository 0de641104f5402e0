//! Lazy, cache-backed rule store

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, trace, warn};
use tzdb_codec::ZoneFileDecoder;
use tzdb_core::{VersionTag, ZoneId, ZoneRules};

use crate::config::RegistryConfig;
use crate::error::{ConfigError, StoreError, StoreResult};
use crate::models::{CacheStats, StoreCounters, VersionHistory};
use crate::provider::ResourceProvider;
use crate::traits::{CacheableProvider, ZoneRulesProvider};

type LoadSlot = Arc<OnceCell<Arc<ZoneRules>>>;

/// Registry of zone rules that loads each zone on first use
///
/// Rules are fetched from a [`ResourceProvider`] at
/// `<resource_dir>/<zone id>.dat`, decoded, and kept for the lifetime of
/// the store. Entries are never replaced or evicted, and a failed load
/// leaves the cache untouched so a later lookup retries.
///
/// Share one store per process behind an `Arc`; every method takes `&self`.
pub struct RuleStore {
    version: VersionTag,
    zone_ids: BTreeSet<ZoneId>,
    resource_dir: String,
    single_flight: bool,
    preload_concurrency: usize,
    provider: Arc<dyn ResourceProvider>,
    decoder: ZoneFileDecoder,
    /// Decoded rules by zone id. Sharded, so lookups and inserts for
    /// different zones do not wait on each other.
    cache: DashMap<ZoneId, Arc<ZoneRules>>,
    /// Loads currently running, one slot per zone
    in_flight: DashMap<ZoneId, LoadSlot>,
    counters: StoreCounters,
}

/// Removes a zone's slot from `in_flight` when the load holding it ends,
/// including when the load future is dropped before completing
struct SlotGuard<'a> {
    in_flight: &'a DashMap<ZoneId, LoadSlot>,
    zone_id: &'a ZoneId,
    slot: &'a LoadSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        // A later caller may already hold a fresh slot for the zone
        self.in_flight
            .remove_if(self.zone_id, |_, current| Arc::ptr_eq(current, self.slot));
    }
}

impl RuleStore {
    /// Create a store over a provider
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration does not validate.
    pub fn new(
        config: RegistryConfig,
        provider: impl ResourceProvider + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            version: config.version,
            zone_ids: config.zone_ids,
            resource_dir: config.resource_dir.trim_end_matches('/').to_string(),
            single_flight: config.single_flight,
            preload_concurrency: config.preload_concurrency,
            provider: Arc::new(provider),
            decoder: ZoneFileDecoder::new(),
            cache: DashMap::new(),
            in_flight: DashMap::new(),
            counters: StoreCounters::default(),
        })
    }

    /// Replace the zone file decoder, e.g. to plug in another rule
    /// deserializer
    pub fn with_decoder(mut self, decoder: ZoneFileDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Dataset revision served by this store
    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Resource path for a zone id
    pub fn resource_path(&self, zone_id: &str) -> String {
        format!("{}/{}.dat", self.resource_dir, zone_id)
    }

    /// Load rules ahead of use.
    ///
    /// `priority` is resolved first, then every supported zone with up to
    /// `preload_concurrency` loads running at once. Stops at the first
    /// failure. Returns the number of zones cached afterwards.
    ///
    /// The returned future is `Send`, so a warm-up can run on a background
    /// task over an `Arc<RuleStore>`.
    pub async fn preload(&self, priority: Option<&str>) -> StoreResult<usize> {
        if let Some(zone_id) = priority {
            self.rules_for(zone_id).await?;
        }

        stream::iter(self.zone_ids.iter().cloned())
            .map(|zone_id| async move { self.rules_for(zone_id.as_str()).await })
            .buffer_unordered(self.preload_concurrency)
            .try_for_each(|_| async { Ok(()) })
            .await?;

        let loaded = self.cache.len();
        info!(
            version = %self.version,
            loaded,
            supported = self.zone_ids.len(),
            "preloaded zone rules"
        );
        Ok(loaded)
    }

    fn cached(&self, zone_id: &str) -> Option<Arc<ZoneRules>> {
        self.cache.get(zone_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Load through the per-zone slot so concurrent callers share one load
    async fn load_shared(&self, zone_id: ZoneId) -> StoreResult<Arc<ZoneRules>> {
        let slot: LoadSlot = Arc::clone(
            self.in_flight
                .entry(zone_id.clone())
                .or_default()
                .value(),
        );
        let _guard = SlotGuard {
            in_flight: &self.in_flight,
            zone_id: &zone_id,
            slot: &slot,
        };

        let result = slot
            .get_or_try_init(|| async {
                // The previous slot holder may have published already
                if let Some(rules) = self.cached(zone_id.as_str()) {
                    return Ok(rules);
                }
                self.load(zone_id.clone()).await
            })
            .await
            .map(Arc::clone);
        result
    }

    /// Fetch, decode and publish one zone
    async fn load(&self, zone_id: ZoneId) -> StoreResult<Arc<ZoneRules>> {
        let path = self.resource_path(zone_id.as_str());
        StoreCounters::record(&self.counters.fetches);
        debug!(zone_id = %zone_id, path = %path, "fetching zone rules");

        let bytes = match self.provider.fetch(&path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                StoreCounters::record(&self.counters.failures);
                let err = StoreError::from_fetch(zone_id, err);
                if err.is_packaging_defect() {
                    error!(path = %path, error = %err, "bundled zone rules missing");
                } else {
                    warn!(path = %path, error = %err, "failed to read zone rules");
                }
                return Err(err);
            }
        };

        let rules = match self.decoder.decode(&bytes) {
            Ok(rules) => rules,
            Err(source) => {
                StoreCounters::record(&self.counters.failures);
                warn!(
                    zone_id = %zone_id,
                    path = %path,
                    error = %source,
                    "corrupt zone rules"
                );
                return Err(StoreError::CorruptFormat { zone_id, source });
            }
        };
        debug!(zone_id = %zone_id, bytes = bytes.len(), "decoded zone rules");

        Ok(self.publish(zone_id, rules))
    }

    /// Insert unless another load got there first; the cached value wins
    fn publish(&self, zone_id: ZoneId, rules: ZoneRules) -> Arc<ZoneRules> {
        let published = Arc::clone(
            self.cache
                .entry(zone_id)
                .or_insert_with(|| Arc::new(rules))
                .value(),
        );
        self.counters
            .entries
            .store(self.cache.len(), Ordering::Relaxed);
        published
    }
}

#[async_trait]
impl ZoneRulesProvider for RuleStore {
    fn supported_zone_ids(&self) -> &BTreeSet<ZoneId> {
        &self.zone_ids
    }

    async fn rules_for(&self, zone_id: &str) -> StoreResult<Arc<ZoneRules>> {
        if let Some(rules) = self.cached(zone_id) {
            StoreCounters::record(&self.counters.hits);
            trace!(zone_id, "zone rules cache hit");
            return Ok(rules);
        }
        StoreCounters::record(&self.counters.misses);

        let zone_id = ZoneId::from(zone_id);
        if self.single_flight {
            self.load_shared(zone_id).await
        } else {
            self.load(zone_id).await
        }
    }

    async fn versions_for(&self, zone_id: &str) -> StoreResult<VersionHistory> {
        let rules = self.rules_for(zone_id).await?;
        let mut history = VersionHistory::new();
        history.insert(self.version.clone(), rules);
        Ok(history)
    }
}

#[async_trait]
impl CacheableProvider for RuleStore {
    fn cache_stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    async fn resolved_zone_ids(&self) -> Vec<ZoneId> {
        let mut zone_ids: Vec<ZoneId> = self
            .cache
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        zone_ids.sort();
        zone_ids
    }
}

impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleStore")
            .field("version", &self.version)
            .field("zone_ids", &self.zone_ids.len())
            .field("resource_dir", &self.resource_dir)
            .field("single_flight", &self.single_flight)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}
