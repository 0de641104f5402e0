//! Core trait definitions for zone rule lookup
//!
//! - [`ZoneRulesProvider`]: read interface for resolving zone ids
//! - [`CacheableProvider`]: extension for inspecting the cache
//!
//! # Examples
//!
//! ```no_run
//! use tzdb_repository::{
//!     CacheableProvider, FileSystemProvider, RegistryConfig, RuleStore, ZoneRulesProvider,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::new("2020a", ["Europe/Paris"]);
//! let store = RuleStore::new(config, FileSystemProvider::new("data")?)?;
//!
//! // First lookup reads and decodes `data/tzdb/Europe/Paris.dat`
//! let rules = store.rules_for("Europe/Paris").await?;
//!
//! // Second lookup is served from the cache
//! let again = store.rules_for("Europe/Paris").await?;
//! assert_eq!(rules, again);
//!
//! println!("Hit rate: {:.2}%", store.cache_stats().hit_rate() * 100.0);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tzdb_core::{ZoneId, ZoneRules};

use crate::{CacheStats, StoreResult, VersionHistory};

/// Resolves zone ids to decoded rules
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait ZoneRulesProvider: Send + Sync {
    /// Zone ids the packaged data provides.
    ///
    /// Fixed at construction; independent of which zones have been loaded.
    fn supported_zone_ids(&self) -> &BTreeSet<ZoneId>;

    /// Rules for a zone id.
    ///
    /// The id is not checked against [`supported_zone_ids`]; an unknown id
    /// simply has no resource.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ResourceMissing`] if no resource exists for the id
    /// - [`StoreError::InvalidZoneId`] if the id is not a usable resource path
    /// - [`StoreError::ResourceUnreadable`] if reading the resource failed
    /// - [`StoreError::CorruptFormat`] if the resource did not decode
    ///
    /// [`supported_zone_ids`]: ZoneRulesProvider::supported_zone_ids
    /// [`StoreError::ResourceMissing`]: crate::StoreError::ResourceMissing
    /// [`StoreError::InvalidZoneId`]: crate::StoreError::InvalidZoneId
    /// [`StoreError::ResourceUnreadable`]: crate::StoreError::ResourceUnreadable
    /// [`StoreError::CorruptFormat`]: crate::StoreError::CorruptFormat
    async fn rules_for(&self, zone_id: &str) -> StoreResult<Arc<ZoneRules>>;

    /// Rules for a zone id keyed by dataset version
    async fn versions_for(&self, zone_id: &str) -> StoreResult<VersionHistory>;
}

/// Extension trait for providers backed by a cache
#[async_trait]
pub trait CacheableProvider: ZoneRulesProvider {
    /// Get cache statistics
    fn cache_stats(&self) -> CacheStats;

    /// Zone ids currently held in the cache, in ascending order
    async fn resolved_zone_ids(&self) -> Vec<ZoneId>;
}
