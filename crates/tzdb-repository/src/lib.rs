//! Lazy, cache-backed registry of compiled TZDB zone rules
//!
//! This crate resolves a zone id such as `"America/New_York"` to its decoded
//! [`ZoneRules`](tzdb_core::ZoneRules). Rules are read from a bundled,
//! versioned resource the first time a zone is asked for and cached for the
//! lifetime of the store.
//!
//! # Features
//!
//! - **Lazy loading**: nothing is read until a zone is looked up
//! - **Caching**: decoded rules are shared behind `Arc` and never evicted
//! - **Single-flight**: concurrent first lookups of a zone share one load
//! - **Pluggable sources**: file system or in-memory resource providers
//! - **Async API**: non-blocking I/O with Tokio
//!
//! # Quick Start
//!
//! ```no_run
//! use tzdb_repository::{FileSystemProvider, RegistryConfig, RuleStore, ZoneRulesProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistryConfig::load("tzdb.yaml")?;
//!     let store = RuleStore::new(config, FileSystemProvider::new("data")?)?;
//!
//!     let rules = store.rules_for("America/New_York").await?;
//!     println!("{} recurring rules", rules.last_rules().len());
//!
//!     let history = store.versions_for("America/New_York").await?;
//!     assert_eq!(history.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Classes
//!
//! A failed lookup is one of:
//!
//! - [`StoreError::ResourceMissing`]: the zone was never packaged. This is
//!   a broken build, see [`StoreError::is_packaging_defect`]
//! - [`StoreError::InvalidZoneId`]: the id cannot name a resource path
//! - [`StoreError::ResourceUnreadable`]: the provider failed to read it
//! - [`StoreError::CorruptFormat`]: the bytes did not decode
//!
//! Failures are never cached.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        Application Layer               │
//! └──────────────┬─────────────────────────┘
//!                │ ZoneRulesProvider trait
//!                ↓
//! ┌────────────────────────────────────────┐
//! │    RuleStore                           │
//! │  - cache (zone id → rules)             │
//! │  - per-zone in-flight loads            │
//! │  - ZoneFileDecoder (tzdb-codec)        │
//! └──────────────┬─────────────────────────┘
//!                │ ResourceProvider trait
//!       ┌────────┴────────┐
//!       ↓                 ↓
//! ┌──────────────┐  ┌──────────────────┐
//! │ FileSystem   │  │  Memory          │
//! │ Provider     │  │  Provider        │
//! └──────────────┘  └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod store;
pub mod traits;

// Re-exports - Configuration
pub use config::{RegistryConfig, ENV_PREFIX};

// Re-exports - Error
pub use error::{ConfigError, FetchError, StoreError, StoreResult};

// Re-exports - Providers
pub use provider::{FileSystemProvider, MemoryProvider, ResourceProvider};

// Re-exports - Store
pub use models::{CacheStats, VersionHistory};
pub use store::RuleStore;
pub use traits::*;
