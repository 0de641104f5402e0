//! Registry configuration
//!
//! The dataset version and the set of supported zone ids are fixed when the
//! data is packaged. They can be given inline, parsed from YAML, layered
//! from a file plus `TZDB_*` environment variables, or taken from a
//! combined archive.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tzdb_codec::TzdbArchive;
use tzdb_core::{VersionTag, ZoneId};

use crate::error::ConfigError;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "TZDB";

fn default_resource_dir() -> String {
    "tzdb".to_string()
}

fn default_single_flight() -> bool {
    true
}

fn default_preload_concurrency() -> usize {
    8
}

/// Static configuration of a [`RuleStore`](crate::RuleStore)
///
/// # Examples
///
/// ```rust
/// use tzdb_repository::RegistryConfig;
///
/// let config = RegistryConfig::new("2020a", ["Europe/Paris", "America/New_York"])
///     .with_resource_dir("zones")
///     .with_preload_concurrency(4);
///
/// assert!(config.validate().is_ok());
/// ```
///
/// The same configuration in YAML:
///
/// ```yaml
/// version: "2020a"
/// zone_ids:
///   - Europe/Paris
///   - America/New_York
/// resource_dir: zones
/// preload_concurrency: 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Dataset revision served by the store
    pub version: VersionTag,

    /// Zone ids the packaged data provides
    #[serde(default)]
    pub zone_ids: BTreeSet<ZoneId>,

    /// Resource prefix, relative to the provider root
    #[serde(default = "default_resource_dir")]
    pub resource_dir: String,

    /// Coalesce concurrent first lookups of the same zone into one load
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,

    /// Number of zones [`RuleStore::preload`](crate::RuleStore::preload)
    /// loads at once
    #[serde(default = "default_preload_concurrency")]
    pub preload_concurrency: usize,
}

impl RegistryConfig {
    pub fn new<I, Z>(version: impl Into<VersionTag>, zone_ids: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<ZoneId>,
    {
        Self {
            version: version.into(),
            zone_ids: zone_ids.into_iter().map(Into::into).collect(),
            resource_dir: default_resource_dir(),
            single_flight: default_single_flight(),
            preload_concurrency: default_preload_concurrency(),
        }
    }

    /// Version and zone ids of a combined archive
    pub fn from_archive(archive: &TzdbArchive) -> Self {
        Self::new(archive.version().clone(), archive.zone_ids().cloned())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, letting `TZDB_*` environment variables
    /// override its fields.
    ///
    /// The format follows the file extension (YAML, TOML, JSON).
    /// `TZDB_ZONE_IDS` takes a comma-separated list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("zone_ids"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_zone_ids<I, Z>(mut self, zone_ids: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<ZoneId>,
    {
        self.zone_ids = zone_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resource_dir(mut self, resource_dir: impl Into<String>) -> Self {
        self.resource_dir = resource_dir.into();
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn with_preload_concurrency(mut self, concurrency: usize) -> Self {
        self.preload_concurrency = concurrency;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.as_str().trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "version",
                message: "must not be empty".to_string(),
            });
        }

        if self.zone_ids.iter().any(|id| id.as_str().is_empty()) {
            return Err(ConfigError::InvalidField {
                field: "zone_ids",
                message: "zone ids must not be empty".to_string(),
            });
        }

        let dir = Path::new(&self.resource_dir);
        let relative = dir
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if self.resource_dir.is_empty() || !relative {
            return Err(ConfigError::InvalidField {
                field: "resource_dir",
                message: format!(
                    "'{}' must be a relative path inside the provider root",
                    self.resource_dir
                ),
            });
        }

        if self.preload_concurrency == 0 {
            return Err(ConfigError::InvalidField {
                field: "preload_concurrency",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
