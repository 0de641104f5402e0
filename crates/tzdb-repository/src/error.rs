//! Error types for the rule store

use thiserror::Error;
use tzdb_codec::DecodeError;
use tzdb_core::ZoneId;

/// Result type alias for rule store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`ResourceProvider`](crate::ResourceProvider)
#[derive(Error, Debug)]
pub enum FetchError {
    /// No resource exists at the path
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// The path is malformed or escapes the provider root
    #[error("Invalid resource path: {path}")]
    InvalidPath { path: String },

    /// The resource exists but could not be read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            FetchError::NotFound { path }
            | FetchError::InvalidPath { path }
            | FetchError::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur while resolving zone rules
#[derive(Error, Debug)]
pub enum StoreError {
    /// The bundled resource for the zone is absent.
    ///
    /// Every zone the registry is asked for should have been packaged, so
    /// this indicates a broken build rather than bad input.
    #[error("Rule resource missing for zone {zone_id}: {path}")]
    ResourceMissing { zone_id: ZoneId, path: String },

    /// The id does not map to a resource path the provider accepts, e.g.
    /// it contains `..`
    #[error("Invalid zone id {zone_id}: {path}")]
    InvalidZoneId { zone_id: ZoneId, path: String },

    /// The resource exists but reading it failed
    #[error("Rule resource unreadable for zone {zone_id}: {source}")]
    ResourceUnreadable {
        zone_id: ZoneId,
        #[source]
        source: FetchError,
    },

    /// The resource was read but its contents did not decode
    #[error("Corrupt rule data for zone {zone_id}: {source}")]
    CorruptFormat {
        zone_id: ZoneId,
        #[source]
        source: DecodeError,
    },
}

impl StoreError {
    /// Zone the failed lookup was for
    pub fn zone_id(&self) -> &ZoneId {
        match self {
            StoreError::ResourceMissing { zone_id, .. }
            | StoreError::InvalidZoneId { zone_id, .. }
            | StoreError::ResourceUnreadable { zone_id, .. }
            | StoreError::CorruptFormat { zone_id, .. } => zone_id,
        }
    }

    /// True for failures that point at the packaged data rather than the
    /// request: a missing resource
    pub fn is_packaging_defect(&self) -> bool {
        matches!(self, StoreError::ResourceMissing { .. })
    }

    pub(crate) fn from_fetch(zone_id: ZoneId, err: FetchError) -> Self {
        match err {
            FetchError::NotFound { path } => StoreError::ResourceMissing { zone_id, path },
            FetchError::InvalidPath { path } => StoreError::InvalidZoneId { zone_id, path },
            other => StoreError::ResourceUnreadable {
                zone_id,
                source: other,
            },
        }
    }
}

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds a value the store cannot use
    #[error("Invalid configuration field {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Layered file/environment loading error
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
