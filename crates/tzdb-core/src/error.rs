//! Error types for TZDB Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Offset outside of -18:00..=+18:00
    #[error("Zone offset out of range: {seconds}s")]
    InvalidOffset { seconds: i32 },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    /// Decoded rules violate a structural invariant
    #[error("Malformed zone rules: {0}")]
    MalformedRules(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
