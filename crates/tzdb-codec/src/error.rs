//! Decoder error types

use thiserror::Error;
use tzdb_core::CoreError;

/// Failure while reading the serialized rule object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Stream ended before a value could be read
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Negative {field} count: {count}")]
    NegativeCount { field: &'static str, count: i64 },

    /// Type byte of a serialized object is not a known type
    #[error("Unknown serialized type: {0}")]
    UnknownObjectType(u8),

    /// Serialized object decoded to a different type than required
    #[error("Unexpected serialized object: expected {expected}, found {found}")]
    UnexpectedObject {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Index {index} out of range for {table} table ({len} entries)")]
    IndexOutOfRange {
        table: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Archive declares no dataset version")]
    MissingVersion,

    #[error("{count} unread bytes after serialized object")]
    TrailingBytes { count: usize },

    /// Values were read but do not form valid rules
    #[error("Invalid rule data: {0}")]
    InvalidRules(#[from] CoreError),
}

/// Classified failure to decode a zone file or archive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// First byte missing or not the expected format marker
    #[error(
        "File format not recognised: expected format marker {expected}, found {}",
        .found.map_or_else(|| "end of data".to_string(), |b| b.to_string())
    )]
    FormatMarkerMismatch { expected: u8, found: Option<u8> },

    /// Group tag unreadable or not the expected literal
    #[error(
        "File format not recognised: expected tag {expected:?}, found {}",
        .found.as_ref().map_or_else(|| "an unreadable tag".to_string(), |t| format!("{:?}", t))
    )]
    TagMismatch {
        expected: &'static str,
        found: Option<String>,
    },

    /// Header is valid but the embedded rule object could not be rebuilt
    #[error("Invalid serialized rule object: {0}")]
    PayloadDecodeError(#[from] PayloadError),
}

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecodeError>;
