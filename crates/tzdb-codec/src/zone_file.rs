//! Single-zone rule files
//!
//! Each zone is stored as its own resource: a format marker, the
//! `TZDB-ZONE` group tag, then the serialized rules.

use std::fmt;
use std::sync::Arc;

use tzdb_core::ZoneRules;

use crate::error::{DecodeError, Result};
use crate::reader::DataReader;
use crate::rules::{RulesDeserializer, StandardRules};

/// Leading byte of every compiled file
pub const FORMAT_MARKER: u8 = 1;

/// Group tag of a single-zone file
pub const ZONE_FILE_TAG: &str = "TZDB-ZONE";

/// Decode a zone file with the [`StandardRules`] deserializer
pub fn decode(bytes: &[u8]) -> Result<ZoneRules> {
    ZoneFileDecoder::new().decode(bytes)
}

/// Validates the zone file header and delegates the payload to a
/// [`RulesDeserializer`]
///
/// Holds no state between calls and is cheap to clone.
#[derive(Clone)]
pub struct ZoneFileDecoder {
    deserializer: Arc<dyn RulesDeserializer>,
}

impl ZoneFileDecoder {
    pub fn new() -> Self {
        Self::with_deserializer(StandardRules)
    }

    pub fn with_deserializer(deserializer: impl RulesDeserializer + 'static) -> Self {
        Self {
            deserializer: Arc::new(deserializer),
        }
    }

    /// Decode one zone file.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::FormatMarkerMismatch`] if the first byte is not `1`
    /// - [`DecodeError::TagMismatch`] if the tag is not `TZDB-ZONE`
    /// - [`DecodeError::PayloadDecodeError`] if the deserializer fails or
    ///   leaves bytes unread
    pub fn decode(&self, bytes: &[u8]) -> Result<ZoneRules> {
        let mut reader = DataReader::new(bytes);
        read_header(&mut reader, ZONE_FILE_TAG)?;
        let rules = self.deserializer.deserialize(&mut reader)?;
        reader.finish()?;
        Ok(rules)
    }
}

impl Default for ZoneFileDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ZoneFileDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneFileDecoder").finish_non_exhaustive()
    }
}

/// Check the format marker and group tag shared by zone files and archives
pub(crate) fn read_header(reader: &mut DataReader<'_>, expected_tag: &'static str) -> Result<()> {
    let marker = reader.read_u8().ok();
    if marker != Some(FORMAT_MARKER) {
        return Err(DecodeError::FormatMarkerMismatch {
            expected: FORMAT_MARKER,
            found: marker,
        });
    }

    let tag = reader.read_utf().ok();
    if tag != Some(expected_tag) {
        return Err(DecodeError::TagMismatch {
            expected: expected_tag,
            found: tag.map(str::to_string),
        });
    }

    Ok(())
}
