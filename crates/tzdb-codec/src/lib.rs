//! TZDB Codec - Binary decoder for compiled TZDB zone rules
//!
//! This crate turns the bytes of a compiled zone file into a
//! [`ZoneRules`](tzdb_core::ZoneRules) value, or fails with a classified
//! [`DecodeError`]. It is read-only: nothing here writes the format.
//!
//! # Zone file layout
//!
//! ```text
//! ┌────────┬──────────────────────────┬─────────────────────────────┐
//! │ u8 = 1 │ u16 len + "TZDB-ZONE"    │ serialized rule object ...  │
//! └────────┴──────────────────────────┴─────────────────────────────┘
//! ```
//!
//! The rule object is handed to a [`RulesDeserializer`]. [`StandardRules`]
//! reads the compiled TZDB layout; other deserializers can be plugged into a
//! [`ZoneFileDecoder`].
//!
//! # Quick Start
//!
//! ```no_run
//! let bytes = std::fs::read("tzdb/Europe/Paris.dat")?;
//! let rules = tzdb_codec::decode(&bytes)?;
//! println!("{} recurring rules", rules.last_rules().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The combined `tzdb.dat` archive is read by [`TzdbArchive`].

pub mod archive;
pub mod error;
pub mod reader;
pub mod rules;
pub mod ser;
pub mod zone_file;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use archive::{TzdbArchive, ARCHIVE_TAG};
pub use error::{DecodeError, PayloadError, Result};
pub use reader::DataReader;
pub use rules::{RulesDeserializer, StandardRules, TypedRules};
pub use ser::SerializedObject;
pub use zone_file::{decode, ZoneFileDecoder, FORMAT_MARKER, ZONE_FILE_TAG};
