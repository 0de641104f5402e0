//! Identifier and offset types
//!
//! This module contains the small value types the registry is keyed on:
//! - Zone identifiers
//! - Dataset version tags
//! - UTC offsets

pub mod id;
pub mod offset;

pub use id::{VersionTag, ZoneId};
pub use offset::ZoneOffset;
