//! TZDB Core - Zone rule types for the TZDB rules registry
//!
//! This crate provides the data model shared by the codec and the registry:
//! - Identifier types (`ZoneId`, `VersionTag`)
//! - Offset types (`ZoneOffset`)
//! - Decoded rule types (`ZoneRules`, `OffsetTransition`, `TransitionRule`)
//! - Error types

pub mod error;
pub mod rules;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use rules::{OffsetTransition, TimeDefinition, TransitionRule, ZoneRules};
pub use types::{VersionTag, ZoneId, ZoneOffset};
