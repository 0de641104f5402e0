//! Decoded zone rules
//!
//! [`ZoneRules`] is the value the registry resolves a zone identifier to.
//! Instances are only produced through validating constructors, so a value
//! of this type is always structurally complete.

pub mod transition;
pub mod zone_rules;

pub use transition::{OffsetTransition, TimeDefinition, TransitionRule};
pub use zone_rules::{ZoneRules, MAX_LAST_RULES};
