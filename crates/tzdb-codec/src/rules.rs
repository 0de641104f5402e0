//! Rule object deserializers
//!
//! A zone file's payload is handed to a [`RulesDeserializer`] after the
//! header has been validated. The deserializer must produce a complete
//! [`ZoneRules`] value or fail; it never returns a partial result.

use tzdb_core::ZoneRules;

use crate::error::PayloadError;
use crate::reader::DataReader;
use crate::ser;

/// Turns the payload of a zone file into rules
///
/// Implementations must be pure: the same bytes always yield equal rules.
pub trait RulesDeserializer: Send + Sync {
    fn deserialize(&self, input: &mut DataReader<'_>) -> Result<ZoneRules, PayloadError>;
}

/// The compiled TZDB rule layout, written without a type byte
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRules;

impl RulesDeserializer for StandardRules {
    fn deserialize(&self, input: &mut DataReader<'_>) -> Result<ZoneRules, PayloadError> {
        ser::read_zone_rules(input)
    }
}

/// Rules behind a type byte, as stored in the combined archive.
///
/// Any object other than a rule set is rejected with
/// [`PayloadError::UnexpectedObject`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TypedRules;

impl RulesDeserializer for TypedRules {
    fn deserialize(&self, input: &mut DataReader<'_>) -> Result<ZoneRules, PayloadError> {
        ser::read_object(input)?.into_zone_rules()
    }
}

impl<F> RulesDeserializer for F
where
    F: Fn(&mut DataReader<'_>) -> Result<ZoneRules, PayloadError> + Send + Sync,
{
    fn deserialize(&self, input: &mut DataReader<'_>) -> Result<ZoneRules, PayloadError> {
        self(input)
    }
}
