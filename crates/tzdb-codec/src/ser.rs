//! Compact encodings of the compiled TZDB form
//!
//! Epoch seconds, offsets and transition rules are written in a packed form
//! that favours quarter-hour aligned values; anything else falls back to a
//! full-width trailer. Objects stored in the combined archive are prefixed
//! with a one-byte type tag, see [`read_object`].

use chrono::{Month, NaiveTime, Weekday};
use tzdb_core::{
    CoreError, OffsetTransition, TimeDefinition, TransitionRule, ZoneOffset, ZoneRules,
};

use crate::error::PayloadError;
use crate::reader::DataReader;

type Result<T> = std::result::Result<T, PayloadError>;

/// Type byte for a full rule set
pub const TYPE_ZONE_RULES: u8 = 1;
/// Type byte for a single offset transition
pub const TYPE_OFFSET_TRANSITION: u8 = 2;
/// Type byte for a recurring transition rule
pub const TYPE_TRANSITION_RULE: u8 = 3;

/// Seconds between the compact epoch origin (year 1825) and 1970
pub(crate) const EPOCH_SECOND_BASE: i64 = 4_575_744_000;

/// High byte marking a full 64-bit epoch second
pub(crate) const LONG_EPOCH_MARKER: u8 = 255;

/// Offset byte marking a full 32-bit offset
pub(crate) const LONG_OFFSET_MARKER: i8 = 127;

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// An object read through the typed envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedObject {
    ZoneRules(ZoneRules),
    OffsetTransition(OffsetTransition),
    TransitionRule(TransitionRule),
}

impl SerializedObject {
    pub fn kind(&self) -> &'static str {
        match self {
            SerializedObject::ZoneRules(_) => "zone rules",
            SerializedObject::OffsetTransition(_) => "offset transition",
            SerializedObject::TransitionRule(_) => "transition rule",
        }
    }

    /// Unwrap a rule set, rejecting any other object type
    pub fn into_zone_rules(self) -> Result<ZoneRules> {
        match self {
            SerializedObject::ZoneRules(rules) => Ok(rules),
            other => Err(PayloadError::UnexpectedObject {
                expected: "zone rules",
                found: other.kind(),
            }),
        }
    }
}

/// Read a type byte followed by the matching object
pub fn read_object(reader: &mut DataReader<'_>) -> Result<SerializedObject> {
    match reader.read_u8()? {
        TYPE_ZONE_RULES => read_zone_rules(reader).map(SerializedObject::ZoneRules),
        TYPE_OFFSET_TRANSITION => {
            read_offset_transition(reader).map(SerializedObject::OffsetTransition)
        }
        TYPE_TRANSITION_RULE => read_transition_rule(reader).map(SerializedObject::TransitionRule),
        other => Err(PayloadError::UnknownObjectType(other)),
    }
}

/// Read an untyped rule set
pub fn read_zone_rules(reader: &mut DataReader<'_>) -> Result<ZoneRules> {
    let standard_count = reader.read_count_i32("standard transition")?;
    let standard_transitions = read_epoch_seconds(reader, standard_count)?;
    let standard_offsets = read_offsets(reader, standard_count + 1)?;

    let savings_count = reader.read_count_i32("savings transition")?;
    let savings_transitions = read_epoch_seconds(reader, savings_count)?;
    let wall_offsets = read_offsets(reader, savings_count + 1)?;

    let rule_count = reader.read_count_i8("transition rule")?;
    let last_rules = (0..rule_count)
        .map(|_| read_transition_rule(reader))
        .collect::<Result<Vec<_>>>()?;

    Ok(ZoneRules::new(
        standard_transitions,
        standard_offsets,
        savings_transitions,
        wall_offsets,
        last_rules,
    )?)
}

pub fn read_offset_transition(reader: &mut DataReader<'_>) -> Result<OffsetTransition> {
    let epoch_second = read_epoch_second(reader)?;
    let before = read_offset(reader)?;
    let after = read_offset(reader)?;
    Ok(OffsetTransition::new(epoch_second, before, after)?)
}

/// Read a packed transition rule.
///
/// The leading `i32` packs, from the high bits down: month (4), day of
/// month + 32 (6), ISO weekday or 0 (3), hour or 24/31 (5), time
/// definition (2), standard offset in quarter hours + 128 or 255 (8), and
/// the before/after savings in half hours or 3 (2 + 2). Saturated fields
/// are followed by an `i32` trailer in that same order.
pub fn read_transition_rule(reader: &mut DataReader<'_>) -> Result<TransitionRule> {
    let data = reader.read_i32()? as u32;

    let month_number = (data >> 28) as usize;
    let month = month_number
        .checked_sub(1)
        .and_then(|index| MONTHS.get(index))
        .copied()
        .ok_or_else(|| invalid("month", format!("{} is not a month", month_number)))?;

    let day_of_month_indicator = ((data >> 22) & 63) as i8 - 32;

    let weekday_number = ((data >> 19) & 7) as usize;
    let day_of_week = match weekday_number {
        0 => None,
        n => Some(WEEKDAYS[n - 1]),
    };

    let time_byte = (data >> 14) & 31;
    let definition_ordinal = ((data >> 12) & 3) as u8;
    let time_definition = TimeDefinition::from_ordinal(definition_ordinal).ok_or_else(|| {
        invalid(
            "time_definition",
            format!("{} is not a time definition", definition_ordinal),
        )
    })?;
    let standard_byte = (data >> 4) & 255;
    let before_byte = (data >> 2) & 3;
    let after_byte = data & 3;

    let seconds_of_day = if time_byte == 31 {
        let seconds = reader.read_i32()?;
        u32::try_from(seconds)
            .ok()
            .filter(|s| *s < 86_400)
            .ok_or_else(|| invalid("local_time", format!("{} is not a second of day", seconds)))?
    } else {
        (time_byte % 24) * 3600
    };
    let local_time = NaiveTime::from_num_seconds_from_midnight_opt(seconds_of_day, 0)
        .ok_or_else(|| invalid("local_time", format!("{} is not a second of day", seconds_of_day)))?;

    let standard_offset = if standard_byte == 255 {
        ZoneOffset::from_total_seconds(reader.read_i32()?)?
    } else {
        ZoneOffset::from_quarter_hours(standard_byte as i32 - 128)?
    };
    let offset_before = read_savings_offset(reader, before_byte, standard_offset)?;
    let offset_after = read_savings_offset(reader, after_byte, standard_offset)?;

    Ok(TransitionRule::new(
        month,
        day_of_month_indicator,
        day_of_week,
        local_time,
        time_byte == 24,
        time_definition,
        standard_offset,
        offset_before,
        offset_after,
    )?)
}

/// Read an epoch second: three bytes of quarter hours since 1825, or the
/// marker byte 255 followed by an `i64`
pub fn read_epoch_second(reader: &mut DataReader<'_>) -> Result<i64> {
    let hi = reader.read_u8()?;
    if hi == LONG_EPOCH_MARKER {
        return reader.read_i64();
    }
    let mid = reader.read_u8()?;
    let lo = reader.read_u8()?;
    let quarters = (i64::from(hi) << 16) | (i64::from(mid) << 8) | i64::from(lo);
    Ok(quarters * 900 - EPOCH_SECOND_BASE)
}

/// Read an offset: a signed byte of quarter hours, or the marker 127
/// followed by an `i32` of seconds
pub fn read_offset(reader: &mut DataReader<'_>) -> Result<ZoneOffset> {
    let quarters = reader.read_i8()?;
    if quarters == LONG_OFFSET_MARKER {
        return Ok(ZoneOffset::from_total_seconds(reader.read_i32()?)?);
    }
    Ok(ZoneOffset::from_quarter_hours(i32::from(quarters))?)
}

fn read_epoch_seconds(reader: &mut DataReader<'_>, count: usize) -> Result<Vec<i64>> {
    // Each value takes at least three bytes
    let mut values = Vec::with_capacity(count.min(reader.remaining() / 3));
    for _ in 0..count {
        values.push(read_epoch_second(reader)?);
    }
    Ok(values)
}

fn read_offsets(reader: &mut DataReader<'_>, count: usize) -> Result<Vec<ZoneOffset>> {
    let mut values = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        values.push(read_offset(reader)?);
    }
    Ok(values)
}

fn read_savings_offset(
    reader: &mut DataReader<'_>,
    half_hours: u32,
    standard: ZoneOffset,
) -> Result<ZoneOffset> {
    let seconds = if half_hours == 3 {
        reader.read_i32()?
    } else {
        standard.total_seconds() + half_hours as i32 * 1800
    };
    Ok(ZoneOffset::from_total_seconds(seconds)?)
}

fn invalid(field: &'static str, message: String) -> PayloadError {
    PayloadError::InvalidRules(CoreError::InvalidValue { field, message })
}
