//! Test fixtures: an encoder for the compiled form and sample rule sets
//!
//! Enabled by the `testing` feature so downstream crates can build zone
//! files and archives in their own tests.

use bytes::BufMut;
use chrono::{Month, NaiveTime, Timelike, Weekday};
use tzdb_core::{OffsetTransition, TimeDefinition, TransitionRule, ZoneOffset, ZoneRules};

use crate::archive::ARCHIVE_TAG;
use crate::ser::{
    EPOCH_SECOND_BASE, LONG_EPOCH_MARKER, LONG_OFFSET_MARKER, TYPE_OFFSET_TRANSITION,
    TYPE_ZONE_RULES,
};
use crate::zone_file::{FORMAT_MARKER, ZONE_FILE_TAG};

/// Last epoch second that still fits the three-byte form
const COMPACT_EPOCH_LIMIT: i64 = 10_413_792_000;

// ============================================================================
// Sample rules
// ============================================================================

fn offset(seconds: i32) -> ZoneOffset {
    ZoneOffset::from_total_seconds(seconds).unwrap()
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// `Etc/UTC`
pub fn utc() -> ZoneRules {
    ZoneRules::fixed(ZoneOffset::UTC)
}

/// A fixed offset zone
pub fn fixed(seconds: i32) -> ZoneRules {
    ZoneRules::fixed(offset(seconds))
}

/// Trimmed-down `America/New_York`: LMT, a 1918 DST season and the
/// current US rules
pub fn new_york() -> ZoneRules {
    let est = offset(-18_000);
    let edt = offset(-14_400);
    let lmt = offset(-17_762);

    let spring = TransitionRule::new(
        Month::March,
        8,
        Some(Weekday::Sun),
        hm(2, 0),
        false,
        TimeDefinition::Wall,
        est,
        est,
        edt,
    )
    .unwrap();
    let autumn = TransitionRule::new(
        Month::November,
        1,
        Some(Weekday::Sun),
        hm(2, 0),
        false,
        TimeDefinition::Wall,
        est,
        edt,
        est,
    )
    .unwrap();

    ZoneRules::new(
        vec![-2_717_650_800],
        vec![lmt, est],
        vec![
            -2_717_650_800,
            -1_633_280_400,
            -1_615_140_000,
            1_615_705_200,
            1_636_264_800,
        ],
        vec![lmt, est, edt, est, edt, est],
        vec![spring, autumn],
    )
    .unwrap()
}

/// Rules whose values all need the long trailers: an unaligned epoch
/// second, an odd local time, a non quarter-hour standard offset and a
/// 45 minute saving
pub fn irregular() -> ZoneRules {
    let standard = offset(20_678);
    let summer = offset(20_678 + 2_700);

    let rule = TransitionRule::new(
        Month::October,
        -1,
        Some(Weekday::Fri),
        hm(2, 30),
        false,
        TimeDefinition::Standard,
        standard,
        standard,
        summer,
    )
    .unwrap();
    let end_of_day = TransitionRule::new(
        Month::April,
        15,
        None,
        hm(0, 0),
        true,
        TimeDefinition::Utc,
        standard,
        summer,
        standard,
    )
    .unwrap();

    ZoneRules::new(
        vec![-1_000_000_001],
        vec![offset(19_800), standard],
        vec![-1_000_000_001, 12_345_678_901],
        vec![offset(19_800), standard, summer],
        vec![rule, end_of_day],
    )
    .unwrap()
}

// ============================================================================
// Encoder
// ============================================================================

pub fn put_utf(buf: &mut Vec<u8>, value: &str) {
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

/// An `i16` count followed by the strings
pub fn put_utf_list(buf: &mut Vec<u8>, values: &[&str]) {
    buf.put_i16(values.len() as i16);
    for value in values {
        put_utf(buf, value);
    }
}

pub fn put_epoch_second(buf: &mut Vec<u8>, epoch_second: i64) {
    if (-EPOCH_SECOND_BASE..COMPACT_EPOCH_LIMIT).contains(&epoch_second)
        && epoch_second % 900 == 0
    {
        let quarters = (epoch_second + EPOCH_SECOND_BASE) / 900;
        buf.put_u8((quarters >> 16) as u8);
        buf.put_u8((quarters >> 8) as u8);
        buf.put_u8(quarters as u8);
    } else {
        buf.put_u8(LONG_EPOCH_MARKER);
        buf.put_i64(epoch_second);
    }
}

pub fn put_offset(buf: &mut Vec<u8>, offset: ZoneOffset) {
    let seconds = offset.total_seconds();
    if seconds % 900 == 0 {
        buf.put_i8((seconds / 900) as i8);
    } else {
        buf.put_i8(LONG_OFFSET_MARKER);
        buf.put_i32(seconds);
    }
}

pub fn put_transition_rule(buf: &mut Vec<u8>, rule: &TransitionRule) {
    let seconds_of_day = if rule.is_midnight_end_of_day() {
        86_400
    } else {
        rule.local_time().num_seconds_from_midnight()
    };
    let standard = rule.standard_offset().total_seconds();
    let before_diff = rule.offset_before().total_seconds() - standard;
    let after_diff = rule.offset_after().total_seconds() - standard;

    let time_byte = if seconds_of_day % 3600 == 0 {
        if rule.is_midnight_end_of_day() {
            24
        } else {
            rule.local_time().hour()
        }
    } else {
        31
    };
    let standard_byte = if standard % 900 == 0 {
        (standard / 900 + 128) as u32
    } else {
        255
    };
    let savings_byte = |diff: i32| match diff {
        0 | 1800 | 3600 => (diff / 1800) as u32,
        _ => 3,
    };
    let before_byte = savings_byte(before_diff);
    let after_byte = savings_byte(after_diff);
    let weekday = rule
        .day_of_week()
        .map_or(0, |day| day.number_from_monday());

    let packed = (rule.month().number_from_month() << 28)
        | (((rule.day_of_month_indicator() as i32 + 32) as u32) << 22)
        | (weekday << 19)
        | (time_byte << 14)
        | (u32::from(rule.time_definition().ordinal()) << 12)
        | (standard_byte << 4)
        | (before_byte << 2)
        | after_byte;
    buf.put_u32(packed);

    if time_byte == 31 {
        buf.put_i32(seconds_of_day as i32);
    }
    if standard_byte == 255 {
        buf.put_i32(standard);
    }
    if before_byte == 3 {
        buf.put_i32(rule.offset_before().total_seconds());
    }
    if after_byte == 3 {
        buf.put_i32(rule.offset_after().total_seconds());
    }
}

/// Untyped rule set as found after a zone file header
pub fn put_zone_rules(buf: &mut Vec<u8>, rules: &ZoneRules) {
    buf.put_i32(rules.standard_transitions().len() as i32);
    for &epoch_second in rules.standard_transitions() {
        put_epoch_second(buf, epoch_second);
    }
    for &offset in rules.standard_offsets() {
        put_offset(buf, offset);
    }

    buf.put_i32(rules.savings_transitions().len() as i32);
    for &epoch_second in rules.savings_transitions() {
        put_epoch_second(buf, epoch_second);
    }
    for &offset in rules.wall_offsets() {
        put_offset(buf, offset);
    }

    buf.put_i8(rules.last_rules().len() as i8);
    for rule in rules.last_rules() {
        put_transition_rule(buf, rule);
    }
}

pub fn encode_transition_rule(rule: &TransitionRule) -> Vec<u8> {
    let mut buf = Vec::new();
    put_transition_rule(&mut buf, rule);
    buf
}

/// Offset transition behind its type byte
pub fn encode_offset_transition_object(transition: &OffsetTransition) -> Vec<u8> {
    let mut buf = vec![TYPE_OFFSET_TRANSITION];
    put_epoch_second(&mut buf, transition.epoch_second());
    put_offset(&mut buf, transition.offset_before());
    put_offset(&mut buf, transition.offset_after());
    buf
}

/// Rule set behind its type byte, as stored in the archive
pub fn zone_rules_object(rules: &ZoneRules) -> Vec<u8> {
    let mut buf = vec![TYPE_ZONE_RULES];
    put_zone_rules(&mut buf, rules);
    buf
}

// ============================================================================
// Files
// ============================================================================

pub fn header(marker: u8, tag: &str) -> Vec<u8> {
    let mut buf = vec![marker];
    put_utf(&mut buf, tag);
    buf
}

/// A valid single-zone file
pub fn zone_file(rules: &ZoneRules) -> Vec<u8> {
    zone_file_with_header(FORMAT_MARKER, ZONE_FILE_TAG, rules)
}

pub fn zone_file_with_header(marker: u8, tag: &str, rules: &ZoneRules) -> Vec<u8> {
    let mut buf = header(marker, tag);
    put_zone_rules(&mut buf, rules);
    buf
}

/// A combined archive. Identical rule sets share one blob and every
/// version carries the same links.
pub fn archive(versions: &[&str], zones: &[(&str, &ZoneRules)]) -> Vec<u8> {
    let mut blobs: Vec<Vec<u8>> = Vec::new();
    let mut links = Vec::with_capacity(zones.len());
    for (region_index, (_, rules)) in zones.iter().enumerate() {
        let blob = zone_rules_object(rules);
        let rule_index = match blobs.iter().position(|existing| *existing == blob) {
            Some(index) => index,
            None => {
                blobs.push(blob);
                blobs.len() - 1
            }
        };
        links.push((region_index as i16, rule_index as u16));
    }

    let mut buf = header(FORMAT_MARKER, ARCHIVE_TAG);
    put_utf_list(&mut buf, versions);
    let region_ids: Vec<&str> = zones.iter().map(|(id, _)| *id).collect();
    put_utf_list(&mut buf, &region_ids);

    buf.put_i16(blobs.len() as i16);
    for blob in &blobs {
        buf.put_i16(blob.len() as i16);
        buf.put_slice(blob);
    }

    for _ in versions {
        buf.put_i16(links.len() as i16);
        for &(region_index, rule_index) in &links {
            buf.put_i16(region_index);
            buf.put_u16(rule_index);
        }
    }
    buf
}
