//! Single transitions and recurring transition rules

use crate::error::{CoreError, Result};
use crate::types::ZoneOffset;
use chrono::{Month, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// A discontinuity in the local time-line at a specific instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OffsetTransitionRaw")]
pub struct OffsetTransition {
    epoch_second: i64,
    offset_before: ZoneOffset,
    offset_after: ZoneOffset,
}

impl OffsetTransition {
    pub fn new(
        epoch_second: i64,
        offset_before: ZoneOffset,
        offset_after: ZoneOffset,
    ) -> Result<Self> {
        if offset_before == offset_after {
            return Err(CoreError::InvalidValue {
                field: "offset_after",
                message: "offsets must not be equal".to_string(),
            });
        }
        Ok(Self {
            epoch_second,
            offset_before,
            offset_after,
        })
    }

    pub fn epoch_second(&self) -> i64 {
        self.epoch_second
    }

    pub fn offset_before(&self) -> ZoneOffset {
        self.offset_before
    }

    pub fn offset_after(&self) -> ZoneOffset {
        self.offset_after
    }

    /// True when the clocks jump forward
    pub fn is_gap(&self) -> bool {
        self.offset_after > self.offset_before
    }
}

#[derive(Deserialize)]
struct OffsetTransitionRaw {
    epoch_second: i64,
    offset_before: ZoneOffset,
    offset_after: ZoneOffset,
}

impl TryFrom<OffsetTransitionRaw> for OffsetTransition {
    type Error = CoreError;

    fn try_from(raw: OffsetTransitionRaw) -> Result<Self> {
        Self::new(raw.epoch_second, raw.offset_before, raw.offset_after)
    }
}

/// How the local time of a [`TransitionRule`] is to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeDefinition {
    Utc,
    Wall,
    Standard,
}

impl TimeDefinition {
    /// Map the two-bit ordinal used by the binary encoding
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(TimeDefinition::Utc),
            1 => Some(TimeDefinition::Wall),
            2 => Some(TimeDefinition::Standard),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            TimeDefinition::Utc => 0,
            TimeDefinition::Wall => 1,
            TimeDefinition::Standard => 2,
        }
    }
}

/// A rule producing one transition per year, e.g. "last Sunday of March
/// at 01:00 UTC"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransitionRuleRaw")]
pub struct TransitionRule {
    month: Month,
    /// Day of month, or counted back from the month end when negative
    /// (-1 is the last day)
    day_of_month_indicator: i8,
    /// When set, the transition happens on the first such weekday on or
    /// after the indicated day (or on or before it for negative indicators)
    day_of_week: Option<Weekday>,
    local_time: NaiveTime,
    midnight_end_of_day: bool,
    time_definition: TimeDefinition,
    standard_offset: ZoneOffset,
    offset_before: ZoneOffset,
    offset_after: ZoneOffset,
}

impl TransitionRule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        month: Month,
        day_of_month_indicator: i8,
        day_of_week: Option<Weekday>,
        local_time: NaiveTime,
        midnight_end_of_day: bool,
        time_definition: TimeDefinition,
        standard_offset: ZoneOffset,
        offset_before: ZoneOffset,
        offset_after: ZoneOffset,
    ) -> Result<Self> {
        if !(-28..=31).contains(&day_of_month_indicator) || day_of_month_indicator == 0 {
            return Err(CoreError::InvalidValue {
                field: "day_of_month_indicator",
                message: format!(
                    "must be in -28..=31 excluding 0, got {}",
                    day_of_month_indicator
                ),
            });
        }
        if midnight_end_of_day && local_time.num_seconds_from_midnight() != 0 {
            return Err(CoreError::InvalidValue {
                field: "local_time",
                message: "time must be midnight when end-of-day flag is set".to_string(),
            });
        }
        if local_time.nanosecond() != 0 {
            return Err(CoreError::InvalidValue {
                field: "local_time",
                message: "time must not carry sub-second precision".to_string(),
            });
        }
        Ok(Self {
            month,
            day_of_month_indicator,
            day_of_week,
            local_time,
            midnight_end_of_day,
            time_definition,
            standard_offset,
            offset_before,
            offset_after,
        })
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn day_of_month_indicator(&self) -> i8 {
        self.day_of_month_indicator
    }

    pub fn day_of_week(&self) -> Option<Weekday> {
        self.day_of_week
    }

    pub fn local_time(&self) -> NaiveTime {
        self.local_time
    }

    pub fn is_midnight_end_of_day(&self) -> bool {
        self.midnight_end_of_day
    }

    pub fn time_definition(&self) -> TimeDefinition {
        self.time_definition
    }

    pub fn standard_offset(&self) -> ZoneOffset {
        self.standard_offset
    }

    pub fn offset_before(&self) -> ZoneOffset {
        self.offset_before
    }

    pub fn offset_after(&self) -> ZoneOffset {
        self.offset_after
    }
}

#[derive(Deserialize)]
struct TransitionRuleRaw {
    month: Month,
    day_of_month_indicator: i8,
    day_of_week: Option<Weekday>,
    local_time: NaiveTime,
    midnight_end_of_day: bool,
    time_definition: TimeDefinition,
    standard_offset: ZoneOffset,
    offset_before: ZoneOffset,
    offset_after: ZoneOffset,
}

impl TryFrom<TransitionRuleRaw> for TransitionRule {
    type Error = CoreError;

    fn try_from(raw: TransitionRuleRaw) -> Result<Self> {
        Self::new(
            raw.month,
            raw.day_of_month_indicator,
            raw.day_of_week,
            raw.local_time,
            raw.midnight_end_of_day,
            raw.time_definition,
            raw.standard_offset,
            raw.offset_before,
            raw.offset_after,
        )
    }
}
