//! UTC offsets

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest magnitude an offset may have, in seconds (18 hours)
pub const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

/// Seconds in one quarter hour, the unit of the compact offset encoding
pub const QUARTER_HOUR_SECONDS: i32 = 900;

/// A fixed amount of time ahead of (positive) or behind (negative) UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct ZoneOffset {
    total_seconds: i32,
}

impl ZoneOffset {
    pub const UTC: ZoneOffset = ZoneOffset { total_seconds: 0 };

    /// Create an offset, rejecting anything outside -18:00..=+18:00
    pub fn from_total_seconds(total_seconds: i32) -> Result<Self> {
        if !(-MAX_OFFSET_SECONDS..=MAX_OFFSET_SECONDS).contains(&total_seconds) {
            return Err(CoreError::InvalidOffset {
                seconds: total_seconds,
            });
        }
        Ok(Self { total_seconds })
    }

    /// Create an offset from a count of quarter hours
    pub fn from_quarter_hours(quarters: i32) -> Result<Self> {
        let seconds = quarters
            .checked_mul(QUARTER_HOUR_SECONDS)
            .ok_or(CoreError::InvalidOffset { seconds: i32::MAX })?;
        Self::from_total_seconds(seconds)
    }

    pub fn total_seconds(&self) -> i32 {
        self.total_seconds
    }
}

impl TryFrom<i32> for ZoneOffset {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self> {
        Self::from_total_seconds(value)
    }
}

impl From<ZoneOffset> for i32 {
    fn from(offset: ZoneOffset) -> Self {
        offset.total_seconds
    }
}

impl fmt::Display for ZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_seconds == 0 {
            return f.write_str("Z");
        }
        let sign = if self.total_seconds < 0 { '-' } else { '+' };
        let abs = self.total_seconds.unsigned_abs();
        let (hours, minutes, seconds) = (abs / 3600, (abs / 60) % 60, abs % 60);
        if seconds == 0 {
            write!(f, "{}{:02}:{:02}", sign, hours, minutes)
        } else {
            write!(f, "{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
        }
    }
}
