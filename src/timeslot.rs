//! Weekly time slot encodings for check-in timestamps.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Encoding of a timestamp into a discrete slot of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlotEncoding {
    /// `weekday * 24 + hour`, Monday = 0. Slots 0..168.
    Week168,
    /// `hour` on weekdays, `hour + 24` on weekends. Slots 0..48.
    #[default]
    Weekday48,
}

impl TimeSlotEncoding {
    pub fn encode(&self, timestamp: &NaiveDateTime) -> u32 {
        match self {
            TimeSlotEncoding::Week168 => slot_168(timestamp),
            TimeSlotEncoding::Weekday48 => slot_48(timestamp),
        }
    }

    /// Number of distinct slots.
    pub fn slot_count(&self) -> u32 {
        match self {
            TimeSlotEncoding::Week168 => 168,
            TimeSlotEncoding::Weekday48 => 48,
        }
    }
}

pub fn slot_168(timestamp: &NaiveDateTime) -> u32 {
    timestamp.weekday().num_days_from_monday() * 24 + timestamp.hour()
}

pub fn slot_48(timestamp: &NaiveDateTime) -> u32 {
    if timestamp.weekday().num_days_from_monday() < 5 {
        timestamp.hour()
    } else {
        timestamp.hour() + 24
    }
}
