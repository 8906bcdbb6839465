//! Run configuration for the session pipeline.
//!
//! The two dataset variants share one configuration struct. Fields that only
//! apply to one variant are ignored by the other:
//!
//! | field               | Gowalla (A)        | Foursquare (B)           |
//! |---------------------|--------------------|--------------------------|
//! | `min_checkins`      | users, inclusive   | -                        |
//! | `trace_len_min`     | -                  | users, exclusive         |
//! | `global_visit_min`  | -                  | locations, exclusive     |
//! | `min_gap`           | `None`             | minutes, drop below      |

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::segment::SegmentPolicy;
use crate::timeslot::TimeSlotEncoding;

/// Source dataset flavour. Selects the filter rules and extra output blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetVariant {
    /// Tab-delimited dumps, newest first, user threshold only.
    Gowalla,
    /// Delimited tweet dumps with user, location and min-gap filtering.
    Foursquare,
}

/// Configuration for a pipeline run.
///
/// Embedded verbatim as `parameters` in the persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub variant: DatasetVariant,

    /// Minimum check-ins per user, inclusive (Gowalla).
    /// Default: 101
    pub min_checkins: usize,

    /// Users need strictly more check-ins than this (Foursquare).
    /// Default: 10
    pub trace_len_min: usize,

    /// Locations need strictly more global visits than this (Foursquare).
    /// Default: 10
    pub location_global_visit_min: usize,

    /// Gap in hours above which a new session starts.
    /// Default: 72
    pub hour_gap: u32,

    /// Gap in minutes at or below which a check-in is dropped (Foursquare only).
    /// Default: None (Gowalla), Some(10) (Foursquare)
    pub min_gap: Option<u32>,

    /// A session holding more than this many visits is closed.
    /// Default: 10
    pub session_max: usize,

    /// Sessions with fewer visits are discarded.
    /// Default: 2 (Gowalla), 5 (Foursquare)
    #[serde(rename = "filter_short_session")]
    pub session_min: usize,

    /// Users with fewer surviving sessions are excluded. Must be at least 1.
    /// Default: 1 (Gowalla), 5 (Foursquare)
    #[serde(rename = "sessions_min")]
    pub sessions_count_min: usize,

    /// Fraction of each user's sessions used for training.
    /// Default: 0.8
    pub train_split: f64,

    /// Maximum number of admitted users, 0 = unbounded.
    pub max_users: usize,

    /// Time slot encoding written into session tuples.
    pub time_encoding: TimeSlotEncoding,

    /// Abort on the first per-user statistics error instead of excluding the user.
    pub strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::gowalla()
    }
}

impl PipelineConfig {
    /// Gowalla-style preset.
    pub fn gowalla() -> Self {
        Self {
            variant: DatasetVariant::Gowalla,
            min_checkins: 101,
            trace_len_min: 10,
            location_global_visit_min: 10,
            hour_gap: 72,
            min_gap: None,
            session_max: 10,
            session_min: 2,
            sessions_count_min: 1,
            train_split: 0.8,
            max_users: 0,
            time_encoding: TimeSlotEncoding::Weekday48,
            strict: false,
        }
    }

    /// Foursquare-style preset.
    pub fn foursquare() -> Self {
        Self {
            variant: DatasetVariant::Foursquare,
            min_gap: Some(10),
            session_min: 5,
            sessions_count_min: 5,
            ..Self::gowalla()
        }
    }

    /// Preset for a variant.
    pub fn for_variant(variant: DatasetVariant) -> Self {
        match variant {
            DatasetVariant::Gowalla => Self::gowalla(),
            DatasetVariant::Foursquare => Self::foursquare(),
        }
    }

    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields fall back to the Gowalla preset.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Segmentation policy derived from this configuration.
    ///
    /// The min-gap drop rule only exists for the Foursquare variant.
    pub fn segment_policy(&self) -> SegmentPolicy {
        SegmentPolicy {
            hour_gap: self.hour_gap,
            min_gap: match self.variant {
                DatasetVariant::Gowalla => None,
                DatasetVariant::Foursquare => self.min_gap,
            },
            session_max: self.session_max,
        }
    }

    /// Whether the raw filtered data and coordinate lookup are persisted.
    pub fn includes_extras(&self) -> bool {
        self.variant == DatasetVariant::Foursquare
    }

    /// Check value ranges before any processing starts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.train_split) {
            return Err(PipelineError::invalid_config(
                "train_split",
                format!("must be within [0, 1], got {}", self.train_split),
            ));
        }
        if self.hour_gap == 0 {
            return Err(PipelineError::invalid_config("hour_gap", "must be positive"));
        }
        if self.session_max == 0 {
            return Err(PipelineError::invalid_config("session_max", "must be positive"));
        }
        if self.session_min == 0 {
            return Err(PipelineError::invalid_config(
                "filter_short_session",
                "must be positive",
            ));
        }
        if self.sessions_count_min == 0 {
            return Err(PipelineError::invalid_config("sessions_min", "must be positive"));
        }
        if self.min_gap == Some(0) {
            return Err(PipelineError::invalid_config(
                "min_gap",
                "must be positive when set",
            ));
        }
        if self.variant == DatasetVariant::Gowalla && self.min_checkins == 0 {
            return Err(PipelineError::invalid_config("min_checkins", "must be positive"));
        }
        Ok(())
    }
}
