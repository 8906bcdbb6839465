//! # Session Trace
//!
//! Session segmentation and neural data preparation for location check-in logs.
//!
//! This library provides:
//! - Loaders for Gowalla-style and Foursquare-style check-in dumps
//! - User and location filtering by activity thresholds
//! - Gap- and length-bounded session segmentation
//! - Insertion-ordered dense dictionaries for users and locations
//! - Chronological train/test splits with mobility statistics
//!   (spatial entropy, radius of gyration, location novelty)
//! - JSON persistence of the assembled dataset
//!
//! ## Features
//!
//! - **`parallel`** - Run per-user work with rayon
//! - **`synthetic`** - Seeded synthetic check-in generator for tests and benches
//! - **`cli`** - Build the `sessiontrace-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use sessiontrace::{CheckinRecord, CoordinateTable, Pipeline, PipelineConfig, RawTraces, TraceOrder};
//! use chrono::NaiveDate;
//!
//! let at = |day: u32, hour: u32| {
//!     NaiveDate::from_ymd_opt(2010, 6, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
//! };
//! let records = vec![
//!     CheckinRecord::new("u1", "cafe", at(1, 9)),
//!     CheckinRecord::new("u1", "office", at(1, 10)),
//!     CheckinRecord::new("u1", "cafe", at(8, 9)),
//!     CheckinRecord::new("u1", "gym", at(8, 11)),
//! ];
//! let traces = RawTraces::from_records(records, TraceOrder::Unordered);
//!
//! let mut coordinates = CoordinateTable::new();
//! coordinates.insert("cafe", sessiontrace::LonLat::new(13.40, 52.52));
//! coordinates.insert("office", sessiontrace::LonLat::new(13.41, 52.53));
//! coordinates.insert("gym", sessiontrace::LonLat::new(13.42, 52.51));
//!
//! let config = PipelineConfig { min_checkins: 2, ..PipelineConfig::gowalla() };
//! let pipeline = Pipeline::new(config).unwrap();
//! let (dataset, report) = pipeline.run(&traces, &coordinates).unwrap();
//!
//! assert_eq!(dataset.data_neural.len(), 1);
//! assert_eq!(report.final_users, 1);
//! ```

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, PipelineError, Result};

// Run configuration and dataset variants
pub mod config;
pub use config::{DatasetVariant, PipelineConfig};

// Raw trace parsing for the two input formats
pub mod loader;
pub use loader::{load_foursquare, load_gowalla, LoadReport, FOURSQUARE_DELIMITER};

// User and location admission
pub mod filter;
pub use filter::{filter_users, AdmittedUser, FilterOutcome, PERSONAL_FREQUENT_MIN_VISITS};

// Gap/length bounded session segmentation
pub mod segment;
pub use segment::{
    filter_short_sessions, segment_visits, SegmentDecision, SegmentPolicy, Sessions,
};

// Insertion-ordered dense id dictionaries
pub mod dictionary;
pub use dictionary::{
    build_dictionaries, DenseDictionary, Dictionaries, UNKNOWN_LOCATION, UNKNOWN_LOCATION_ID,
};

// Weekly time slot encodings
pub mod timeslot;
pub use timeslot::TimeSlotEncoding;

// Chronological train/test split
pub mod split;
pub use split::{split_sessions, TrainTestSplit};

// Geographic helpers (centroid, RMS distance)
pub mod geo_utils;

// Per-user mobility statistics
pub mod stats;
pub use stats::UserStatistics;

// Final nested dataset structure and persistence
pub mod dataset;
pub use dataset::{Dataset, FilteredUserData, UserRecord};

// End-to-end driver
pub mod pipeline;
pub use pipeline::{Pipeline, PipelineReport, SegmentedUser};

// Synthetic check-in generator (stress tests, benches)
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate stored as longitude/latitude degrees.
///
/// # Example
/// ```
/// use sessiontrace::LonLat;
/// let point = LonLat::new(-0.1278, 51.5074); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check if the coordinate is finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lon >= -180.0
            && self.lon <= 180.0
    }

    /// `[lon, lat]` pair, the layout used by the location lookup table.
    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// A single check-in of a user at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Raw location token as it appears in the source file
    pub location: String,
    /// Check-in time in the source's own (unnormalized) clock
    pub timestamp: NaiveDateTime,
}

impl Visit {
    pub fn new(location: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            location: location.into(),
            timestamp,
        }
    }
}

/// One parsed line of a raw check-in dump.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinRecord {
    pub user: String,
    pub location: String,
    pub timestamp: NaiveDateTime,
    pub coordinate: Option<LonLat>,
}

impl CheckinRecord {
    /// Create a record without a coordinate.
    pub fn new(user: impl Into<String>, location: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            user: user.into(),
            location: location.into(),
            timestamp,
            coordinate: None,
        }
    }

    /// Create a record carrying the location's coordinate.
    pub fn with_coordinate(
        user: impl Into<String>,
        location: impl Into<String>,
        timestamp: NaiveDateTime,
        coordinate: LonLat,
    ) -> Self {
        Self {
            coordinate: Some(coordinate),
            ..Self::new(user, location, timestamp)
        }
    }
}

/// How records of one user are ordered in the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOrder {
    /// Newest check-in first (Gowalla dumps). Reversed once after grouping.
    NewestFirst,
    /// No guaranteed order. Stable-sorted by timestamp after grouping.
    Unordered,
}

/// All visits of one user, ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTrace {
    pub user: String,
    pub visits: Vec<Visit>,
}

/// Per-user traces in order of first appearance in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTraces {
    pub users: Vec<UserTrace>,
}

impl RawTraces {
    /// Group records by user and normalize each trace to ascending time.
    pub fn from_records(records: impl IntoIterator<Item = CheckinRecord>, order: TraceOrder) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut users: Vec<UserTrace> = Vec::new();

        for record in records {
            let slot = match index.get(&record.user) {
                Some(&i) => i,
                None => {
                    index.insert(record.user.clone(), users.len());
                    users.push(UserTrace {
                        user: record.user.clone(),
                        visits: Vec::new(),
                    });
                    users.len() - 1
                }
            };
            users[slot]
                .visits
                .push(Visit::new(record.location, record.timestamp));
        }

        for trace in &mut users {
            match order {
                TraceOrder::NewestFirst => trace.visits.reverse(),
                TraceOrder::Unordered => trace.visits.sort_by_key(|v| v.timestamp),
            }
        }

        Self { users }
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Total number of visits across all users.
    pub fn total_visits(&self) -> usize {
        self.users.iter().map(|t| t.visits.len()).sum()
    }

    /// Number of distinct raw location tokens.
    pub fn distinct_locations(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for trace in &self.users {
            for visit in &trace.visits {
                seen.insert(visit.location.as_str());
            }
        }
        seen.len()
    }

    /// Find a user's trace by raw token.
    pub fn get(&self, user: &str) -> Option<&UserTrace> {
        self.users.iter().find(|t| t.user == user)
    }
}

/// Lookup from raw location token to its coordinate.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    coords: HashMap<String, LonLat>,
}

impl CoordinateTable {
    pub fn new() -> Self {
        Self {
            coords: HashMap::new(),
        }
    }

    /// Insert or overwrite a location's coordinate. Later entries win.
    pub fn insert(&mut self, location: impl Into<String>, coordinate: LonLat) {
        self.coords.insert(location.into(), coordinate);
    }

    /// Build a table from every record that carries a coordinate.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CheckinRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            if let Some(coordinate) = record.coordinate {
                table.insert(record.location.clone(), coordinate);
            }
        }
        table
    }

    pub fn get(&self, location: &str) -> Option<LonLat> {
        self.coords.get(location).copied()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.coords.contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}
