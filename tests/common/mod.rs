//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sessiontrace::{CheckinRecord, CoordinateTable, LonLat, Visit};

/// Monday 2010-06-07 00:00, the reference clock of the tests.
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2010, 6, 7)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// `hours` after [`epoch`].
pub fn at_hours(hours: i64) -> NaiveDateTime {
    epoch() + Duration::hours(hours)
}

/// `minutes` after [`epoch`].
pub fn at_minutes(minutes: i64) -> NaiveDateTime {
    epoch() + Duration::minutes(minutes)
}

/// Visits at the given hour offsets, all at `location`.
pub fn visits_at_hours(location: &str, hours: &[i64]) -> Vec<Visit> {
    hours.iter().map(|h| Visit::new(location, at_hours(*h))).collect()
}

/// Record at an hour offset.
pub fn record(user: &str, location: &str, hours: i64) -> CheckinRecord {
    CheckinRecord::new(user, location, at_hours(hours))
}

/// Coordinate table placing `loc_i` at (i, i) for each given token.
pub fn grid_coordinates(locations: &[&str]) -> CoordinateTable {
    let mut table = CoordinateTable::new();
    for (i, location) in locations.iter().enumerate() {
        table.insert(*location, LonLat::new(i as f64, i as f64));
    }
    table
}

pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Three users on the Monday [`epoch`] clock:
///
/// - `u1`: eleven check-ins forming five sessions, one of them a single visit
/// - `u2`: a single check-in
/// - `u3`: two check-ins 500 hours apart, so no session survives
pub fn commuter_records() -> Vec<CheckinRecord> {
    vec![
        record("u1", "a", 0),
        record("u1", "b", 1),
        record("u1", "a", 2),
        record("u1", "c", 100),
        record("u1", "a", 101),
        record("u1", "b", 200),
        record("u1", "b", 201),
        record("u1", "d", 300),
        record("u1", "a", 400),
        record("u1", "e", 401),
        record("u2", "a", 5),
        record("u3", "b", 0),
        record("u3", "c", 500),
    ]
}

/// Coordinates for every location of [`commuter_records`].
pub fn commuter_coordinates() -> CoordinateTable {
    grid_coordinates(&["a", "b", "c", "d", "e"])
}
