//! Synthetic check-in generator for stress testing and benchmarking.
//!
//! Generates users that mostly revisit a small personal set of favourite
//! places, with exponentially distributed gaps between check-ins and the
//! occasional multi-day break, so every segmentation branch is exercised.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use sessiontrace::synthetic::SyntheticScenario;
//!
//! let dataset = SyntheticScenario::standard().generate();
//! assert_eq!(dataset.traces().len(), 50);
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{CheckinRecord, CoordinateTable, LonLat, RawTraces, TraceOrder};

// ============================================================================
// Types
// ============================================================================

/// Metadata about a generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    /// Total check-ins across all users.
    pub total_checkins: usize,
    /// Locations visited at least once.
    pub distinct_locations: usize,
    /// Number of inserted multi-day breaks.
    pub long_breaks: usize,
}

/// A complete synthetic dataset.
pub struct SyntheticDataset {
    /// Check-ins, grouped by user, ascending in time within a user.
    pub records: Vec<CheckinRecord>,
    /// Dataset statistics.
    pub metadata: DatasetMetadata,
}

/// Scenario configuration for generating synthetic check-ins.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Center of the generated city.
    pub origin: LonLat,
    /// Number of users to generate.
    pub user_count: usize,
    /// Size of the shared location pool.
    pub location_count: usize,
    /// Inclusive range of check-ins per user.
    pub checkins_per_user: (usize, usize),
    /// Size of each user's favourite location set.
    pub favourite_locations: usize,
    /// Probability that a check-in goes to a favourite location (0.0-1.0).
    pub favourite_share: f64,
    /// Mean gap between consecutive check-ins in minutes.
    pub mean_gap_minutes: f64,
    /// Probability of a 4-14 day break before a check-in.
    pub long_break_probability: f64,
    /// Radius of the location pool around the origin in meters.
    pub spread_meters: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

fn meters_to_deg_lon(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lon = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lon.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lon
}

/// Place `count` locations uniformly in a disc around `origin`.
fn generate_locations(origin: &LonLat, count: usize, spread_meters: f64, rng: &mut StdRng) -> Vec<LonLat> {
    (0..count)
        .map(|_| {
            let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let radius = spread_meters * rng.r#gen::<f64>().sqrt();
            LonLat::new(
                origin.lon + meters_to_deg_lon(radius * angle.cos(), origin.lat),
                origin.lat + meters_to_deg_lat(radius * angle.sin()),
            )
        })
        .collect()
}

fn location_token(index: usize) -> String {
    format!("loc_{:05}", index)
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate a complete synthetic dataset from this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let pool = generate_locations(&self.origin, self.location_count.max(1), self.spread_meters, &mut rng);

        let start = NaiveDate::from_ymd_opt(2010, 1, 4)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap_or_default();

        let (min_checkins, max_checkins) = self.checkins_per_user;
        let mut records = Vec::new();
        let mut visited = vec![false; pool.len()];
        let mut long_breaks = 0;

        for user_idx in 0..self.user_count {
            let user = format!("user_{:04}", user_idx);
            let favourites: Vec<usize> = (0..self.favourite_locations.max(1))
                .map(|_| rng.gen_range(0..pool.len()))
                .collect();
            let count = rng.gen_range(min_checkins..=max_checkins.max(min_checkins));

            let mut time: NaiveDateTime = start + Duration::hours(rng.gen_range(0..24 * 28));
            for i in 0..count {
                if i > 0 {
                    // Exponential inter-arrival time
                    let u: f64 = rng.gen_range(0.0001..1.0);
                    let mut gap_minutes = -u.ln() * self.mean_gap_minutes;
                    if rng.r#gen::<f64>() < self.long_break_probability {
                        gap_minutes += rng.gen_range(4.0..14.0) * 24.0 * 60.0;
                        long_breaks += 1;
                    }
                    time += Duration::seconds((gap_minutes * 60.0) as i64);
                }

                let location = if rng.r#gen::<f64>() < self.favourite_share {
                    favourites[rng.gen_range(0..favourites.len())]
                } else {
                    rng.gen_range(0..pool.len())
                };
                visited[location] = true;

                records.push(CheckinRecord::with_coordinate(
                    user.clone(),
                    location_token(location),
                    time,
                    pool[location],
                ));
            }
        }

        SyntheticDataset {
            metadata: DatasetMetadata {
                total_checkins: records.len(),
                distinct_locations: visited.iter().filter(|v| **v).count(),
                long_breaks,
            },
            records,
        }
    }
}

// ============================================================================
// Predefined Scenarios
// ============================================================================

/// Berlin origin, a dense check-in city at a mid-European latitude.
const BERLIN: LonLat = LonLat {
    lon: 13.405,
    lat: 52.52,
};

impl SyntheticScenario {
    /// 50 users, 300 locations, 40-200 check-ins each. Baseline benchmark.
    pub fn standard() -> Self {
        Self {
            origin: BERLIN,
            user_count: 50,
            location_count: 300,
            checkins_per_user: (40, 200),
            favourite_locations: 8,
            favourite_share: 0.7,
            mean_gap_minutes: 180.0,
            long_break_probability: 0.05,
            spread_meters: 8_000.0,
            seed: 42,
        }
    }

    /// 200 users with short, bursty traces. Many users fail the thresholds.
    pub fn sparse() -> Self {
        Self {
            origin: BERLIN,
            user_count: 200,
            location_count: 2_000,
            checkins_per_user: (2, 40),
            favourite_locations: 3,
            favourite_share: 0.4,
            mean_gap_minutes: 30.0,
            long_break_probability: 0.15,
            spread_meters: 20_000.0,
            seed: 43,
        }
    }

    /// Configurable scenario for benchmarks: N users with the standard mix.
    pub fn with_user_count(count: usize) -> Self {
        Self {
            user_count: count,
            location_count: (count * 6).max(50),
            seed: count as u64 * 7919,
            ..Self::standard()
        }
    }
}

// ============================================================================
// Output helpers
// ============================================================================

impl SyntheticDataset {
    /// Records grouped into ascending per-user traces.
    pub fn traces(&self) -> RawTraces {
        RawTraces::from_records(self.records.iter().cloned(), TraceOrder::Unordered)
    }

    /// Coordinate of every generated location that was visited.
    pub fn coordinates(&self) -> CoordinateTable {
        CoordinateTable::from_records(&self.records)
    }

    /// Gowalla-format lines, newest check-in first within each user.
    pub fn gowalla_lines(&self) -> Vec<String> {
        let traces = self.traces();
        let mut lines = Vec::with_capacity(self.records.len());
        let coordinates = self.coordinates();
        for trace in &traces.users {
            for visit in trace.visits.iter().rev() {
                let c = coordinates.get(&visit.location).unwrap_or(BERLIN);
                lines.push(format!(
                    "{}\t{}\t{}\t{}\t{}",
                    trace.user,
                    visit.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
                    c.lat,
                    c.lon,
                    visit.location
                ));
            }
        }
        lines
    }

    /// Foursquare-format lines in generation order.
    pub fn foursquare_lines(&self, delimiter: char) -> Vec<String> {
        let d = delimiter.to_string();
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let c = r.coordinate.unwrap_or(BERLIN);
                [
                    i.to_string(),
                    r.user.clone(),
                    c.lon.to_string(),
                    c.lat.to_string(),
                    r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    String::new(),
                    String::new(),
                    "synthetic".to_string(),
                    r.location.clone(),
                ]
                .join(&d)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
