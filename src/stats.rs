//! Per-user mobility statistics.
//!
//! Note the scopes differ on purpose:
//! - spatial entropy looks at *all* of the user's sessions (full diversity)
//! - radius of gyration looks at *train* sessions only (train-set spread)
//! - location ratio compares the train and test location sets

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::geo_utils;
use crate::segment::Sessions;
use crate::{CoordinateTable, LonLat};

/// Encoded session: `(location id, time slot)` per visit.
pub type EncodedSession = Vec<(usize, u32)>;

/// Statistics block of a user record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatistics {
    /// Next-location predictions available in train sessions
    pub pred_len: usize,
    /// Next-location predictions available in test sessions
    pub valid_len: usize,
    /// Location id -> visits across train sessions
    pub train_loc: BTreeMap<usize, usize>,
    /// Share of distinct locations seen only in test sessions
    #[serde(rename = "explore")]
    pub location_ratio: f64,
    /// Shannon entropy (nats) of the user's location distribution
    pub entropy: f64,
    /// Radius of gyration over train visits, `None` without train visits
    #[serde(rename = "rg")]
    pub radius_of_gyration: Option<f64>,
}

/// Shannon entropy `-Σ p ln p` of location visit frequencies across all
/// sessions. Locations that never occur are absent, so no smoothing applies.
pub fn spatial_entropy(sessions: &Sessions) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for session in sessions.values() {
        for visit in session {
            let count = counts.entry(visit.location.as_str()).or_insert_with(|| {
                order.push(visit.location.as_str());
                0
            });
            *count += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    order
        .iter()
        .map(|location| {
            let p = counts[location] as f64 / total as f64;
            -p * p.ln()
        })
        .sum()
}

/// `|test \ train| / |train ∪ test|`.
///
/// An empty union is an error for `user`, never a default value.
pub fn location_ratio(user: &str, train: &HashSet<&str>, test: &HashSet<&str>) -> Result<f64> {
    let whole: HashSet<&str> = train.union(test).copied().collect();
    if whole.is_empty() {
        return Err(PipelineError::EmptyLocationUnion {
            user: user.to_string(),
        });
    }
    let test_only = test.difference(train).count();
    Ok(test_only as f64 / whole.len() as f64)
}

/// Radius of gyration of the visits in `train_ids`.
///
/// Every visit's coordinate is looked up in `coordinates`. All misses are
/// collected (each token once, in encounter order) and reported together,
/// so a partial centroid is never computed.
pub fn train_radius_of_gyration(
    user: &str,
    sessions: &Sessions,
    train_ids: &[usize],
    coordinates: &CoordinateTable,
) -> Result<Option<f64>> {
    let mut points: Vec<LonLat> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for visit in train_ids
        .iter()
        .filter_map(|id| sessions.get(id))
        .flat_map(|session| session.iter())
    {
        match coordinates.get(&visit.location) {
            Some(coordinate) => points.push(coordinate),
            None => {
                if !missing.contains(&visit.location) {
                    missing.push(visit.location.clone());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(PipelineError::MissingCoordinates {
            user: user.to_string(),
            locations: missing,
        });
    }

    Ok(geo_utils::radius_of_gyration(&points))
}

/// Σ `(len - 1)` over the given sessions.
pub fn prediction_length(sessions: &BTreeMap<usize, EncodedSession>, ids: &[usize]) -> usize {
    ids.iter()
        .filter_map(|id| sessions.get(id))
        .map(|session| session.len().saturating_sub(1))
        .sum()
}

/// Location id -> occurrence count across the given sessions.
pub fn location_histogram(
    sessions: &BTreeMap<usize, EncodedSession>,
    ids: &[usize],
) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for (location, _) in ids
        .iter()
        .filter_map(|id| sessions.get(id))
        .flat_map(|session| session.iter())
    {
        *histogram.entry(*location).or_insert(0) += 1;
    }
    histogram
}

/// Distinct raw location tokens across the given sessions.
pub fn location_set<'a>(sessions: &'a Sessions, ids: &[usize]) -> HashSet<&'a str> {
    ids.iter()
        .filter_map(|id| sessions.get(id))
        .flat_map(|session| session.iter())
        .map(|visit| visit.location.as_str())
        .collect()
}
