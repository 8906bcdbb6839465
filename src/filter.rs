//! User and location admission.
//!
//! Gowalla traces admit users with `>= min_checkins` visits in trace order
//! and keep every location those users visit. Foursquare traces admit users
//! with `> trace_len_min` visits, ranked by activity, and keep a visit only if
//! its location has `> location_global_visit_min` visits overall or is one of
//! the user's own frequent places.

use std::collections::{HashMap, HashSet};

use log::info;

use crate::config::{DatasetVariant, PipelineConfig};
use crate::{RawTraces, UserTrace, Visit};

/// A location visited more than this many times by one user is kept for
/// that user even when it fails the global threshold. Deliberately separate
/// from `location_global_visit_min`.
pub const PERSONAL_FREQUENT_MIN_VISITS: usize = 1;

/// A user that passed the activity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmittedUser {
    /// Index into `RawTraces::users`
    pub trace_index: usize,
    /// Total number of check-ins in the raw trace
    pub visit_count: usize,
}

/// Result of the filtering stage.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Admitted users in iteration order
    pub users: Vec<AdmittedUser>,
    /// Admitted locations and their global visit counts
    pub locations: HashMap<String, usize>,
    /// Whether personally frequent locations are rescued per user
    pub rescue_personal: bool,
}

impl FilterOutcome {
    /// Visits of `trace` whose location is admitted globally or, when
    /// rescue is enabled, personally frequent for this user.
    pub fn retain_visits(&self, trace: &UserTrace) -> Vec<Visit> {
        let frequencies = if self.rescue_personal {
            location_frequencies(&trace.visits)
        } else {
            Vec::new()
        };
        let personal = personal_frequent_locations(&frequencies);

        trace
            .visits
            .iter()
            .filter(|v| {
                self.locations.contains_key(&v.location) || personal.contains(v.location.as_str())
            })
            .cloned()
            .collect()
    }
}

/// Apply the admission rules of the configured variant.
pub fn filter_users(traces: &RawTraces, config: &PipelineConfig) -> FilterOutcome {
    let outcome = match config.variant {
        DatasetVariant::Gowalla => admit_by_checkins(traces, config.min_checkins, config.max_users),
        DatasetVariant::Foursquare => admit_by_length(
            traces,
            config.trace_len_min,
            config.location_global_visit_min,
            config.max_users,
        ),
    };

    info!(
        "[Filter] Admitted {}/{} users, {}/{} locations",
        outcome.users.len(),
        traces.len(),
        outcome.locations.len(),
        traces.distinct_locations()
    );

    outcome
}

/// Gowalla admission: `visit_count >= min_checkins`, trace order, capped at
/// `max_users` (0 = unbounded). All locations of admitted users are kept.
pub fn admit_by_checkins(traces: &RawTraces, min_checkins: usize, max_users: usize) -> FilterOutcome {
    let mut users = Vec::new();
    for (trace_index, trace) in traces.users.iter().enumerate() {
        if max_users > 0 && users.len() >= max_users {
            break;
        }
        if trace.visits.len() >= min_checkins {
            users.push(AdmittedUser {
                trace_index,
                visit_count: trace.visits.len(),
            });
        }
    }

    let mut locations: HashMap<String, usize> = HashMap::new();
    for user in &users {
        for visit in &traces.users[user.trace_index].visits {
            *locations.entry(visit.location.clone()).or_insert(0) += 1;
        }
    }

    FilterOutcome {
        users,
        locations,
        rescue_personal: false,
    }
}

/// Foursquare admission: `visit_count > trace_len_min`, sorted by descending
/// visit count (stable), capped at `max_users`. Locations need
/// `> global_visit_min` visits across all users.
pub fn admit_by_length(
    traces: &RawTraces,
    trace_len_min: usize,
    global_visit_min: usize,
    max_users: usize,
) -> FilterOutcome {
    let mut users: Vec<AdmittedUser> = traces
        .users
        .iter()
        .enumerate()
        .filter(|(_, trace)| trace.visits.len() > trace_len_min)
        .map(|(trace_index, trace)| AdmittedUser {
            trace_index,
            visit_count: trace.visits.len(),
        })
        .collect();
    users.sort_by(|a, b| b.visit_count.cmp(&a.visit_count));
    if max_users > 0 {
        users.truncate(max_users);
    }

    let locations = global_visit_counts(traces)
        .into_iter()
        .filter(|(_, count)| *count > global_visit_min)
        .collect();

    FilterOutcome {
        users,
        locations,
        rescue_personal: true,
    }
}

/// Visit count of every location across all users.
pub fn global_visit_counts(traces: &RawTraces) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for trace in &traces.users {
        for visit in &trace.visits {
            *counts.entry(visit.location.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Per-location visit counts of one trace, most common first.
/// Ties keep first-encounter order.
pub fn location_frequencies(visits: &[Visit]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for visit in visits {
        match index.get(visit.location.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(visit.location.as_str(), counts.len());
                counts.push((visit.location.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Locations visited more than [`PERSONAL_FREQUENT_MIN_VISITS`] times.
pub fn personal_frequent_locations(frequencies: &[(String, usize)]) -> HashSet<&str> {
    frequencies
        .iter()
        .filter(|(_, count)| *count > PERSONAL_FREQUENT_MIN_VISITS)
        .map(|(location, _)| location.as_str())
        .collect()
}
