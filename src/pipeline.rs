//! End-to-end driver: filter → segment → dictionary → split/statistics → dataset.
//!
//! Per-user stages are independent and run on rayon when the `parallel`
//! feature is enabled. The dictionary pass always runs serially in filter
//! order, so dense ids are the same with or without the feature.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::dataset::{Dataset, FilteredUserData, UserRecord};
use crate::dictionary::{build_dictionaries, Dictionaries, UNKNOWN_LOCATION_ID};
use crate::error::{PipelineError, Result};
use crate::filter::{filter_users, location_frequencies, AdmittedUser, FilterOutcome};
use crate::segment::{filter_short_sessions, segment_visits, Sessions};
use crate::split::split_sessions;
use crate::stats::{
    location_histogram, location_ratio, location_set, prediction_length, spatial_entropy,
    train_radius_of_gyration, EncodedSession, UserStatistics,
};
use crate::{CoordinateTable, RawTraces};

/// Segmentation result of one admitted user.
#[derive(Debug, Clone)]
pub struct SegmentedUser {
    pub user: String,
    /// Location visit counts over the raw trace, most common first
    pub topk: Vec<(String, usize)>,
    /// Sessions before the length filter, original indices
    pub raw_sessions: Sessions,
    /// Sessions surviving the length filter, re-densed
    pub sessions: Sessions,
}

/// Counters describing one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub raw_users: usize,
    pub raw_locations: usize,
    pub admitted_users: usize,
    /// Admitted users dropped for having too few surviving sessions
    pub excluded_users: usize,
    /// Users present in `data_neural`
    pub final_users: usize,
    /// Dictionary size, `unk` included
    pub final_locations: usize,
    /// Users whose statistics could not be computed
    pub failed_users: Vec<PipelineError>,
    /// Dictionary locations left out of the coordinate lookup
    pub unmapped_locations: usize,
}

/// Session pipeline bound to a validated configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate `config` and build a pipeline. Fails fast on bad values.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `traces`.
    ///
    /// `coordinates` feeds the radius of gyration and, for the Foursquare
    /// variant, the location lookup table.
    pub fn run(&self, traces: &RawTraces, coordinates: &CoordinateTable) -> Result<(Dataset, PipelineReport)> {
        let config = &self.config;
        let mut report = PipelineReport {
            raw_users: traces.len(),
            raw_locations: traces.distinct_locations(),
            ..Default::default()
        };

        let outcome = filter_users(traces, config);
        report.admitted_users = outcome.users.len();

        let segmented = self.segment_all(traces, &outcome);

        let min_sessions = config.sessions_count_min;
        let (kept, excluded): (Vec<SegmentedUser>, Vec<SegmentedUser>) = segmented
            .into_iter()
            .partition(|u| u.sessions.len() >= min_sessions);
        report.excluded_users = excluded.len();
        info!(
            "[Segment] {} users kept, {} with fewer than {} sessions excluded",
            kept.len(),
            excluded.len(),
            min_sessions
        );

        // Serialized pass: ids depend only on the order of `kept`.
        let dicts = build_dictionaries(kept.iter().map(|u| (u.user.as_str(), &u.sessions)));

        let prepared = self.prepare_all(&kept, &dicts, coordinates);

        let mut data_neural = BTreeMap::new();
        for result in prepared {
            match result {
                Ok(record) => {
                    if let Some(id) = dicts.users.id(&record.user) {
                        data_neural.insert(id, record);
                    }
                }
                Err(e) if config.strict => return Err(e),
                Err(e) => {
                    warn!("[Pipeline] Excluding user: {}", e);
                    report.failed_users.push(e);
                }
            }
        }

        let (data_filter, vid_lookup) = if config.includes_extras() {
            let data_filter = kept
                .into_iter()
                .map(|u| {
                    let data = FilteredUserData {
                        sessions_count: u.sessions.len(),
                        topk_count: u.topk.len(),
                        topk: u.topk,
                        sessions: u.sessions,
                        raw_sessions: u.raw_sessions,
                    };
                    (u.user, data)
                })
                .collect();
            let (lookup, unmapped) = location_lookup(&dicts, coordinates);
            report.unmapped_locations = unmapped;
            (Some(data_filter), Some(lookup))
        } else {
            (None, None)
        };

        report.final_users = data_neural.len();
        report.final_locations = dicts.locations.len();

        info!(
            "[Pipeline] raw users:{} raw locations:{} final users:{} final locations:{} failed:{}",
            report.raw_users,
            report.raw_locations,
            report.final_users,
            report.final_locations,
            report.failed_users.len()
        );

        let dataset = Dataset {
            data_neural,
            uid_list: dicts.users,
            vid_list: dicts.locations,
            parameters: config.clone(),
            data_filter,
            vid_lookup,
        };

        Ok((dataset, report))
    }

    /// Filter and segment every admitted user.
    fn segment_all(&self, traces: &RawTraces, outcome: &FilterOutcome) -> Vec<SegmentedUser> {
        #[cfg(feature = "parallel")]
        let segmented = outcome
            .users
            .par_iter()
            .map(|admitted| self.segment_user(traces, outcome, admitted))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let segmented = outcome
            .users
            .iter()
            .map(|admitted| self.segment_user(traces, outcome, admitted))
            .collect();

        segmented
    }

    /// Segmentation chain of a single user.
    pub fn segment_user(
        &self,
        traces: &RawTraces,
        outcome: &FilterOutcome,
        admitted: &AdmittedUser,
    ) -> SegmentedUser {
        let trace = &traces.users[admitted.trace_index];
        let visits = outcome.retain_visits(trace);
        let raw_sessions = segment_visits(&visits, &self.config.segment_policy());
        let sessions = filter_short_sessions(&raw_sessions, self.config.session_min);

        debug!(
            "[Segment] user {}: {}/{} visits admitted, {} sessions, {} after length filter",
            trace.user,
            visits.len(),
            trace.visits.len(),
            raw_sessions.len(),
            sessions.len()
        );

        SegmentedUser {
            user: trace.user.clone(),
            topk: location_frequencies(&trace.visits),
            raw_sessions,
            sessions,
        }
    }

    /// Split and summarise every kept user against the frozen dictionaries.
    fn prepare_all(
        &self,
        kept: &[SegmentedUser],
        dicts: &Dictionaries,
        coordinates: &CoordinateTable,
    ) -> Vec<Result<UserRecord>> {
        #[cfg(feature = "parallel")]
        let prepared = kept
            .par_iter()
            .map(|u| self.prepare_user(u, dicts, coordinates))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let prepared = kept
            .iter()
            .map(|u| self.prepare_user(u, dicts, coordinates))
            .collect();

        prepared
    }

    /// Encode sessions, split them, and compute statistics for one user.
    pub fn prepare_user(
        &self,
        segmented: &SegmentedUser,
        dicts: &Dictionaries,
        coordinates: &CoordinateTable,
    ) -> Result<UserRecord> {
        let user = segmented.user.as_str();
        let sessions = &segmented.sessions;

        let encoded: BTreeMap<usize, EncodedSession> = sessions
            .iter()
            .map(|(&sid, visits)| {
                let tuples = visits
                    .iter()
                    .map(|v| {
                        (
                            dicts.locations.id(&v.location).unwrap_or(UNKNOWN_LOCATION_ID),
                            self.config.time_encoding.encode(&v.timestamp),
                        )
                    })
                    .collect();
                (sid, tuples)
            })
            .collect();

        let split = split_sessions(encoded.keys().copied().collect(), self.config.train_split);

        let train_locations = location_set(sessions, &split.train);
        let test_locations = location_set(sessions, &split.test);

        let statistics = UserStatistics {
            pred_len: prediction_length(&encoded, &split.train),
            valid_len: prediction_length(&encoded, &split.test),
            train_loc: location_histogram(&encoded, &split.train),
            location_ratio: location_ratio(user, &train_locations, &test_locations)?,
            entropy: spatial_entropy(sessions),
            radius_of_gyration: train_radius_of_gyration(user, sessions, &split.train, coordinates)?,
        };

        Ok(UserRecord {
            user: user.to_string(),
            sessions: encoded,
            train: split.train,
            test: split.test,
            statistics,
        })
    }
}

/// Dense location id -> `[lon, lat]` for every dictionary location with a
/// coordinate. Returns the table and the number of locations without one.
pub fn location_lookup(
    dicts: &Dictionaries,
    coordinates: &CoordinateTable,
) -> (BTreeMap<usize, [f64; 2]>, usize) {
    let mut lookup = BTreeMap::new();
    let mut unmapped = 0;
    for (token, id, _) in dicts.locations.iter() {
        if id == UNKNOWN_LOCATION_ID {
            continue;
        }
        match coordinates.get(token) {
            Some(coordinate) => {
                lookup.insert(id, coordinate.to_array());
            }
            None => unmapped += 1,
        }
    }
    if unmapped > 0 {
        warn!("[Pipeline] {} locations have no coordinate in the lookup", unmapped);
    }
    (lookup, unmapped)
}
