//! Session segmentation.
//!
//! A user's ascending visit sequence is cut into sessions in one forward pass.
//! Every visit gets exactly one [`SegmentDecision`]:
//!
//! - `NewSession` for the first visit, after a gap of more than `hour_gap`
//!   hours, or when the current session already holds more than
//!   `session_max` visits
//! - `Append` otherwise, provided the gap exceeds `min_gap` minutes when a
//!   minimum gap is configured
//! - `Drop` when a minimum gap is configured and not exceeded
//!
//! The last-visit clock advances on every visit, dropped ones included.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;

use crate::Visit;

/// Ordered session index -> visits. Indices are 0-based and contiguous
/// straight out of [`segment_visits`] and [`filter_short_sessions`].
pub type Sessions = BTreeMap<usize, Vec<Visit>>;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Outcome of feeding one visit to the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentDecision {
    /// Open a new session containing only this visit
    NewSession,
    /// Append the visit to the current session
    Append,
    /// Ignore the visit (too close to the previous one)
    Drop,
}

/// Thresholds controlling session boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPolicy {
    /// Gap in hours above which a new session starts
    pub hour_gap: u32,
    /// Gap in minutes a visit must exceed to be appended. `None` never drops.
    pub min_gap: Option<u32>,
    /// A session holding more than this many visits is closed
    pub session_max: usize,
}

impl Default for SegmentPolicy {
    fn default() -> Self {
        Self {
            hour_gap: 72,
            min_gap: None,
            session_max: 10,
        }
    }
}

impl SegmentPolicy {
    /// Decide what to do with a visit.
    ///
    /// `gap_seconds` is the time since the previous processed visit and
    /// `current_len` the size of the open session; either is `None` before the
    /// first session exists.
    pub fn decide(&self, gap_seconds: Option<i64>, current_len: Option<usize>) -> SegmentDecision {
        let (gap, len) = match (gap_seconds, current_len) {
            (Some(gap), Some(len)) => (gap, len),
            _ => return SegmentDecision::NewSession,
        };

        if gap > i64::from(self.hour_gap) * SECONDS_PER_HOUR || len > self.session_max {
            return SegmentDecision::NewSession;
        }

        match self.min_gap {
            Some(min_gap) if gap <= i64::from(min_gap) * SECONDS_PER_MINUTE => SegmentDecision::Drop,
            _ => SegmentDecision::Append,
        }
    }
}

/// Partition an ascending visit sequence into sessions.
pub fn segment_visits(visits: &[Visit], policy: &SegmentPolicy) -> Sessions {
    let mut sessions: Vec<Vec<Visit>> = Vec::new();
    let mut last_time: Option<NaiveDateTime> = None;
    let mut dropped = 0usize;

    for visit in visits {
        let gap = last_time.map(|t| (visit.timestamp - t).num_seconds());
        match policy.decide(gap, sessions.last().map(Vec::len)) {
            SegmentDecision::NewSession => sessions.push(vec![visit.clone()]),
            SegmentDecision::Append => {
                if let Some(current) = sessions.last_mut() {
                    current.push(visit.clone());
                }
            }
            SegmentDecision::Drop => dropped += 1,
        }
        last_time = Some(visit.timestamp);
    }

    if dropped > 0 {
        debug!(
            "[Segment] {} visits -> {} sessions ({} dropped under min gap)",
            visits.len(),
            sessions.len(),
            dropped
        );
    }

    sessions.into_iter().enumerate().collect()
}

/// Keep sessions with at least `session_min` visits, re-densing the indices
/// in their original order. The input map is left untouched.
pub fn filter_short_sessions(sessions: &Sessions, session_min: usize) -> Sessions {
    sessions
        .values()
        .filter(|session| session.len() >= session_min)
        .cloned()
        .enumerate()
        .collect()
}

/// Total number of visits across sessions.
pub fn visit_count(sessions: &Sessions) -> usize {
    sessions.values().map(Vec::len).sum()
}
