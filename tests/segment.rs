//! Tests for segment module

mod common;

use common::{at_hours, at_minutes, visits_at_hours};
use sessiontrace::segment::visit_count;
use sessiontrace::{filter_short_sessions, segment_visits, SegmentDecision, SegmentPolicy, Visit};

fn gowalla_policy() -> SegmentPolicy {
    SegmentPolicy {
        hour_gap: 72,
        min_gap: None,
        session_max: 10,
    }
}

fn foursquare_policy() -> SegmentPolicy {
    SegmentPolicy {
        min_gap: Some(10),
        ..gowalla_policy()
    }
}

#[test]
fn test_gap_splits_and_short_session_dropped() {
    let visits = visits_at_hours("a", &[0, 1, 2, 100]);
    let sessions = segment_visits(&visits, &gowalla_policy());

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[&0].len(), 3);
    assert_eq!(sessions[&1].len(), 1);

    let filtered = filter_short_sessions(&sessions, 2);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[&0].len(), 3);
}

#[test]
fn test_gap_exactly_at_threshold_appends() {
    // 72h is not more than 72h
    let visits = visits_at_hours("a", &[0, 72]);
    let sessions = segment_visits(&visits, &gowalla_policy());
    assert_eq!(sessions.len(), 1);

    let visits = vec![
        Visit::new("a", at_hours(0)),
        Visit::new("a", at_minutes(72 * 60 + 1)),
    ];
    let sessions = segment_visits(&visits, &gowalla_policy());
    assert_eq!(sessions.len(), 2);
}

#[test]
fn test_max_length_split_fires_after_session_max() {
    let hours: Vec<i64> = (0..25).collect();
    let visits = visits_at_hours("a", &hours);
    let policy = SegmentPolicy {
        session_max: 3,
        ..gowalla_policy()
    };
    let sessions = segment_visits(&visits, &policy);

    // A session is closed once it holds more than session_max visits
    for session in sessions.values() {
        assert!(session.len() <= policy.session_max + 1);
    }
    assert_eq!(sessions[&0].len(), 4);
    assert_eq!(visit_count(&sessions), 25);
}

#[test]
fn test_sessions_respect_hour_gap() {
    let visits = visits_at_hours("a", &[0, 5, 80, 81, 200, 210, 400]);
    let policy = gowalla_policy();
    let sessions = segment_visits(&visits, &policy);

    for session in sessions.values() {
        for pair in session.windows(2) {
            let gap = (pair[1].timestamp - pair[0].timestamp).num_hours();
            assert!(gap <= i64::from(policy.hour_gap));
        }
    }
    assert_eq!(sessions.len(), 4);
}

#[test]
fn test_min_gap_drops_close_visits() {
    let visits = vec![
        Visit::new("a", at_minutes(0)),
        Visit::new("b", at_minutes(5)),  // dropped, 5 <= 10
        Visit::new("c", at_minutes(20)), // 15 since the dropped visit
        Visit::new("d", at_minutes(30)), // dropped, exactly 10
        Visit::new("e", at_minutes(41)),
    ];

    let sessions = segment_visits(&visits, &foursquare_policy());
    assert_eq!(sessions.len(), 1);
    let locations: Vec<&str> = sessions[&0].iter().map(|v| v.location.as_str()).collect();
    assert_eq!(locations, vec!["a", "c", "e"]);

    // Without a min gap nothing is dropped
    let sessions = segment_visits(&visits, &gowalla_policy());
    assert_eq!(sessions[&0].len(), 5);
}

#[test]
fn test_dropped_visit_advances_clock() {
    // The gap of the third visit is measured from the dropped second visit
    let visits = vec![
        Visit::new("a", at_minutes(0)),
        Visit::new("b", at_minutes(8)),
        Visit::new("c", at_minutes(16)),
    ];
    let sessions = segment_visits(&visits, &foursquare_policy());
    assert_eq!(sessions[&0].len(), 1);
}

#[test]
fn test_decision_outcomes() {
    let policy = foursquare_policy();

    assert_eq!(policy.decide(None, None), SegmentDecision::NewSession);
    assert_eq!(policy.decide(Some(60), None), SegmentDecision::NewSession);
    assert_eq!(policy.decide(Some(73 * 3600), Some(2)), SegmentDecision::NewSession);
    assert_eq!(policy.decide(Some(3600), Some(11)), SegmentDecision::NewSession);
    assert_eq!(policy.decide(Some(3600), Some(10)), SegmentDecision::Append);
    assert_eq!(policy.decide(Some(600), Some(3)), SegmentDecision::Drop);
    assert_eq!(policy.decide(Some(601), Some(3)), SegmentDecision::Append);

    assert_eq!(gowalla_policy().decide(Some(1), Some(3)), SegmentDecision::Append);
}

#[test]
fn test_segmentation_deterministic() {
    let visits = visits_at_hours("a", &[0, 1, 3, 90, 91, 92, 300, 301, 302, 303]);
    let first = segment_visits(&visits, &gowalla_policy());
    let second = segment_visits(&visits, &gowalla_policy());
    assert_eq!(first, second);
}

#[test]
fn test_filter_short_sessions_redenses_indices() {
    let visits = visits_at_hours("a", &[0, 100, 101, 300, 500, 501, 502]);
    let sessions = segment_visits(&visits, &gowalla_policy());
    assert_eq!(sessions.len(), 4);

    let filtered = filter_short_sessions(&sessions, 2);
    let keys: Vec<usize> = filtered.keys().copied().collect();
    assert_eq!(keys, vec![0, 1]);
    assert_eq!(filtered[&0], sessions[&1]);
    assert_eq!(filtered[&1], sessions[&3]);

    // Raw segmentation keeps its indices
    assert_eq!(sessions.len(), 4);
}

#[test]
fn test_empty_input() {
    let sessions = segment_visits(&[], &gowalla_policy());
    assert!(sessions.is_empty());
    assert!(filter_short_sessions(&sessions, 2).is_empty());
}
