//! Criterion benchmarks for session segmentation and per-user statistics.
//!
//! Run with: `cargo bench --bench segmentation --features synthetic`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sessiontrace::stats::spatial_entropy;
use sessiontrace::synthetic::SyntheticScenario;
use sessiontrace::{filter_short_sessions, segment_visits, SegmentPolicy, Visit};

/// One long trace built by concatenating every synthetic user end to end.
fn long_trace(user_count: usize) -> Vec<Visit> {
    let traces = SyntheticScenario::with_user_count(user_count).generate().traces();
    let mut visits: Vec<Visit> = traces.users.into_iter().flat_map(|t| t.visits).collect();
    visits.sort_by_key(|v| v.timestamp);
    visits
}

fn bench_segment_visits(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_visits");

    let policies = [
        ("no_min_gap", SegmentPolicy::default()),
        (
            "min_gap_10",
            SegmentPolicy {
                min_gap: Some(10),
                ..SegmentPolicy::default()
            },
        ),
    ];

    for user_count in [10, 100] {
        let visits = long_trace(user_count);
        for (name, policy) in &policies {
            group.bench_with_input(BenchmarkId::new(*name, visits.len()), &visits, |b, visits| {
                b.iter(|| segment_visits(black_box(visits), policy));
            });
        }
    }

    group.finish();
}

fn bench_session_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_statistics");

    let visits = long_trace(100);
    let sessions = segment_visits(&visits, &SegmentPolicy::default());

    group.bench_function("filter_short_sessions", |b| {
        b.iter(|| filter_short_sessions(black_box(&sessions), 2));
    });
    group.bench_function("spatial_entropy", |b| {
        b.iter(|| spatial_entropy(black_box(&sessions)));
    });

    group.finish();
}

criterion_group!(benches, bench_segment_visits, bench_session_statistics);
criterion_main!(benches);
