//! Tests for loader module

use std::io::Cursor;

use sessiontrace::loader::{
    load_coordinates, load_gowalla_file, parse_foursquare_line, parse_gowalla_line,
    MAX_REPORTED_ERRORS,
};
use sessiontrace::{load_foursquare, load_gowalla, LonLat, PipelineError, FOURSQUARE_DELIMITER};

fn foursquare_line(id: usize, user: &str, lon: f64, lat: f64, time: &str, location: &str) -> String {
    let d = FOURSQUARE_DELIMITER.to_string();
    [
        id.to_string(),
        user.to_string(),
        lon.to_string(),
        lat.to_string(),
        time.to_string(),
        String::new(),
        String::new(),
        "at the venue".to_string(),
        location.to_string(),
    ]
    .join(&d)
}

#[test]
fn test_parse_gowalla_line() {
    let record = parse_gowalla_line("0\t2010-10-19T23:55:27Z\t30.2359091167\t-97.7951395833\t22847", 1)
        .unwrap();
    assert_eq!(record.user, "0");
    assert_eq!(record.location, "22847");
    assert_eq!(record.timestamp.to_string(), "2010-10-19 23:55:27");
    assert_eq!(record.coordinate, Some(LonLat::new(-97.7951395833, 30.2359091167)));
}

#[test]
fn test_parse_gowalla_line_errors() {
    let missing = parse_gowalla_line("0\t2010-10-19T23:55:27Z\t30.2", 4).unwrap_err();
    assert!(matches!(missing, PipelineError::MalformedRecord { line: 4, .. }));

    let bad_time = parse_gowalla_line("0\tyesterday\t30.2\t-97.7\t1", 5).unwrap_err();
    assert!(bad_time.to_string().contains("bad timestamp"));

    let empty_user = parse_gowalla_line(" \t2010-10-19T23:55:27Z\t30.2\t-97.7\t1", 7).unwrap_err();
    assert!(empty_user.to_string().contains("empty user"));
}

#[test]
fn test_parse_foursquare_line() {
    let line = foursquare_line(1, "u42", 139.7, 35.6, "2012-04-03 18:00:09", "v17");
    let record = parse_foursquare_line(&line, 1, FOURSQUARE_DELIMITER).unwrap();
    assert_eq!(record.user, "u42");
    assert_eq!(record.location, "v17");
    assert_eq!(record.coordinate, Some(LonLat::new(139.7, 35.6)));
    assert_eq!(record.timestamp.to_string(), "2012-04-03 18:00:09");
}

#[test]
fn test_parse_foursquare_field_count() {
    let err = parse_foursquare_line("a|b|c", 3, '|').unwrap_err();
    assert!(err.to_string().contains("expected 9 fields, got 3"));
}

#[test]
fn test_gowalla_traces_are_ascending() {
    let data = "\
u1\t2010-10-19T23:00:00Z\t30.0\t-97.0\tc
u1\t2010-10-18T23:00:00Z\t30.1\t-97.1\tb
u1\t2010-10-17T23:00:00Z\t30.2\t-97.2\ta
u2\t2010-10-19T12:00:00Z\t31.0\t-98.0\ta
";
    let report = load_gowalla(Cursor::new(data)).unwrap();
    assert_eq!(report.lines, 4);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.loaded(), 4);
    assert_eq!(report.traces.len(), 2);

    let locations: Vec<&str> = report.traces.users[0]
        .visits
        .iter()
        .map(|v| v.location.as_str())
        .collect();
    assert_eq!(locations, vec!["a", "b", "c"]);

    // Last coordinate seen wins
    assert_eq!(report.coordinates.get("a"), Some(LonLat::new(-98.0, 31.0)));
}

#[test]
fn test_malformed_lines_are_skipped_and_counted() {
    let data = "\
u1\t2010-10-19T23:00:00Z\t30.0\t-97.0\tc

u1\tnot-a-time\t30.1\t-97.1\tb
garbage
u1\t2010-10-17T23:00:00Z\t30.2\t-97.2\ta
";
    let report = load_gowalla(Cursor::new(data)).unwrap();
    assert_eq!(report.lines, 4);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(report.errors[0], PipelineError::MalformedRecord { line: 3, .. }));
    assert_eq!(report.traces.total_visits(), 2);
}

#[test]
fn test_reported_errors_are_capped() {
    let data = "bad line\n".repeat(MAX_REPORTED_ERRORS + 5);
    let report = load_gowalla(Cursor::new(data)).unwrap();
    assert_eq!(report.skipped, MAX_REPORTED_ERRORS + 5);
    assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    assert!(report.traces.is_empty());
}

#[test]
fn test_foursquare_traces_are_sorted() {
    let lines = [
        foursquare_line(1, "u1", 139.7, 35.6, "2012-04-05 10:00:00", "late"),
        foursquare_line(2, "u1", 139.7, 35.6, "2012-04-03 10:00:00", "early"),
        foursquare_line(3, "u2", 139.8, 35.7, "2012-04-04 10:00:00", "late"),
        foursquare_line(4, "u1", 139.7, 35.6, "2012-04-04 10:00:00", "middle"),
    ];
    let report = load_foursquare(Cursor::new(lines.join("\n")), FOURSQUARE_DELIMITER).unwrap();

    assert_eq!(report.traces.len(), 2);
    let u1 = report.traces.get("u1").unwrap();
    let locations: Vec<&str> = u1.visits.iter().map(|v| v.location.as_str()).collect();
    assert_eq!(locations, vec!["early", "middle", "late"]);
}

#[test]
fn test_custom_delimiter() {
    let line = "1|u1|139.7|35.6|2012-04-05 10:00:00|||text|v1";
    let report = load_foursquare(Cursor::new(line), '|').unwrap();
    assert_eq!(report.loaded(), 1);
    assert!(report.coordinates.contains("v1"));
}

#[test]
fn test_load_coordinates_ignores_timestamps() {
    let lines = [
        foursquare_line(1, "u1", 10.0, 20.0, "not a time", "v1"),
        foursquare_line(2, "u1", 500.0, 20.0, "2012-04-05 10:00:00", "v2"),
        "short line".to_string(),
    ];
    let report = load_coordinates(Cursor::new(lines.join("\n")), FOURSQUARE_DELIMITER).unwrap();
    assert_eq!(report.coordinates.len(), 1);
    assert_eq!(report.coordinates.get("v1"), Some(LonLat::new(10.0, 20.0)));
    assert!(report.traces.is_empty());

    // The out-of-range venue and the short line are both counted
    assert_eq!(report.lines, 3);
    assert_eq!(report.skipped, 2);
    assert!(report.errors[1].to_string().contains("expected 9 fields, got 1"));
}

#[test]
fn test_unusable_coordinate_keeps_checkin() {
    let out_of_range = parse_gowalla_line("0\t2010-10-19T23:55:27Z\t130.2\t-97.7\t1", 6).unwrap();
    assert_eq!(out_of_range.location, "1");
    assert_eq!(out_of_range.coordinate, None);

    let line = foursquare_line(1, "u1", 139.7, 35.6, "2012-04-05 10:00:00", "v1")
        .replace("139.7", "east");
    let unparsable = parse_foursquare_line(&line, 1, FOURSQUARE_DELIMITER).unwrap();
    assert_eq!(unparsable.coordinate, None);
}

#[test]
fn test_out_of_range_checkin_survives_loading() {
    let data = "\
u1\t2010-06-07T02:00:00Z\t52.52\t13.40\tA
u1\t2010-06-07T01:00:00Z\t95.0\t13.41\tB
u1\t2010-06-07T00:00:00Z\t52.52\t13.40\tA
";
    let report = load_gowalla(Cursor::new(data)).unwrap();
    assert_eq!(report.skipped, 0);
    assert_eq!(report.traces.total_visits(), 3);

    let locations: Vec<&str> = report.traces.users[0]
        .visits
        .iter()
        .map(|v| v.location.as_str())
        .collect();
    assert_eq!(locations, vec!["A", "B", "A"]);
    assert!(report.coordinates.contains("A"));
    assert!(!report.coordinates.contains("B"));
}

#[test]
fn test_load_gowalla_file() {
    let path = std::env::temp_dir().join(format!("sessiontrace-loader-{}.txt", std::process::id()));
    std::fs::write(&path, "u1\t2010-10-19T23:00:00Z\t30.0\t-97.0\tc\n").unwrap();

    let report = load_gowalla_file(&path).unwrap();
    assert_eq!(report.loaded(), 1);
    std::fs::remove_file(&path).unwrap();

    let missing = load_gowalla_file(&path).unwrap_err();
    assert!(matches!(missing, PipelineError::Io(_)));
}
