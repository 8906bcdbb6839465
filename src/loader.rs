//! Raw check-in dump parsing.
//!
//! Gowalla lines: `user \t 2010-10-19T23:55:27Z \t lat \t lon \t location`,
//! grouped by user with the newest check-in first.
//!
//! Foursquare lines: nine fields separated by [`FOURSQUARE_DELIMITER`],
//! `_ user lon lat "2012-04-03 18:00:09" _ _ text location`, in no
//! particular order.
//!
//! Lines with the wrong arity, a bad timestamp or an empty user/location are
//! skipped and counted. A bad or out-of-range coordinate keeps the check-in
//! without a coordinate, so the gap surfaces later as a per-user
//! `MissingCoordinates` error. Blank lines are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDateTime;
use log::{info, warn};

use crate::error::{OptionExt, PipelineError, Result};
use crate::{CheckinRecord, CoordinateTable, LonLat, RawTraces, TraceOrder};

/// Default field separator of Foursquare tweet dumps (SOH control character).
pub const FOURSQUARE_DELIMITER: char = '\u{1}';

/// Malformed-record errors kept verbatim in a [`LoadReport`]; the rest are only counted.
pub const MAX_REPORTED_ERRORS: usize = 20;

const GOWALLA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const FOURSQUARE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FOURSQUARE_FIELDS: usize = 9;

/// Outcome of loading one dump.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Per-user traces, ascending by time
    pub traces: RawTraces,
    /// Last coordinate seen per location token
    pub coordinates: CoordinateTable,
    /// Non-blank lines read
    pub lines: usize,
    /// Lines skipped as malformed
    pub skipped: usize,
    /// The first [`MAX_REPORTED_ERRORS`] parse errors
    pub errors: Vec<PipelineError>,
}

impl LoadReport {
    /// Number of records that made it into the traces.
    pub fn loaded(&self) -> usize {
        self.lines - self.skipped
    }
}

/// Parse one Gowalla line. `line_no` is 1-based and only used for errors.
pub fn parse_gowalla_line(line: &str, line_no: usize) -> Result<CheckinRecord> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');

    let user = fields.next().ok_or_malformed(line_no, "missing user")?;
    let time = fields.next().ok_or_malformed(line_no, "missing timestamp")?;
    let lat = fields.next().ok_or_malformed(line_no, "missing latitude")?;
    let lon = fields.next().ok_or_malformed(line_no, "missing longitude")?;
    let location = fields.next().ok_or_malformed(line_no, "missing location")?;

    let timestamp = parse_time(time.trim(), GOWALLA_TIME_FORMAT, line_no)?;

    let mut record = CheckinRecord::new(
        non_empty(user, line_no, "user")?,
        non_empty(location, line_no, "location")?,
        timestamp,
    );
    record.coordinate = coordinate_or_missing(lon, lat, line_no);
    Ok(record)
}

/// Parse one Foursquare line split by `delimiter`.
pub fn parse_foursquare_line(line: &str, line_no: usize, delimiter: char) -> Result<CheckinRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(delimiter).collect();
    if fields.len() != FOURSQUARE_FIELDS {
        return Err(PipelineError::MalformedRecord {
            line: line_no,
            reason: format!("expected {} fields, got {}", FOURSQUARE_FIELDS, fields.len()),
        });
    }

    let timestamp = parse_time(fields[4].trim(), FOURSQUARE_TIME_FORMAT, line_no)?;

    let mut record = CheckinRecord::new(
        non_empty(fields[1], line_no, "user")?,
        non_empty(fields[8], line_no, "location")?,
        timestamp,
    );
    record.coordinate = coordinate_or_missing(fields[2], fields[3], line_no);
    Ok(record)
}

/// Load a Gowalla dump.
pub fn load_gowalla<R: BufRead>(reader: R) -> Result<LoadReport> {
    load_with(reader, TraceOrder::NewestFirst, parse_gowalla_line)
}

/// Load a Foursquare dump.
pub fn load_foursquare<R: BufRead>(reader: R, delimiter: char) -> Result<LoadReport> {
    load_with(reader, TraceOrder::Unordered, |line, line_no| {
        parse_foursquare_line(line, line_no, delimiter)
    })
}

/// Load a Gowalla dump from a file.
pub fn load_gowalla_file(path: impl AsRef<Path>) -> Result<LoadReport> {
    let path = path.as_ref();
    info!("[Loader] Reading Gowalla trace {}", path.display());
    load_gowalla(BufReader::new(File::open(path)?))
}

/// Load a Foursquare dump from a file.
pub fn load_foursquare_file(path: impl AsRef<Path>, delimiter: char) -> Result<LoadReport> {
    let path = path.as_ref();
    info!("[Loader] Reading Foursquare trace {}", path.display());
    load_foursquare(BufReader::new(File::open(path)?), delimiter)
}

/// Read a coordinate side file in Foursquare layout, ignoring timestamps.
///
/// Only the location and `lon`/`lat` fields are read, so lines with a bad
/// timestamp still contribute their coordinate. The returned report has no
/// traces; wrong-arity lines and unusable coordinates are skipped and counted
/// exactly like [`load_foursquare`] does.
pub fn load_coordinates<R: BufRead>(reader: R, delimiter: char) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;

        let fields: Vec<&str> = line.split(delimiter).collect();
        let parsed = if fields.len() != FOURSQUARE_FIELDS {
            Err(PipelineError::MalformedRecord {
                line: i + 1,
                reason: format!("expected {} fields, got {}", FOURSQUARE_FIELDS, fields.len()),
            })
        } else {
            parse_coordinate(fields[2], fields[3], i + 1)
        };

        match parsed {
            Ok(coordinate) => report.coordinates.insert(fields[8].trim(), coordinate),
            Err(e) => {
                report.skipped += 1;
                if report.errors.len() < MAX_REPORTED_ERRORS {
                    warn!("[Loader] Skipping venue {}", e);
                    report.errors.push(e);
                }
            }
        }
    }

    info!(
        "[Loader] {} venue lines, {} skipped, {} locations with coordinates",
        report.lines,
        report.skipped,
        report.coordinates.len()
    );

    Ok(report)
}

fn load_with<R, F>(reader: R, order: TraceOrder, parse: F) -> Result<LoadReport>
where
    R: BufRead,
    F: Fn(&str, usize) -> Result<CheckinRecord>,
{
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;

        match parse(&line, i + 1) {
            Ok(record) => {
                if let Some(coordinate) = record.coordinate {
                    report.coordinates.insert(record.location.clone(), coordinate);
                }
                records.push(record);
            }
            Err(e) => {
                report.skipped += 1;
                if report.errors.len() < MAX_REPORTED_ERRORS {
                    warn!("[Loader] Skipping {}", e);
                    report.errors.push(e);
                }
            }
        }
    }

    report.traces = RawTraces::from_records(records, order);

    info!(
        "[Loader] {} lines, {} skipped, {} users, {} locations with coordinates",
        report.lines,
        report.skipped,
        report.traces.len(),
        report.coordinates.len()
    );

    Ok(report)
}

fn parse_time(raw: &str, format: &str, line_no: usize) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, format).map_err(|e| PipelineError::MalformedRecord {
        line: line_no,
        reason: format!("bad timestamp '{}': {}", raw, e),
    })
}

fn parse_coordinate(lon: &str, lat: &str, line_no: usize) -> Result<LonLat> {
    let parse = |raw: &str, name: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| PipelineError::MalformedRecord {
                line: line_no,
                reason: format!("bad {} '{}': {}", name, raw, e),
            })
    };
    let coordinate = LonLat::new(parse(lon, "longitude")?, parse(lat, "latitude")?);
    if !coordinate.is_valid() {
        return Err(PipelineError::MalformedRecord {
            line: line_no,
            reason: format!("coordinate out of range ({}, {})", coordinate.lon, coordinate.lat),
        });
    }
    Ok(coordinate)
}

/// Coordinate of a check-in line, `None` (with a warning) when unusable.
fn coordinate_or_missing(lon: &str, lat: &str, line_no: usize) -> Option<LonLat> {
    match parse_coordinate(lon, lat, line_no) {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            warn!("[Loader] Keeping check-in without coordinate: {}", e);
            None
        }
    }
}

fn non_empty<'a>(raw: &'a str, line_no: usize, name: &str) -> Result<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(PipelineError::MalformedRecord {
            line: line_no,
            reason: format!("empty {}", name),
        });
    }
    Ok(value)
}
