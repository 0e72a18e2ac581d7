// src/specs/tracklog.rs

use crate::model::{SampleTime, TrackPoint};
use crate::normalize::{clock_token, parse_coord, parse_int, parse_time, to_24_hour};
use crate::table::{parse_table, RawRow, TableParse, TRACKLOG};
use crate::Result;

/// Track log page for a leg: its history locator plus `/tracklog`.
pub fn tracklog_path(reference_locator: &str) -> String {
    join!(reference_locator.trim_end_matches('/'), "/tracklog")
}

/// Parse a track log table into points, in page order.
///
/// A "no data" page gives an empty set. Rows without a usable position are
/// skipped. Missing speed or altitude reads as 0 (aircraft on the ground).
/// A time cell that is not a clock time falls back to the row index.
pub fn parse_tracklog(doc: &str) -> Result<Vec<TrackPoint>> {
    let rows = match parse_table(doc, &TRACKLOG)? {
        TableParse::NoData => return Ok(Vec::new()),
        TableParse::Rows(rows) => rows,
    };

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for (i, raw) in rows.enumerate() {
        match point(&raw, i as u32) {
            Some(p) => points.push(p),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        logd!("tracklog: {} rows without position skipped", skipped);
    }
    Ok(points)
}

fn point(raw: &RawRow, index: u32) -> Option<TrackPoint> {
    let cell = |name: &str| TRACKLOG.column(name).and_then(|i| raw.cells.get(i));

    let latitude = parse_coord(cell("latitude")?)?;
    let longitude = parse_coord(cell("longitude")?)?;

    let sample_time = cell("time")
        .and_then(|t| clock_token(t))
        .and_then(|tok| to_24_hour(&tok).ok())
        .and_then(|t24| parse_time(&t24).ok())
        .map(SampleTime::Clock)
        .unwrap_or(SampleTime::Index(index));

    Some(TrackPoint {
        sample_time,
        latitude,
        longitude,
        ground_speed: cell("knots").and_then(|c| parse_int(c)).unwrap_or(0),
        altitude: cell("altitude").and_then(|c| parse_int(c)).unwrap_or(0),
    })
}
