// src/model.rs
//
// Domain records shared by the parser, sync engine, store and classifier.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::sanitize::is_safe_file_stem;
use crate::{Error, Result};

/// Tail number. Kept lowercase, which is also the store partition name;
/// `as_site()` gives the uppercase form used in source paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AircraftId(String);

impl AircraftId {
    pub fn new(tail: &str) -> Result<Self> {
        let t = tail.trim().to_ascii_lowercase();
        if !is_safe_file_stem(&t) {
            return Err(Error::Config(format!("invalid tail number: '{tail}'")));
        }
        Ok(Self(t))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_site(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_site())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route {
    pub origin: String,
    pub dest: String,
}

impl Route {
    pub fn new(origin: impl Into<String>, dest: impl Into<String>) -> Self {
        Self { origin: origin.into(), dest: dest.into() }
    }

    /// `ORIG-DEST`, the form kept in the leg table.
    pub fn display(&self) -> String {
        join!(&self.origin, "-", &self.dest)
    }

    /// Parse the stored `ORIG-DEST` form. Splits on the first hyphen.
    pub fn parse(s: &str) -> Option<Self> {
        let (o, d) = s.split_once('-')?;
        if o.is_empty() || d.is_empty() {
            return None;
        }
        Some(Self::new(o, d))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.dest)
    }
}

/// One scraped flight. Only `local_flag` changes after commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightLeg {
    pub date: NaiveDate,
    pub route: Route,
    pub departure_time: NaiveTime,
    /// Elapsed minutes, if the site reported one.
    pub duration: Option<u32>,
    pub reference_locator: String,
    pub local_flag: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SampleTime {
    Clock(NaiveTime),
    /// Row position when the time cell could not be read.
    Index(u32),
}

impl fmt::Display for SampleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleTime::Clock(t) => write!(f, "{}", t.format("%H:%M:%S")),
            SampleTime::Index(i) => write!(f, "#{i}"),
        }
    }
}

impl SampleTime {
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(i) = s.strip_prefix('#') {
            return i.parse().ok().map(SampleTime::Index);
        }
        NaiveTime::parse_from_str(s, "%H:%M:%S").ok().map(SampleTime::Clock)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackPoint {
    pub sample_time: SampleTime,
    pub latitude: f64,
    pub longitude: f64,
    /// Knots.
    pub ground_speed: i32,
    /// Feet.
    pub altitude: i32,
}

impl TrackPoint {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AircraftCheckpoint {
    pub aircraft_id: AircraftId,
    pub last_synced_date: NaiveDate,
}
