// src/identity.rs
//
// Canonical leg key: `YYYY_MM_DD__orig_dest__HH`.
// Used as the dedup key and as the name of the leg's track partition.

use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::core::sanitize::is_safe_file_stem;
use crate::model::{FlightLeg, Route};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegIdentity(String);

impl LegIdentity {
    pub fn new(date: NaiveDate, route: &Route, departure: NaiveTime) -> Self {
        Self(format_key(date, route, departure.hour()))
    }

    pub fn of(leg: &FlightLeg) -> Self {
        Self::new(leg.date, &leg.route, leg.departure_time)
    }

    /// Accept a key written out as text. Rejects anything
    /// the builder could not have produced.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split("__");
        let (date, route, hour) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || !is_safe_file_stem(s) {
            return None;
        }
        NaiveDate::parse_from_str(date, "%Y_%m_%d").ok()?;
        if hour.len() != 2 || hour.parse::<u32>().ok()? > 23 {
            return None;
        }
        let (o, d) = route.split_once('_')?;
        if o.is_empty() || d.is_empty() || route.chars().any(|c| c.is_ascii_uppercase()) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LegIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn format_key(date: NaiveDate, route: &Route, hour: u32) -> String {
    let route_part = join!(&key_code(&route.origin), "_", &key_code(&route.dest));
    format!("{}__{}__{:02}", date.format("%Y_%m_%d"), route_part, hour)
}

/// Lowercase letters and digits only, so every key is a safe file stem.
fn key_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn key_table() {
        let cases = [
            (d(2022, 7, 22), Route::new("MO3", "KOJC"), t(20, 0), "2022_07_22__mo3_kojc__20"),
            (d(2022, 1, 5), Route::new("KLXT", "KOJC"), t(0, 15), "2022_01_05__klxt_kojc__00"),
            (d(2023, 12, 31), Route::new("KOJC", "UNKNOWN"), t(9, 59), "2023_12_31__kojc_unknown__09"),
        ];
        for (date, route, dep, want) in cases {
            assert_eq!(LegIdentity::new(date, &route, dep).as_str(), want);
        }
    }

    #[test]
    fn same_inputs_same_key() {
        let r = Route::new("MO3", "KOJC");
        let a = LegIdentity::new(d(2022, 7, 22), &r, t(20, 0));
        let b = LegIdentity::new(d(2022, 7, 22), &r.clone(), t(20, 45));
        assert_eq!(a, b, "minutes do not take part in the key");
    }

    #[test]
    fn each_field_changes_key() {
        let base_route = Route::new("MO3", "KOJC");
        let base = LegIdentity::new(d(2022, 7, 22), &base_route, t(20, 0));

        for day in 1..=28 {
            for hour in 0..24 {
                let k = LegIdentity::new(d(2022, 7, day), &base_route, t(hour, 0));
                assert_eq!(k == base, day == 22 && hour == 20);
            }
        }
        assert_ne!(base, LegIdentity::new(d(2022, 7, 22), &Route::new("KOJC", "MO3"), t(20, 0)));
        assert_ne!(base, LegIdentity::new(d(2022, 7, 22), &Route::new("MO3", "KLXT"), t(20, 0)));
        assert_ne!(base, LegIdentity::new(d(2021, 7, 22), &base_route, t(20, 0)));
    }

    #[test]
    fn keys_are_file_stems() {
        let k = LegIdentity::new(d(2022, 7, 22), &Route::new("K/MKC", "KO JC"), t(20, 0));
        assert_eq!(k.as_str(), "2022_07_22__kmkc_kojc__20");
        assert!(is_safe_file_stem(k.as_str()));
    }

    #[test]
    fn parse_round_trip_and_rejects() {
        let k = LegIdentity::new(d(2022, 7, 22), &Route::new("MO3", "KOJC"), t(20, 0));
        assert_eq!(LegIdentity::parse(k.as_str()), Some(k));
        for bad in [
            "2022_07_22__mo3_kojc",
            "2022_07_22__mo3_kojc__24",
            "2022_13_22__mo3_kojc__20",
            "2022_07_22__MO3_KOJC__20",
            "2022_07_22__mo3kojc__20",
            "../x__a_b__01",
            "2022_07_22__mo3_kojc__20__x",
        ] {
            assert_eq!(LegIdentity::parse(bad), None, "accepted {bad}");
        }
    }
}
