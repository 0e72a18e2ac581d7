// src/normalize.rs
//
// Pure conversions from scraped cell text to canonical forms.
// Date and time failures are `Error::Format`: they mean the page layout
// changed, not that one row is missing data.

use chrono::{NaiveDate, NaiveTime};

use crate::error::format_error;
use crate::Result;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Cell text that marks an airport the site could not pin down.
const UNKNOWN_LOCATION_MARKERS: [&str; 2] = ["near ", "unknown"];

/// `"08:00PM"` → `"20:00"`, `"12:15AM"` → `"00:15"`.
///
/// Accepts an optional space before the suffix and single-digit hours
/// (zero-padded in the output). Seconds, if present, are kept.
/// Anything not ending in AM/PM is rejected.
pub fn to_24_hour(time12: &str) -> Result<String> {
    let t = time12.trim();
    let upper = t.to_ascii_uppercase();

    let pm = if upper.ends_with("PM") {
        true
    } else if upper.ends_with("AM") {
        false
    } else {
        return Err(format_error!("time '{}' has no AM/PM suffix", time12));
    };
    let body = t[..t.len() - 2].trim_end();

    let (hour_str, rest) = body
        .find(':')
        .map(|i| body.split_at(i))
        .ok_or_else(|| format_error!("time '{}' has no minutes", time12))?;

    if hour_str.is_empty()
        || hour_str.len() > 2
        || !hour_str.bytes().all(|b| b.is_ascii_digit())
        || rest.len() < 3
        || !rest.bytes().all(|b| b.is_ascii_digit() || b == b':')
    {
        return Err(format_error!("time '{}' is not H:MM[:SS]", time12));
    }

    let hour: u32 = hour_str
        .parse()
        .map_err(|_| format_error!("time '{}' has a bad hour", time12))?;
    if !(1..=12).contains(&hour) {
        return Err(format_error!("time '{}' hour out of range", time12));
    }

    let hour24 = match (pm, hour) {
        (false, 12) => 0,
        (false, h) => h,
        (true, 12) => 12,
        (true, h) => h + 12,
    };
    Ok(format!("{hour24:02}{rest}"))
}

/// `"17-JUL-2022"` → `"2022-07-17"`. Month abbreviations are case-insensitive.
pub fn normalize_date(dd_mon_yyyy: &str) -> Result<String> {
    let s = dd_mon_yyyy.trim();
    if s.len() != 11 || !s.is_ascii() {
        return Err(format_error!("date '{}' is not DD-MON-YYYY", dd_mon_yyyy));
    }
    let b = s.as_bytes();
    if b[2] != b'-' || b[6] != b'-' {
        return Err(format_error!("date '{}' is not DD-MON-YYYY", dd_mon_yyyy));
    }
    let (day, mon, year) = (&s[0..2], &s[3..6], &s[7..11]);
    if !day.bytes().chain(year.bytes()).all(|c| c.is_ascii_digit()) {
        return Err(format_error!("date '{}' has non-numeric day or year", dd_mon_yyyy));
    }

    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(mon))
        .ok_or_else(|| format_error!("date '{}' has unknown month '{}'", dd_mon_yyyy, mon))?;

    Ok(format!("{year}-{:02}-{day}", month + 1))
}

/// `normalize_date` into a calendar date. Impossible days (31-FEB) are format errors too.
pub fn parse_date(dd_mon_yyyy: &str) -> Result<NaiveDate> {
    let iso = normalize_date(dd_mon_yyyy)?;
    NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
        .map_err(|e| format_error!("date '{}': {}", dd_mon_yyyy, e))
}

/// Time of day from a normalized `HH:MM` or `HH:MM:SS` string.
pub fn parse_time(hh_mm: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(hh_mm, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(hh_mm, "%H:%M"))
        .map_err(|e| format_error!("time '{}': {}", hh_mm, e))
}

/// Text strictly between the first `(` and its matching `)`.
pub fn extract_between_parens(text: &str) -> Option<&str> {
    let open = text.find('(')?;
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// What an origin/destination cell told us about the airport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AirportCell {
    Code(String),
    /// "Near Kansas City, MO" and friends; ask the resolver.
    UnknownLocation,
    /// No code and no marker.
    Missing,
}

pub fn airport_cell(text: &str) -> AirportCell {
    let lc = text.trim().to_ascii_lowercase();
    if UNKNOWN_LOCATION_MARKERS.iter().any(|m| lc.starts_with(m) || lc.contains(&format!(" {m}"))) {
        return AirportCell::UnknownLocation;
    }
    match extract_between_parens(text).and_then(airport_code) {
        Some(code) => AirportCell::Code(code),
        None => AirportCell::Missing,
    }
}

/// Uppercased airport identifier, or `None` unless the text is ASCII letters
/// and digits only. Codes end up in leg keys and in the `ORIG-DEST` column.
pub fn airport_code(text: &str) -> Option<String> {
    let t = text.trim();
    let ok = !t.is_empty() && t.bytes().all(|b| b.is_ascii_alphanumeric());
    ok.then(|| t.to_ascii_uppercase())
}

/// First `H:MM[:SS] AM|PM` run inside a decorated cell, e.g.
/// `"Fri 07:03:21 PM CDT"` → `"07:03:21PM"`.
pub fn clock_token(text: &str) -> Option<String> {
    let b = text.as_bytes();
    let mut i = 0;
    while i < b.len() {
        if b[i].is_ascii_digit() && (i == 0 || !b[i - 1].is_ascii_digit()) {
            if let Some((tok, _end)) = clock_at(b, i) {
                return Some(tok);
            }
        }
        i += 1;
    }
    None
}

fn clock_at(b: &[u8], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    let mut body = String::new();
    while i < b.len() && (b[i].is_ascii_digit() || b[i] == b':') {
        body.push(b[i] as char);
        i += 1;
    }
    if !body.contains(':') {
        return None;
    }
    while i < b.len() && b[i] == b' ' {
        i += 1;
    }
    let suffix = b.get(i..i + 2)?;
    let suffix = std::str::from_utf8(suffix).ok()?.to_ascii_uppercase();
    if suffix != "AM" && suffix != "PM" {
        return None;
    }
    Some((join!(&body, &suffix), i + 2))
}

/// `"1:05"` → 65 minutes. Empty or dashed cells are `None`.
pub fn parse_duration(text: &str) -> Option<u32> {
    let t = text.trim();
    let (h, m) = t.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().get(..2)?.parse().ok()?;
    if m >= 60 {
        return None;
    }
    h.checked_mul(60)?.checked_add(m)
}

/// Leading signed integer, thousands separators allowed: `"2,500 ft"` → 2500.
pub fn parse_int(text: &str) -> Option<i32> {
    let t = text.trim();
    let mut out = String::with_capacity(t.len());
    for (i, ch) in t.chars().enumerate() {
        match ch {
            '-' | '+' | '\u{2212}' if i == 0 => {
                if ch != '+' {
                    out.push('-');
                }
            }
            '0'..='9' => out.push(ch),
            ',' => {}
            _ => break,
        }
    }
    out.parse().ok()
}

/// Decimal degrees.
pub fn parse_coord(text: &str) -> Option<f64> {
    let v: f64 = text.trim().replace('\u{2212}', "-").parse().ok()?;
    v.is_finite().then_some(v)
}
