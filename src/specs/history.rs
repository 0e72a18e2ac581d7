// src/specs/history.rs

use chrono::{NaiveDate, NaiveTime};

use crate::error::format_error;
use crate::model::{AircraftId, FlightLeg, Route};
use crate::normalize::{
    airport_cell, clock_token, parse_date, parse_duration, parse_time, to_24_hour, AirportCell,
};
use crate::resolve::{resolve_or_unknown, AirportResolver};
use crate::table::{parse_table, RawRow, TableParse, HISTORY};
use crate::config::consts::UNKNOWN_AIRPORT;
use crate::Result;

/// `/live/flight/{TAIL}/history/{lookback}`
pub fn history_path(aircraft: &AircraftId, lookback: u32) -> String {
    format!("/live/flight/{}/history/{}", aircraft.as_site(), lookback)
}

/// A history row with dates and times normalized but airports not yet resolved,
/// so rows that are going to be discarded never reach the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub duration: Option<u32>,
    pub origin: AirportCell,
    pub dest: AirportCell,
    pub reference_locator: String,
}

impl HistoryRow {
    pub fn into_leg(self, resolver: &mut dyn AirportResolver) -> FlightLeg {
        let origin = code_for(self.origin, resolver, &self.reference_locator, true);
        let dest = code_for(self.dest, resolver, &self.reference_locator, false);
        FlightLeg {
            date: self.date,
            route: Route::new(origin, dest),
            departure_time: self.departure_time,
            duration: self.duration,
            reference_locator: self.reference_locator,
            local_flag: None,
        }
    }
}

fn code_for(
    cell: AirportCell,
    resolver: &mut dyn AirportResolver,
    locator: &str,
    is_origin: bool,
) -> String {
    match cell {
        AirportCell::Code(code) => code,
        AirportCell::UnknownLocation => resolve_or_unknown(resolver, locator, is_origin),
        AirportCell::Missing => s!(UNKNOWN_AIRPORT),
    }
}

#[derive(Debug)]
pub enum HistoryPage {
    NoData,
    Rows(Vec<HistoryRow>),
}

/// Parse the history table.
///
/// - Missing table: `Error::Structure`.
/// - Unreadable date or departure time: `Error::Format` (the page layout changed).
/// - Rows without a flight link are skipped; there is nothing to fetch for them.
pub fn parse_history(doc: &str) -> Result<HistoryPage> {
    let rows = match parse_table(doc, &HISTORY)? {
        TableParse::NoData => return Ok(HistoryPage::NoData),
        TableParse::Rows(rows) => rows,
    };

    let mut out = Vec::new();
    for raw in rows {
        let Some(locator) = raw.href.clone() else {
            logd!("history: row without flight link skipped: {:?}", raw.cells);
            continue;
        };

        let date = parse_date(cell(&raw, "date"))?;
        let departure = cell(&raw, "departure");
        let token = clock_token(departure)
            .ok_or_else(|| format_error!("departure '{}' has no clock time", departure))?;
        let departure_time = parse_time(&to_24_hour(&token)?)?;

        out.push(HistoryRow {
            date,
            departure_time,
            duration: parse_duration(cell(&raw, "duration")),
            origin: airport_cell(cell(&raw, "origin")),
            dest: airport_cell(cell(&raw, "destination")),
            reference_locator: locator,
        });
    }
    logd!("history: {} rows", out.len());
    Ok(HistoryPage::Rows(out))
}

fn cell<'r>(raw: &'r RawRow, name: &str) -> &'r str {
    HISTORY.column(name).and_then(|i| raw.cells.get(i)).map_or("", String::as_str)
}
