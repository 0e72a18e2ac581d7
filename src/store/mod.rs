// src/store/mod.rs
//! Persistence gateway.
//!
//! One leg table per aircraft, one track table per leg (named by its
//! `LegIdentity`), and one checkpoint per aircraft. The sync engine only ever
//! talks to the `Gateway` trait; `CsvStore` keeps everything as files under
//! `.store/`, `MemoryStore` keeps it in RAM.
//!
//! Leg tables are append-only apart from the local flag. Every append is
//! followed by `distinct_merge_legs`, which rewrites the table keeping the
//! first row of each `(date, route, departure_time, reference_locator)` tuple.

mod csv_store;
mod memory;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};

use crate::identity::LegIdentity;
use crate::model::{AircraftCheckpoint, AircraftId, FlightLeg, Route, TrackPoint};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Replace,
}

pub trait Gateway {
    fn create_leg_table_if_absent(&mut self, aircraft: &AircraftId) -> Result<()>;

    /// Append rows as-is. Callers follow up with `distinct_merge_legs`.
    fn append_legs(&mut self, aircraft: &AircraftId, legs: &[FlightLeg]) -> Result<()>;

    /// Rewrite the leg table without duplicate tuples. Returns the row count afterwards.
    fn distinct_merge_legs(&mut self, aircraft: &AircraftId) -> Result<usize>;

    /// All stored legs, in table order. An absent table reads as empty.
    fn load_legs(&self, aircraft: &AircraftId) -> Result<Vec<FlightLeg>>;

    fn list_leg_keys(&self, aircraft: &AircraftId) -> Result<HashSet<LegIdentity>> {
        Ok(self.load_legs(aircraft)?.iter().map(LegIdentity::of).collect())
    }

    fn create_track_table(&mut self, aircraft: &AircraftId, key: &LegIdentity) -> Result<()>;

    /// Returns how many points the table holds after the write.
    fn write_track_points(
        &mut self,
        aircraft: &AircraftId,
        key: &LegIdentity,
        points: &[TrackPoint],
        mode: WriteMode,
    ) -> Result<usize>;

    /// Points in stored order. An absent table reads as empty.
    fn read_track_points(&self, aircraft: &AircraftId, key: &LegIdentity) -> Result<Vec<TrackPoint>>;

    fn read_checkpoint(&self, aircraft: &AircraftId) -> Result<Option<NaiveDate>>;

    fn write_checkpoint(&mut self, aircraft: &AircraftId, date: NaiveDate) -> Result<()>;

    fn checkpoint(&self, aircraft: &AircraftId) -> Result<Option<AircraftCheckpoint>> {
        Ok(self.read_checkpoint(aircraft)?.map(|last_synced_date| AircraftCheckpoint {
            aircraft_id: aircraft.clone(),
            last_synced_date,
        }))
    }

    /// Set the local flag on every leg with this locator. Returns rows updated.
    fn set_local_flag(&mut self, aircraft: &AircraftId, locator: &str, local: bool) -> Result<usize>;

    /// `set_local_flag` for many locators at once. Stores that rewrite the
    /// whole leg table override this to rewrite it once.
    fn set_local_flags(&mut self, aircraft: &AircraftId, flags: &HashMap<String, bool>) -> Result<usize> {
        let mut updated = 0;
        for (locator, local) in flags {
            updated += self.set_local_flag(aircraft, locator, *local)?;
        }
        Ok(updated)
    }
}

type LegTuple<'a> = (NaiveDate, &'a Route, NaiveTime, &'a str);

fn tuple(leg: &FlightLeg) -> LegTuple<'_> {
    (leg.date, &leg.route, leg.departure_time, leg.reference_locator.as_str())
}

/// Keep the first leg of each distinct tuple, preserving order.
pub fn distinct_legs(legs: Vec<FlightLeg>) -> Vec<FlightLeg> {
    let mut seen: HashSet<(NaiveDate, Route, NaiveTime, String)> = HashSet::with_capacity(legs.len());
    legs.into_iter()
        .filter(|leg| {
            let (d, r, t, l) = tuple(leg);
            seen.insert((d, r.clone(), t, l.to_string()))
        })
        .collect()
}
