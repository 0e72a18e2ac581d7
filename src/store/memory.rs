// src/store/memory.rs

use std::collections::HashMap;

use chrono::NaiveDate;

use super::{distinct_legs, Gateway, WriteMode};
use crate::error::persistence_error;
use crate::identity::LegIdentity;
use crate::model::{AircraftId, FlightLeg, TrackPoint};
use crate::Result;

#[derive(Clone, Debug, Default)]
struct Partition {
    legs: Option<Vec<FlightLeg>>,
    tracks: HashMap<LegIdentity, Vec<TrackPoint>>,
    checkpoint: Option<NaiveDate>,
}

/// In-memory gateway for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    partitions: HashMap<AircraftId, Partition>,
    /// Drop the last point of every track write, to exercise count checks.
    short_track_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose track writes come up one point short.
    pub fn with_short_track_writes() -> Self {
        Self { short_track_writes: true, ..Self::default() }
    }

    fn part(&self, aircraft: &AircraftId) -> Option<&Partition> {
        self.partitions.get(aircraft)
    }

    fn part_mut(&mut self, aircraft: &AircraftId) -> &mut Partition {
        self.partitions.entry(aircraft.clone()).or_default()
    }

    fn legs_mut(&mut self, aircraft: &AircraftId) -> Result<&mut Vec<FlightLeg>> {
        self.part_mut(aircraft)
            .legs
            .as_mut()
            .ok_or_else(|| persistence_error!("leg table missing for {}", aircraft))
    }
}

impl Gateway for MemoryStore {
    fn create_leg_table_if_absent(&mut self, aircraft: &AircraftId) -> Result<()> {
        self.part_mut(aircraft).legs.get_or_insert_with(Vec::new);
        Ok(())
    }

    fn append_legs(&mut self, aircraft: &AircraftId, legs: &[FlightLeg]) -> Result<()> {
        self.legs_mut(aircraft)?.extend_from_slice(legs);
        Ok(())
    }

    fn distinct_merge_legs(&mut self, aircraft: &AircraftId) -> Result<usize> {
        let legs = self.legs_mut(aircraft)?;
        *legs = distinct_legs(std::mem::take(legs));
        Ok(legs.len())
    }

    fn load_legs(&self, aircraft: &AircraftId) -> Result<Vec<FlightLeg>> {
        Ok(self.part(aircraft).and_then(|p| p.legs.clone()).unwrap_or_default())
    }

    fn create_track_table(&mut self, aircraft: &AircraftId, key: &LegIdentity) -> Result<()> {
        self.part_mut(aircraft).tracks.entry(key.clone()).or_default();
        Ok(())
    }

    fn write_track_points(
        &mut self,
        aircraft: &AircraftId,
        key: &LegIdentity,
        points: &[TrackPoint],
        mode: WriteMode,
    ) -> Result<usize> {
        let short = self.short_track_writes;
        let table = self
            .part_mut(aircraft)
            .tracks
            .get_mut(key)
            .ok_or_else(|| persistence_error!("track table missing: {}", key))?;
        if mode == WriteMode::Replace {
            table.clear();
        }
        let take = if short { points.len().saturating_sub(1) } else { points.len() };
        table.extend_from_slice(&points[..take]);
        Ok(table.len())
    }

    fn read_track_points(&self, aircraft: &AircraftId, key: &LegIdentity) -> Result<Vec<TrackPoint>> {
        Ok(self
            .part(aircraft)
            .and_then(|p| p.tracks.get(key).cloned())
            .unwrap_or_default())
    }

    fn read_checkpoint(&self, aircraft: &AircraftId) -> Result<Option<NaiveDate>> {
        Ok(self.part(aircraft).and_then(|p| p.checkpoint))
    }

    fn write_checkpoint(&mut self, aircraft: &AircraftId, date: NaiveDate) -> Result<()> {
        self.part_mut(aircraft).checkpoint = Some(date);
        Ok(())
    }

    fn set_local_flag(&mut self, aircraft: &AircraftId, locator: &str, local: bool) -> Result<usize> {
        let Some(legs) = self.part_mut(aircraft).legs.as_mut() else {
            return Ok(0);
        };
        let mut updated = 0;
        for leg in legs.iter_mut().filter(|l| l.reference_locator == locator) {
            leg.local_flag = Some(local);
            updated += 1;
        }
        Ok(updated)
    }
}
