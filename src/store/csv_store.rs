// src/store/csv_store.rs
//
// Layout under the store root:
//   <tail>/legs.csv
//   <tail>/tracks/<leg key>.csv
//   <tail>/checkpoint

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{distinct_legs, Gateway, WriteMode};
use crate::error::persistence_error;
use crate::identity::LegIdentity;
use crate::model::{AircraftId, FlightLeg, Route, SampleTime, TrackPoint};
use crate::Result;

const LEG_HEADERS: [&str; 6] = ["date", "route", "dept_time", "duration", "url", "local"];
const TRACK_HEADERS: [&str; 5] = ["time", "latitude", "longitude", "ground_speed", "altitude"];

#[derive(Serialize, Deserialize)]
struct LegRecord {
    date: NaiveDate,
    route: String,
    dept_time: NaiveTime,
    duration: Option<u32>,
    url: String,
    local: Option<bool>,
}

impl From<&FlightLeg> for LegRecord {
    fn from(leg: &FlightLeg) -> Self {
        Self {
            date: leg.date,
            route: leg.route.display(),
            dept_time: leg.departure_time,
            duration: leg.duration,
            url: leg.reference_locator.clone(),
            local: leg.local_flag,
        }
    }
}

impl TryFrom<LegRecord> for FlightLeg {
    type Error = crate::Error;

    fn try_from(r: LegRecord) -> Result<Self> {
        let route = Route::parse(&r.route)
            .ok_or_else(|| persistence_error!("stored route '{}' is not ORIG-DEST", r.route))?;
        Ok(FlightLeg {
            date: r.date,
            route,
            departure_time: r.dept_time,
            duration: r.duration,
            reference_locator: r.url,
            local_flag: r.local,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct TrackRecord {
    time: String,
    latitude: f64,
    longitude: f64,
    ground_speed: i32,
    altitude: i32,
}

impl From<&TrackPoint> for TrackRecord {
    fn from(p: &TrackPoint) -> Self {
        Self {
            time: p.sample_time.to_string(),
            latitude: p.latitude,
            longitude: p.longitude,
            ground_speed: p.ground_speed,
            altitude: p.altitude,
        }
    }
}

impl TryFrom<TrackRecord> for TrackPoint {
    type Error = crate::Error;

    fn try_from(r: TrackRecord) -> Result<Self> {
        let sample_time = SampleTime::parse(&r.time)
            .ok_or_else(|| persistence_error!("stored sample time '{}' unreadable", r.time))?;
        Ok(TrackPoint {
            sample_time,
            latitude: r.latitude,
            longitude: r.longitude,
            ground_speed: r.ground_speed,
            altitude: r.altitude,
        })
    }
}

/// File-backed gateway. Rewrites go through a temp file and a rename.
#[derive(Clone, Debug)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_directory(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn aircraft_dir(&self, aircraft: &AircraftId) -> PathBuf {
        self.root.join(aircraft.as_str())
    }

    fn legs_path(&self, aircraft: &AircraftId) -> PathBuf {
        self.aircraft_dir(aircraft).join("legs.csv")
    }

    fn track_path(&self, aircraft: &AircraftId, key: &LegIdentity) -> PathBuf {
        self.aircraft_dir(aircraft).join("tracks").join(join!(key.as_str(), ".csv"))
    }

    fn checkpoint_path(&self, aircraft: &AircraftId) -> PathBuf {
        self.aircraft_dir(aircraft).join("checkpoint")
    }
}

impl Gateway for CsvStore {
    fn create_leg_table_if_absent(&mut self, aircraft: &AircraftId) -> Result<()> {
        let path = self.legs_path(aircraft);
        if !path.exists() {
            create_with_headers(&path, &LEG_HEADERS)?;
            logd!("store: created {}", path.display());
        }
        Ok(())
    }

    fn append_legs(&mut self, aircraft: &AircraftId, legs: &[FlightLeg]) -> Result<()> {
        let path = self.legs_path(aircraft);
        append_records(&path, legs.iter().map(LegRecord::from))
    }

    fn distinct_merge_legs(&mut self, aircraft: &AircraftId) -> Result<usize> {
        let path = self.legs_path(aircraft);
        let before = self.load_legs(aircraft)?;
        let n_before = before.len();
        let merged = distinct_legs(before);
        if merged.len() != n_before {
            rewrite(&path, &LEG_HEADERS, merged.iter().map(LegRecord::from))?;
            logd!("store: {} duplicate legs merged for {}", n_before - merged.len(), aircraft);
        }
        Ok(merged.len())
    }

    fn load_legs(&self, aircraft: &AircraftId) -> Result<Vec<FlightLeg>> {
        read_records::<LegRecord>(&self.legs_path(aircraft))?
            .into_iter()
            .map(FlightLeg::try_from)
            .collect()
    }

    fn create_track_table(&mut self, aircraft: &AircraftId, key: &LegIdentity) -> Result<()> {
        let path = self.track_path(aircraft, key);
        if !path.exists() {
            create_with_headers(&path, &TRACK_HEADERS)?;
        }
        Ok(())
    }

    fn write_track_points(
        &mut self,
        aircraft: &AircraftId,
        key: &LegIdentity,
        points: &[TrackPoint],
        mode: WriteMode,
    ) -> Result<usize> {
        let path = self.track_path(aircraft, key);
        match mode {
            WriteMode::Replace => rewrite(&path, &TRACK_HEADERS, points.iter().map(TrackRecord::from))?,
            WriteMode::Append => append_records(&path, points.iter().map(TrackRecord::from))?,
        }
        Ok(read_records::<TrackRecord>(&path)?.len())
    }

    fn read_track_points(&self, aircraft: &AircraftId, key: &LegIdentity) -> Result<Vec<TrackPoint>> {
        read_records::<TrackRecord>(&self.track_path(aircraft, key))?
            .into_iter()
            .map(TrackPoint::try_from)
            .collect()
    }

    fn read_checkpoint(&self, aircraft: &AircraftId) -> Result<Option<NaiveDate>> {
        let path = self.checkpoint_path(aircraft);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| persistence_error!("checkpoint {}: {}", path.display(), e))?;
        Ok(Some(date))
    }

    fn write_checkpoint(&mut self, aircraft: &AircraftId, date: NaiveDate) -> Result<()> {
        let path = self.checkpoint_path(aircraft);
        ensure_parent(&path)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, date.format("%Y-%m-%d").to_string())?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn set_local_flag(&mut self, aircraft: &AircraftId, locator: &str, local: bool) -> Result<usize> {
        let mut legs = self.load_legs(aircraft)?;
        let mut updated = 0;
        for leg in legs.iter_mut().filter(|l| l.reference_locator == locator) {
            leg.local_flag = Some(local);
            updated += 1;
        }
        if updated > 0 {
            rewrite(&self.legs_path(aircraft), &LEG_HEADERS, legs.iter().map(LegRecord::from))?;
        }
        Ok(updated)
    }

    fn set_local_flags(&mut self, aircraft: &AircraftId, flags: &HashMap<String, bool>) -> Result<usize> {
        let mut legs = self.load_legs(aircraft)?;
        let mut updated = 0;
        for leg in legs.iter_mut() {
            if let Some(local) = flags.get(&leg.reference_locator) {
                leg.local_flag = Some(*local);
                updated += 1;
            }
        }
        if updated > 0 {
            rewrite(&self.legs_path(aircraft), &LEG_HEADERS, legs.iter().map(LegRecord::from))?;
        }
        Ok(updated)
    }
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(persistence_error!("path exists but is not a directory: {}", dir.display()));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

fn create_with_headers(path: &Path, headers: &[&str]) -> Result<()> {
    ensure_parent(path)?;
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(headers)?;
    w.flush()?;
    Ok(())
}

/// Append to a table that must already exist.
fn append_records<R: Serialize>(path: &Path, records: impl Iterator<Item = R>) -> Result<()> {
    if !path.exists() {
        return Err(persistence_error!("table missing: {}", path.display()));
    }
    let file = OpenOptions::new().append(true).open(path)?;
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for r in records {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

fn rewrite<R: Serialize>(path: &Path, headers: &[&str], records: impl Iterator<Item = R>) -> Result<()> {
    ensure_parent(path)?;
    let tmp = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp)?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        w.write_record(headers)?;
        for r in records {
            w.serialize(r)?;
        }
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_records<R: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<R>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut r = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for rec in r.deserialize() {
        out.push(rec?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::{exercise_gateway, leg};

    #[test]
    fn gateway_contract() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::open(dir.path().join(".store")).unwrap();
        exercise_gateway(&mut store);
    }

    #[test]
    fn layout_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::open(dir.path()).unwrap();
        let n = AircraftId::new("N82145").unwrap();
        let a = leg((2022, 7, 22), ("MO3", "KOJC"), (20, 0), "/f/a");
        let key = LegIdentity::of(&a);

        store.create_leg_table_if_absent(&n).unwrap();
        store.append_legs(&n, &[a]).unwrap();
        store.create_track_table(&n, &key).unwrap();
        store.write_checkpoint(&n, NaiveDate::from_ymd_opt(2022, 7, 23).unwrap()).unwrap();

        let legs = fs::read_to_string(dir.path().join("n82145/legs.csv")).unwrap();
        assert_eq!(
            legs,
            "date,route,dept_time,duration,url,local\n2022-07-22,MO3-KOJC,20:00:00,41,/f/a,\n"
        );
        assert!(dir.path().join("n82145/tracks/2022_07_22__mo3_kojc__20.csv").exists());
        assert_eq!(fs::read_to_string(dir.path().join("n82145/checkpoint")).unwrap(), "2022-07-23");
    }

    #[test]
    fn append_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::open(dir.path()).unwrap();
        let n = AircraftId::new("n1").unwrap();
        let a = leg((2022, 7, 22), ("MO3", "KOJC"), (20, 0), "/f/a");
        assert!(matches!(store.append_legs(&n, &[a]), Err(crate::Error::Persistence(_))));
    }

    #[test]
    fn corrupt_checkpoint_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        let n = AircraftId::new("n1").unwrap();
        fs::create_dir_all(dir.path().join("n1")).unwrap();
        fs::write(dir.path().join("n1/checkpoint"), "yesterday").unwrap();
        assert!(matches!(store.read_checkpoint(&n), Err(crate::Error::Persistence(_))));
    }
}
