// src/sync.rs
//! Per-aircraft synchronization: scrape the history page, keep only legs the
//! store has not seen, fetch a track log for each, then commit.
//!
//! Phases run in order `Init → Fetched → Filtered → Delta → TrackFetch →
//! Committed`. No rows reach the leg or track tables before `Committed`,
//! so a run that fails earlier leaves stored data as it was.

use std::collections::HashSet;
use std::fmt;
use std::thread;

use chrono::{Datelike, NaiveDate};

use crate::config::AppOptions;
use crate::core::Fetch;
use crate::error::persistence_error;
use crate::identity::LegIdentity;
use crate::model::{AircraftId, FlightLeg, TrackPoint};
use crate::progress::Progress;
use crate::resolve::AirportResolver;
use crate::specs::history::{history_path, parse_history, HistoryPage};
use crate::specs::tracklog::{parse_tracklog, tracklog_path};
use crate::store::{Gateway, WriteMode};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPhase {
    Init,
    Fetched,
    Filtered,
    Delta,
    TrackFetch,
    Committed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Init => "init",
            SyncPhase::Fetched => "fetched",
            SyncPhase::Filtered => "filtered",
            SyncPhase::Delta => "delta",
            SyncPhase::TrackFetch => "track fetch",
            SyncPhase::Committed => "committed",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyncOutcome {
    /// The site has no history for this aircraft. Nothing was written.
    NoData,
    Synced(SyncReport),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::NoData => None,
            SyncOutcome::Synced(r) => Some(r),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncReport {
    pub aircraft: AircraftId,
    pub phase: SyncPhase,
    /// Rows read from the history page.
    pub candidates: usize,
    pub skipped_by_checkpoint: usize,
    pub skipped_by_month: usize,
    /// Keys already in the leg table.
    pub already_present: usize,
    /// Repeats of a key seen earlier in the same page.
    pub duplicates_in_scrape: usize,
    /// New legs, in page order.
    pub delta: Vec<LegIdentity>,
    /// Track sets written, with their point counts.
    pub committed_tracks: Vec<(LegIdentity, usize)>,
    /// Legs whose track log could not be read. They are still committed.
    pub failed: Vec<(LegIdentity, String)>,
    /// The checkpoint written by this run, if it advanced.
    pub checkpoint: Option<NaiveDate>,
}

impl SyncReport {
    fn new(aircraft: &AircraftId) -> Self {
        Self {
            aircraft: aircraft.clone(),
            phase: SyncPhase::Init,
            candidates: 0,
            skipped_by_checkpoint: 0,
            skipped_by_month: 0,
            already_present: 0,
            duplicates_in_scrape: 0,
            delta: Vec::new(),
            committed_tracks: Vec::new(),
            failed: Vec::new(),
            checkpoint: None,
        }
    }

    fn enter(&mut self, phase: SyncPhase, progress: Option<&mut (dyn Progress + '_)>) {
        self.phase = phase;
        logd!("sync {}: {}", self.aircraft, phase);
        if let Some(p) = progress {
            p.phase(phase);
        }
    }
}

/// Run one sync pass for `aircraft`. `today` becomes the new checkpoint.
///
/// Track-log failures that `Error::is_leg_recoverable` accepts are logged and
/// recorded; anything else aborts the run. The checkpoint advances even when
/// some track logs failed, and does not advance when a month filter is set.
pub fn sync_aircraft(
    fetch: &dyn Fetch,
    store: &mut dyn Gateway,
    resolver: &mut dyn AirportResolver,
    aircraft: &AircraftId,
    opts: &AppOptions,
    today: NaiveDate,
    mut progress: Option<&mut dyn Progress>,
) -> Result<SyncOutcome> {
    let mut report = SyncReport::new(aircraft);

    // ---------- Init ----------
    report.enter(SyncPhase::Init, progress.as_deref_mut());
    store.create_leg_table_if_absent(aircraft)?;
    let known = store.list_leg_keys(aircraft)?;
    let checkpoint = store.read_checkpoint(aircraft)?;

    // ---------- Fetched ----------
    let doc = fetch.get(&history_path(aircraft, opts.source.lookback))?;
    let rows = match parse_history(&doc)? {
        HistoryPage::NoData => {
            logf!("sync {}: no history data", aircraft);
            if let Some(p) = progress.as_deref_mut() {
                p.log(&format!("{aircraft}: no history data"));
                p.finish();
            }
            return Ok(SyncOutcome::NoData);
        }
        HistoryPage::Rows(rows) => rows,
    };
    report.enter(SyncPhase::Fetched, progress.as_deref_mut());
    report.candidates = rows.len();

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if checkpoint.is_some_and(|cp| row.date < cp) {
            report.skipped_by_checkpoint += 1;
        } else if opts.sync.month.is_some_and(|m| row.date.month() != m) {
            report.skipped_by_month += 1;
        } else {
            kept.push(row);
        }
    }

    // ---------- Filtered ----------
    report.enter(SyncPhase::Filtered, progress.as_deref_mut());
    let mut seen: HashSet<LegIdentity> = HashSet::new();
    let mut delta: Vec<(LegIdentity, FlightLeg)> = Vec::new();
    for row in kept {
        let leg = row.into_leg(resolver);
        let key = LegIdentity::of(&leg);
        if known.contains(&key) {
            report.already_present += 1;
        } else if !seen.insert(key.clone()) {
            report.duplicates_in_scrape += 1;
        } else {
            delta.push((key, leg));
        }
    }

    // ---------- Delta ----------
    report.enter(SyncPhase::Delta, progress.as_deref_mut());
    report.delta = delta.iter().map(|(k, _)| k.clone()).collect();
    logf!(
        "sync {}: {} candidates, {} before checkpoint, {} other month, {} known, {} new",
        aircraft,
        report.candidates,
        report.skipped_by_checkpoint,
        report.skipped_by_month,
        report.already_present,
        delta.len()
    );

    // ---------- TrackFetch ----------
    let mut tracks: Vec<(LegIdentity, Vec<TrackPoint>)> = Vec::with_capacity(delta.len());
    if !delta.is_empty() {
        report.enter(SyncPhase::TrackFetch, progress.as_deref_mut());
        if let Some(p) = progress.as_deref_mut() {
            p.begin(delta.len());
        }
        let pause = opts.sync.request_pause();
        for (i, (key, leg)) in delta.iter().enumerate() {
            if i > 0 && !pause.is_zero() {
                thread::sleep(pause);
            }
            let got = fetch
                .get(&tracklog_path(&leg.reference_locator))
                .and_then(|doc| parse_tracklog(&doc));
            match got {
                Ok(points) => {
                    logd!("sync {}: {} -> {} points", aircraft, key, points.len());
                    if let Some(p) = progress.as_deref_mut() {
                        p.item_done(key);
                    }
                    tracks.push((key.clone(), points));
                }
                Err(e) if e.is_leg_recoverable() => {
                    logw!("sync {}: track log for {} skipped: {}", aircraft, key, e);
                    let reason = e.to_string();
                    if let Some(p) = progress.as_deref_mut() {
                        p.item_failed(key, &reason);
                    }
                    report.failed.push((key.clone(), reason));
                }
                Err(e) => {
                    loge!("sync {}: track log for {} failed, run aborted: {}", aircraft, key, e);
                    return Err(e);
                }
            }
        }
    }

    // ---------- Committed ----------
    if !delta.is_empty() {
        let legs: Vec<FlightLeg> = delta.into_iter().map(|(_, leg)| leg).collect();
        store.append_legs(aircraft, &legs)?;
        store.distinct_merge_legs(aircraft)?;

        let stored = store.list_leg_keys(aircraft)?;
        if let Some(missing) = report.delta.iter().find(|k| !stored.contains(*k)) {
            return Err(persistence_error!("leg {} missing after commit", missing));
        }

        for (key, points) in tracks {
            store.create_track_table(aircraft, &key)?;
            let n = store.write_track_points(aircraft, &key, &points, WriteMode::Replace)?;
            if n != points.len() {
                return Err(persistence_error!(
                    "track {} holds {} points, expected {}",
                    key,
                    n,
                    points.len()
                ));
            }
            report.committed_tracks.push((key, n));
        }
    }

    if opts.sync.month.is_none() {
        store.write_checkpoint(aircraft, today)?;
        report.checkpoint = Some(today);
    }
    report.enter(SyncPhase::Committed, progress.as_deref_mut());
    logf!(
        "sync {}: committed {} legs, {} track sets, {} failed",
        aircraft,
        report.delta.len(),
        report.committed_tracks.len(),
        report.failed.len()
    );
    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    Ok(SyncOutcome::Synced(report))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resolve::SentinelResolver;
    use crate::store::MemoryStore;
    use crate::Error;

    struct Pages(HashMap<String, String>);

    impl Fetch for Pages {
        fn get(&self, path: &str) -> Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Connectivity(format!("HTTP 404 for {path}")))
        }
    }

    const TAIL: &str = "n82145";

    fn locator(day: u32, orig: &str, dest: &str) -> String {
        format!("/live/flight/N82145/history/202207{day:02}/0100Z/{orig}/{dest}")
    }

    fn history(rows: &[(u32, &str, &str, &str)]) -> String {
        let trs: String = rows
            .iter()
            .map(|(day, orig, dest, dep)| {
                format!(
                    r#"<tr><td><a href="{}">{day:02}-Jul-2022</a></td><td>C172</td><td>({orig})</td><td>({dest})</td><td>{dep}</td><td>9:00PM</td><td>0:41</td></tr>"#,
                    locator(*day, orig, dest)
                )
            })
            .collect();
        format!(
            r#"<table class="prettyTable fullWidth"><tr><th>Date</th><th>Aircraft</th><th>Origin</th><th>Destination</th><th>Departure</th><th>Arrival</th><th>Duration</th></tr>{trs}</table>"#
        )
    }

    fn tracklog(n: usize) -> String {
        let trs: String = (0..n)
            .map(|i| {
                format!(
                    "<tr><td>Fri 07:0{i}:00 PM</td><td>38.9{i}</td><td>-94.3{i}</td><td>45</td><td>100</td><td>115</td><td>2,000</td><td></td><td>ADS-B</td></tr>"
                )
            })
            .collect();
        format!(
            r#"<table id="tracklogTable"><tr><th>Time</th></tr>{trs}<tr><td colspan=9>Summary</td></tr></table>"#
        )
    }

    fn pages(history_rows: &[(u32, &str, &str, &str)], broken: &[(u32, &str, &str)]) -> Pages {
        let mut map = HashMap::new();
        map.insert(s!("/live/flight/N82145/history/80"), history(history_rows));
        for (day, orig, dest, _) in history_rows {
            if !broken.iter().any(|b| b == &(*day, *orig, *dest)) {
                map.insert(join!(&locator(*day, orig, dest), "/tracklog"), tracklog(3));
            }
        }
        Pages(map)
    }

    fn opts() -> AppOptions {
        let mut o = AppOptions::default();
        o.sync.request_pause_ms = 0;
        o
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 7, d).unwrap()
    }

    fn run(fetch: &Pages, store: &mut MemoryStore, opts: &AppOptions) -> Result<SyncOutcome> {
        run_on(fetch, store, opts, day(25))
    }

    fn run_on(fetch: &Pages, store: &mut MemoryStore, opts: &AppOptions, today: NaiveDate) -> Result<SyncOutcome> {
        let id = AircraftId::new(TAIL).unwrap();
        sync_aircraft(fetch, store, &mut SentinelResolver, &id, opts, today, None)
    }

    fn key(s: &str) -> LegIdentity {
        LegIdentity::parse(s).unwrap()
    }

    const A: (u32, &str, &str, &str) = (20, "MO3", "KOJC", "8:00PM");
    const B: (u32, &str, &str, &str) = (21, "KOJC", "KLXT", "10:15AM");
    const C: (u32, &str, &str, &str) = (22, "KLXT", "MO3", "1:30PM");

    #[test]
    fn delta_is_only_new_legs() {
        let mut store = MemoryStore::new();
        // Checkpoint lands on A's date, so A and B reach the key filter next time.
        run_on(&pages(&[A, B], &[]), &mut store, &opts(), day(20)).unwrap();

        let out = run(&pages(&[A, B, C], &[]), &mut store, &opts()).unwrap();
        let r = out.report().unwrap();
        assert_eq!(r.skipped_by_checkpoint, 0);
        assert_eq!(r.already_present, 2);
        assert_eq!(r.delta, vec![key("2022_07_22__klxt_mo3__13")]);
        assert_eq!(r.committed_tracks, vec![(key("2022_07_22__klxt_mo3__13"), 3)]);
        assert_eq!(r.phase, SyncPhase::Committed);
    }

    #[test]
    fn second_run_is_idempotent() {
        let mut store = MemoryStore::new();
        let p = pages(&[A, B, C], &[]);
        let first = run(&p, &mut store, &opts()).unwrap();
        assert_eq!(first.report().unwrap().delta.len(), 3);

        let second = run(&p, &mut store, &opts()).unwrap();
        let r = second.report().unwrap();
        assert!(r.delta.is_empty());
        assert_eq!(r.checkpoint, Some(day(25)));

        let id = AircraftId::new(TAIL).unwrap();
        assert_eq!(store.load_legs(&id).unwrap().len(), 3);
    }

    #[test]
    fn same_day_rerun_is_deduplicated_by_key() {
        let mut store = MemoryStore::new();
        let p = pages(&[A, B, C], &[]);
        run_on(&p, &mut store, &opts(), day(20)).unwrap();

        let out = run_on(&p, &mut store, &opts(), day(20)).unwrap();
        let r = out.report().unwrap();
        assert_eq!(r.skipped_by_checkpoint, 0);
        assert_eq!(r.already_present, 3);
        assert!(r.delta.is_empty());
        assert!(r.committed_tracks.is_empty());

        let id = AircraftId::new(TAIL).unwrap();
        assert_eq!(store.load_legs(&id).unwrap().len(), 3);
    }

    #[test]
    fn checkpoint_drops_strictly_earlier_dates() {
        let mut store = MemoryStore::new();
        let id = AircraftId::new(TAIL).unwrap();
        store.write_checkpoint(&id, day(21)).unwrap();

        let out = run(&pages(&[A, B, C], &[]), &mut store, &opts()).unwrap();
        let r = out.report().unwrap();
        assert_eq!(r.candidates, 3);
        assert_eq!(r.skipped_by_checkpoint, 1);
        assert_eq!(r.delta.len(), 2);
        assert_eq!(store.read_checkpoint(&id).unwrap(), Some(day(25)));
    }

    #[test]
    fn broken_track_log_does_not_stop_the_batch() {
        let mut store = MemoryStore::new();
        let out = run(&pages(&[A, B, C], &[(21, "KOJC", "KLXT")]), &mut store, &opts()).unwrap();
        let r = out.report().unwrap();

        let b = key("2022_07_21__kojc_klxt__10");
        assert_eq!(r.failed.len(), 1);
        assert_eq!(r.failed[0].0, b);
        assert_eq!(r.committed_tracks.len(), 2);
        assert_eq!(r.checkpoint, Some(day(25)));

        let id = AircraftId::new(TAIL).unwrap();
        assert!(store.list_leg_keys(&id).unwrap().contains(&b));
        assert!(store.read_track_points(&id, &b).unwrap().is_empty());
    }

    #[test]
    fn repeated_rows_in_one_page_collapse() {
        let mut store = MemoryStore::new();
        let out = run(&pages(&[A, A, B], &[]), &mut store, &opts()).unwrap();
        let r = out.report().unwrap();
        assert_eq!(r.duplicates_in_scrape, 1);
        assert_eq!(r.delta.len(), 2);
    }

    #[test]
    fn no_history_leaves_checkpoint() {
        let mut store = MemoryStore::new();
        let mut map = HashMap::new();
        map.insert(
            s!("/live/flight/N82145/history/80"),
            s!(r#"<table class="prettyTable fullWidth"><tr><td>No History Data</td></tr></table>"#),
        );
        let out = run(&Pages(map), &mut store, &opts()).unwrap();
        assert_eq!(out, SyncOutcome::NoData);
        let id = AircraftId::new(TAIL).unwrap();
        assert_eq!(store.read_checkpoint(&id).unwrap(), None);
    }

    #[test]
    fn month_filter_keeps_checkpoint() {
        let mut store = MemoryStore::new();
        let mut o = opts();
        o.sync.month = Some(6);
        let out = run(&pages(&[A, B], &[]), &mut store, &o).unwrap();
        let r = out.report().unwrap();
        assert_eq!(r.skipped_by_month, 2);
        assert!(r.delta.is_empty());
        assert_eq!(r.checkpoint, None);
    }

    #[test]
    fn history_failure_is_fatal_and_writes_nothing() {
        let mut store = MemoryStore::new();
        let err = run(&Pages(HashMap::new()), &mut store, &opts()).unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)));
        let id = AircraftId::new(TAIL).unwrap();
        assert!(store.load_legs(&id).unwrap().is_empty());
    }

    #[test]
    fn short_track_write_is_persistence_error() {
        let mut store = MemoryStore::with_short_track_writes();
        let err = run(&pages(&[A], &[]), &mut store, &opts()).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[derive(Default)]
    struct Recorder {
        phases: Vec<SyncPhase>,
        total: usize,
        done: usize,
        failed: usize,
        finished: bool,
    }

    impl Progress for Recorder {
        fn begin(&mut self, total: usize) {
            self.total = total;
        }
        fn phase(&mut self, phase: SyncPhase) {
            self.phases.push(phase);
        }
        fn item_done(&mut self, _key: &LegIdentity) {
            self.done += 1;
        }
        fn item_failed(&mut self, _key: &LegIdentity, _reason: &str) {
            self.failed += 1;
        }
        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn progress_sees_every_phase() {
        let mut store = MemoryStore::new();
        let id = AircraftId::new(TAIL).unwrap();
        let mut rec = Recorder::default();
        let p = pages(&[A, B], &[(21, "KOJC", "KLXT")]);
        sync_aircraft(&p, &mut store, &mut SentinelResolver, &id, &opts(), day(25), Some(&mut rec)).unwrap();

        use SyncPhase::*;
        assert_eq!(rec.phases, vec![Init, Fetched, Filtered, Delta, TrackFetch, Committed]);
        assert_eq!((rec.total, rec.done, rec.failed), (2, 1, 1));
        assert!(rec.finished);
    }

    #[test]
    fn failed_run_does_not_finish_progress() {
        let mut store = MemoryStore::new();
        let id = AircraftId::new(TAIL).unwrap();
        let mut rec = Recorder::default();
        let empty = Pages(HashMap::new());
        assert!(sync_aircraft(&empty, &mut store, &mut SentinelResolver, &id, &opts(), day(25), Some(&mut rec)).is_err());
        assert_eq!(rec.phases, vec![SyncPhase::Init]);
        assert!(!rec.finished);
    }

    #[test]
    fn odd_resolver_answers_still_round_trip() {
        let near = r#"<tr><td><a href="/live/flight/N82145/history/20220722/0100Z/L/KOJC">22-Jul-2022</a></td><td>C172</td><td>Near Kansas City, MO</td><td>(KOJC)</td><td>8:00PM</td><td></td><td></td></tr>"#;
        let doc = history(&[]).replace("</table>", &join!(near, "</table>"));
        let mut map = HashMap::new();
        map.insert(s!("/live/flight/N82145/history/80"), doc);

        let mut store = MemoryStore::new();
        let id = AircraftId::new(TAIL).unwrap();
        let mut resolver = |_: &str, _: bool| Some(s!("K-MKC"));
        let site = Pages(map);
        let first = sync_aircraft(&site, &mut store, &mut resolver, &id, &opts(), day(22), None).unwrap();
        assert_eq!(first.report().unwrap().delta, vec![key("2022_07_22__unknown_kojc__20")]);

        let second = sync_aircraft(&site, &mut store, &mut resolver, &id, &opts(), day(22), None).unwrap();
        let r = second.report().unwrap();
        assert_eq!(r.already_present, 1);
        assert!(r.delta.is_empty());

        let keys = store.list_leg_keys(&id).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&key("2022_07_22__unknown_kojc__20")));
    }

    #[test]
    fn resolver_only_sees_kept_rows() {
        let near = r#"<tr><td><a href="/live/flight/N82145/history/20220710/0100Z/L/KOJC">10-Jul-2022</a></td><td>C172</td><td>Near Kansas City, MO</td><td>(KOJC)</td><td>9:00AM</td><td></td><td></td></tr>"#;
        let doc = history(&[C]).replace("</table>", &join!(near, "</table>"));
        let mut map = HashMap::new();
        map.insert(s!("/live/flight/N82145/history/80"), doc);
        map.insert(join!(&locator(22, "KLXT", "MO3"), "/tracklog"), tracklog(2));

        let mut store = MemoryStore::new();
        let id = AircraftId::new(TAIL).unwrap();
        store.write_checkpoint(&id, day(15)).unwrap();

        let mut asked = 0;
        let mut resolver = |_: &str, _: bool| {
            asked += 1;
            None::<String>
        };
        let out = sync_aircraft(&Pages(map), &mut store, &mut resolver, &id, &opts(), day(25), None).unwrap();
        assert_eq!(out.report().unwrap().skipped_by_checkpoint, 1);
        assert_eq!(asked, 0);
    }
}
