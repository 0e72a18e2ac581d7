// src/locality.rs
//
// A leg is "local" when it starts and ends about the same distance from a
// home field: for some reference point, |d(dest, ref) - d(origin, ref)| stays
// within the threshold. Distances are great-circle miles.

use std::collections::HashMap;

use crate::config::consts::EARTH_RADIUS_MILES;
use crate::config::LocalityOptions;
use crate::identity::LegIdentity;
use crate::model::{AircraftId, GeoPoint};
use crate::store::Gateway;
use crate::Result;

/// Great-circle distance in miles.
///
/// A zero in any of the four coordinates gives 0. Legs without track data
/// carry `(0, 0)` endpoints, so they always come out local.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    if a.lat == 0.0 || a.lon == 0.0 || b.lat == 0.0 || b.lon == 0.0 {
        return 0.0;
    }
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

pub fn is_local(origin: GeoPoint, dest: GeoPoint, refs: &[GeoPoint], threshold_miles: f64) -> bool {
    refs.iter().any(|&r| {
        (haversine_miles(dest, r) - haversine_miles(origin, r)).abs() <= threshold_miles
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalitySummary {
    pub examined: usize,
    pub local: usize,
    pub not_local: usize,
    /// Classified from `(0, 0)` endpoints.
    pub without_track: usize,
    /// Already flagged and left alone (`only_unclassified`).
    pub skipped: usize,
}

/// Flag every stored leg of `aircraft`. Endpoints are the first and last
/// stored track samples.
pub fn classify_aircraft(
    store: &mut dyn Gateway,
    aircraft: &AircraftId,
    opts: &LocalityOptions,
) -> Result<LocalitySummary> {
    let mut summary = LocalitySummary::default();
    let mut flags: HashMap<String, bool> = HashMap::new();

    for leg in store.load_legs(aircraft)? {
        if opts.only_unclassified && leg.local_flag.is_some() {
            summary.skipped += 1;
            continue;
        }
        let key = LegIdentity::of(&leg);
        let points = store.read_track_points(aircraft, &key)?;
        let (origin, dest) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.position(), last.position()),
            _ => {
                summary.without_track += 1;
                (GeoPoint::default(), GeoPoint::default())
            }
        };

        let local = is_local(origin, dest, &opts.reference_points, opts.threshold_miles);
        flags.insert(leg.reference_locator.clone(), local);
        logd!("classify {}: {} local={}", aircraft, key, local);

        summary.examined += 1;
        if local {
            summary.local += 1;
        } else {
            summary.not_local += 1;
        }
    }
    store.set_local_flags(aircraft, &flags)?;

    logf!(
        "classify {}: {} legs, {} local, {} not local, {} without track",
        aircraft,
        summary.examined,
        summary.local,
        summary.not_local,
        summary.without_track
    );
    Ok(summary)
}
