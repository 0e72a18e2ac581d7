// src/config/options.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::model::GeoPoint;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppOptions {
    pub source: SourceOptions,
    pub sync: SyncOptions,
    pub locality: LocalityOptions,
    pub store: StoreOptions,
}

/// Where and how pages are fetched.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOptions {
    pub base_url: String,
    pub timeout_secs: u64,
    /// History rows requested per aircraft.
    pub lookback: u32,
    /// Single session credential, sent as the `Cookie` header when set.
    pub credential: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            lookback: HISTORY_LOOKBACK,
            credential: None,
        }
    }
}

impl SourceOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keep the credential out of logs.
impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("lookback", &self.lookback)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncOptions {
    /// Pause between successive track-log requests.
    pub request_pause_ms: u64,
    /// Only ingest legs flown in this month (1-12).
    pub month: Option<u32>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { request_pause_ms: REQUEST_PAUSE_MS, month: None }
    }
}

impl SyncOptions {
    pub fn request_pause(&self) -> Duration {
        Duration::from_millis(self.request_pause_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalityOptions {
    pub threshold_miles: f64,
    /// Leave legs that already carry a flag untouched.
    pub only_unclassified: bool,
    pub reference_points: Vec<GeoPoint>,
}

impl Default for LocalityOptions {
    fn default() -> Self {
        Self {
            threshold_miles: LOCAL_RADIUS_MILES,
            only_unclassified: false,
            reference_points: vec![GeoPoint::new(LXT.0, LXT.1), GeoPoint::new(OJC.0, OJC.1)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    pub dir: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { dir: PathBuf::from(STORE_DIR) }
    }
}

impl AppOptions {
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(m) = self.sync.month {
            if !(1..=12).contains(&m) {
                return Err(crate::Error::Config(format!("month filter out of range: {m}")));
            }
        }
        if !(self.locality.threshold_miles >= 0.0) {
            return Err(crate::Error::Config(format!(
                "locality threshold must be non-negative, got {}",
                self.locality.threshold_miles
            )));
        }
        if self.source.lookback == 0 {
            return Err(crate::Error::Config(s!("lookback must be at least 1")));
        }
        Ok(())
    }
}
