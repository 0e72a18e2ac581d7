// src/config/consts.rs

// Net config
pub const BASE_URL: &str = "https://flightaware.com";
pub const USER_AGENT: &str = concat!("tailtrack/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT_SECS: u64 = 15;
pub const HISTORY_LOOKBACK: u32 = 80;

// Local store
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = ".store/debug.log";
pub const CONFIG_FILE: &str = "tailtrack.toml";

// Sync
pub const REQUEST_PAUSE_MS: u64 = 3_000; // be polite between track logs
pub const UNKNOWN_AIRPORT: &str = "UNKNOWN";

// Locality
pub const EARTH_RADIUS_MILES: f64 = 3958.8;
pub const LOCAL_RADIUS_MILES: f64 = 80.0;
pub const LXT: (f64, f64) = (38.9577, -94.3739);
pub const OJC: (f64, f64) = (38.9728, -94.3732);
