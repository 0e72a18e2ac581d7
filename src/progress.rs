// src/progress.rs
use crate::identity::LegIdentity;
use crate::sync::SyncPhase;

/// Lightweight progress reporting used by long-running operations (sync/classify).
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the total number of items (if known).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// The sync run moved to a new phase.
    fn phase(&mut self, _phase: SyncPhase) {}

    /// One leg's track log was fetched and parsed.
    fn item_done(&mut self, _key: &LegIdentity) {}

    /// One leg was skipped after a recoverable failure.
    fn item_failed(&mut self, _key: &LegIdentity, _reason: &str) {}

    /// Called once a run completes, including a run that found no data.
    /// A run that returns an error stops without calling it.
    fn finish(&mut self) {}
}
