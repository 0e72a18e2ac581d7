// src/specs/mod.rs
//! # Page specs
//!
//! One module per source page. Each spec knows the page's path, which table
//! schema applies (`table::HISTORY`, `table::TRACKLOG`), and how raw cells turn
//! into domain records through `normalize`.
//!
//! ## What lives here
//! - Path builders for the history and track log pages.
//! - Row shaping: raw cells → `HistoryRow` / `TrackPoint`.
//! - Per-page policy on bad rows (skip, default, or fail the page).
//!
//! ## What does **not** live here
//! - Fetching. Specs take the page text; `sync` owns the `Fetch`.
//! - Persistence and dedup. Specs never look at the store.
//! - Airport resolution beyond handing the cell state to an `AirportResolver`.
//!
//! ## Testing notes
//! Specs are tested offline against small inline HTML fixtures. Keep them
//! tolerant of whitespace, attribute order, and harmless markup noise.
//!
//! In short: **`specs` knows how to read the pages.** `sync` decides when to
//! read them and what to keep.
pub mod history;
pub mod tracklog;
