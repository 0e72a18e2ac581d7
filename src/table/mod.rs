// src/table/mod.rs
//! Markup table parser: one table in, raw row field-lists out.
//!
//! Schemas in `types` describe where a table lives and how many cells a real
//! data row has. Rows with another cell count are treated as scraping noise and
//! skipped; a "no data" marker anywhere in the table ends the parse with
//! `TableParse::NoData`.
mod parse;
pub mod types;

pub use parse::{parse_table, Rows, TableParse};
pub use types::{RawRow, TableSchema, HISTORY, TRACKLOG};
