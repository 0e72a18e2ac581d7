// src/table/types.rs

/// How to find the table in the page.
#[derive(Clone, Copy, Debug)]
pub enum Locator {
    /// Opening-tag prefix, matched case-insensitively, e.g. `<table id="tracklogTable"`.
    TagPrefix(&'static str),
}

/// Column layout of one scraped table.
#[derive(Clone, Copy, Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub locator: Locator,
    pub columns: &'static [&'static str],
    /// Leading header rows, excluded by position.
    pub skip_head: usize,
    /// Trailing summary rows, excluded by position.
    pub skip_tail: usize,
    /// Any row containing one of these (case-insensitive) means "nothing to read".
    pub no_data_markers: &'static [&'static str],
}

impl TableSchema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == name)
    }
}

/// One surviving row: cleaned cell text plus the first link in the row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<String>,
    pub href: Option<String>,
}

pub const HISTORY: TableSchema = TableSchema {
    name: "history",
    locator: Locator::TagPrefix(r#"<table class="prettyTable fullWidth"#),
    columns: &["date", "aircraft", "origin", "destination", "departure", "arrival", "duration"],
    skip_head: 1,
    skip_tail: 0,
    no_data_markers: &["no history data", "no flights found"],
};

pub const TRACKLOG: TableSchema = TableSchema {
    name: "tracklog",
    locator: Locator::TagPrefix(r#"<table id="tracklogTable""#),
    columns: &[
        "time", "latitude", "longitude", "course", "knots", "mph", "altitude", "rate", "facility",
    ],
    skip_head: 1,
    skip_tail: 1,
    no_data_markers: &["no track data", "track log not available"],
};
