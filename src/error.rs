// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Non-success response or transport failure talking to the source site.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Expected page structure (table, cells) is missing.
    #[error("structure error: {0}")]
    Structure(String),

    /// A scraped date/time string does not match the supported page format.
    #[error("format error: {0}")]
    Format(String),

    /// Gateway write failure or record-count mismatch.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error {0}")]
    Toml(#[from] toml::de::Error),

    #[error("chrono parse error {0}")]
    Chrono(#[from] chrono::ParseError),
}

impl Error {
    /// Whether a failure while fetching one leg's track log may be skipped
    /// so the rest of the batch continues. Store and config failures never are.
    pub fn is_leg_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Connectivity(_)
                | Error::Structure(_)
                | Error::Format(_)
                | Error::Http(_)
                | Error::Chrono(_)
        )
    }
}

macro_rules! structure_error {
    ($fmt:literal $(, $arg:expr )* $(,)?) => {
        $crate::error::Error::Structure(format!($fmt $(, $arg)*))
    };
}

macro_rules! format_error {
    ($fmt:literal $(, $arg:expr )* $(,)?) => {
        $crate::error::Error::Format(format!($fmt $(, $arg)*))
    };
}

macro_rules! persistence_error {
    ($fmt:literal $(, $arg:expr )* $(,)?) => {
        $crate::error::Error::Persistence(format!($fmt $(, $arg)*))
    };
}

pub(crate) use {format_error, persistence_error, structure_error};
