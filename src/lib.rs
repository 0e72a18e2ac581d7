// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod error;
pub mod config;
pub mod core;
pub mod model;
pub mod normalize;
pub mod identity;
pub mod table;
pub mod resolve;
pub mod specs;
pub mod store;
pub mod progress;
pub mod sync;
pub mod locality;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};
