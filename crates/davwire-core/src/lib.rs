//! Shared configuration, errors and constants for the `davwire` crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
