//! Types shared between the support generator library and its command line
//! interface.

pub mod config;
pub mod progress;
