//! Core module containing fundamental types, configuration, and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ScoringMode};
pub use error::{Error, Result};
pub use types::{ScanOutcome, ScanSummary, SuspicionResult};
