//! Scanning pipeline.
//!
//! This module provides the scan machinery:
//! - Per-file scoring, caching and quarantine hand-off
//! - Directory traversal with extension filtering and run aggregation

pub mod file;
pub mod orchestrator;

pub use file::FileScanner;
pub use orchestrator::ScanOrchestrator;
