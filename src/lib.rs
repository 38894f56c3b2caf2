//! trapscan: A web shell scanner and quarantine tool for web document roots
//!
//! This crate provides the core functionality for finding PHP web shells and
//! other script backdoors dropped into a web server's document root. It
//! includes signature-based content scoring, an mtime cache that skips
//! unchanged files between runs, quarantine management, and scheduler entry
//! generation for unattended periodic scans.

pub mod cache;
pub mod cli;
pub mod core;
pub mod detection;
pub mod quarantine;
pub mod scanner;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::types::*;
