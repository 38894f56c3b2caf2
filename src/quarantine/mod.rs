//! Quarantine handling for flagged files.
//!
//! This module handles:
//! - Moving suspect files out of the scanned tree under timestamped names
//! - Tombstone markers at the original locations
//! - Listing the quarantine directory contents

pub mod manager;

pub use manager::{
    QuarantineEntry, QuarantineManager, QuarantinedFile, QUARANTINE_EXTENSION, TOMBSTONE_SUFFIX,
};
