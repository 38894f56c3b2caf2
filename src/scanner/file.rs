//! Per-file scan pipeline.
//!
//! `FileScanner` owns the verdict for a single file: consult the mtime
//! cache, read and score the content, and hand flagged files to the
//! quarantine manager. Every failure mode is folded into a
//! [`ScanOutcome`] so one bad file can never abort a run.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::cache::{mtime_seconds, ScanCache};
use crate::core::config::Config;
use crate::core::error::Error;
use crate::core::types::ScanOutcome;
use crate::detection::PatternSet;
use crate::quarantine::QuarantineManager;
use crate::utils::logging::{EventLevel, EventSink};

/// Scans one file at a time against the signature set.
pub struct FileScanner {
    /// Signature set and scoring mode
    patterns: PatternSet,
    /// Inclusive score bound at which a file is flagged
    threshold: u32,
    /// Flag suspects without moving them
    report_only: bool,
    /// Moves flagged files out of the tree
    quarantine: QuarantineManager,
    /// Audit event sink
    events: Arc<dyn EventSink>,
}

impl FileScanner {
    /// Create a scanner from the loaded configuration.
    pub fn new(config: &Config, events: Arc<dyn EventSink>) -> Self {
        Self {
            patterns: PatternSet::builtin(config.scan.scoring_mode),
            threshold: config.scan.suspicion_threshold,
            report_only: false,
            quarantine: QuarantineManager::new(config, events.clone()),
            events,
        }
    }

    /// Flag suspects without quarantining them.
    pub fn with_report_only(mut self, report_only: bool) -> Self {
        self.report_only = report_only;
        self
    }

    /// Get the suspicion threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Scan a single file and fold the result into the cache.
    ///
    /// The mtime is taken once, before the content read, and that value
    /// is what a clean verdict records. A cached mtime equal to the
    /// current one short-circuits the read entirely.
    ///
    /// Cache eviction for a flagged file happens only after a confirmed
    /// quarantine move. On a failed move the entry is left untouched so
    /// the next run retries the file.
    pub fn scan(&self, path: &Path, cache: &mut ScanCache) -> ScanOutcome {
        let mtime = match mtime_seconds(path) {
            Ok(mtime) => mtime,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return self.handle_vanished(path, cache);
            }
            Err(e) => return self.handle_unreadable(path, e),
        };

        if cache.is_fresh(path, mtime) {
            log::trace!("Cache hit, skipping unmodified file: {}", path.display());
            return ScanOutcome::Skipped;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return self.handle_vanished(path, cache);
            }
            Err(e) => return self.handle_unreadable(path, e),
        };

        // Lenient decode: undecodable bytes must not hide the rest of the file
        let content = String::from_utf8_lossy(&bytes);
        let score = self.patterns.score(&content);

        if score < self.threshold {
            self.events.record(
                EventLevel::Info,
                &format!("CLEAN: '{}' - Score: {}", path.display(), score),
            );
            cache.record(path, mtime);
            return ScanOutcome::Clean { score };
        }

        self.events.record(
            EventLevel::Alert,
            &format!("SUSPECT: '{}' - Score: {}", path.display(), score),
        );
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Matched signatures for {}: {}",
                path.display(),
                self.patterns.matched_names(&content).join(", ")
            );
        }

        if self.report_only {
            return ScanOutcome::Reported { score };
        }

        match self.quarantine.quarantine(path) {
            Ok(_) => {
                cache.evict(path);
                ScanOutcome::Quarantined { score }
            }
            Err(e) => {
                self.events.record(
                    EventLevel::Error,
                    &format!("Error quarantining file '{}': {}", path.display(), e),
                );
                ScanOutcome::QuarantineFailed { score }
            }
        }
    }

    /// A file that disappeared between enumeration and scan is a skip,
    /// not an error; any stale cache entry goes with it.
    fn handle_vanished(&self, path: &Path, cache: &mut ScanCache) -> ScanOutcome {
        cache.evict(path);
        self.events.record(
            EventLevel::Warning,
            &format!("File vanished before scan: '{}'", path.display()),
        );
        ScanOutcome::Missing
    }

    /// Stat and read failures fold into one outcome. Permission problems
    /// fail open at warning level, whether they hit the stat or the read:
    /// a file that cannot be read cannot be quarantined either. Anything
    /// else is a per-file error.
    fn handle_unreadable(&self, path: &Path, source: std::io::Error) -> ScanOutcome {
        if source.kind() == ErrorKind::PermissionDenied {
            self.events.record(
                EventLevel::Warning,
                &format!(
                    "{}, treating as clean",
                    Error::permission_denied(path, source)
                ),
            );
        } else {
            self.events.record(
                EventLevel::Error,
                &format!("Error scanning file '{}': {}", path.display(), source),
            );
        }
        ScanOutcome::Unreadable
    }
}
