//! Core type definitions used throughout trapscan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of scanning a single file.
///
/// Errors never escape the per-file pipeline; they are folded into the
/// outcome so a single bad file cannot abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Cached mtime matched the current mtime; content was not read.
    Skipped,
    /// File disappeared between enumeration and scan.
    Missing,
    /// Content could not be read (permissions or I/O); treated as clean.
    Unreadable,
    /// Scored below the threshold; cache updated with the current mtime.
    Clean { score: u32 },
    /// Scored at or above the threshold and moved to quarantine.
    Quarantined { score: u32 },
    /// Scored at or above the threshold but the move failed; file left in
    /// place, cache entry untouched so the next run retries.
    QuarantineFailed { score: u32 },
    /// Scored at or above the threshold in report-only mode; file left in
    /// place deliberately.
    Reported { score: u32 },
}

impl ScanOutcome {
    /// Whether the file was classified suspicious.
    pub fn is_suspect(&self) -> bool {
        matches!(
            self,
            ScanOutcome::Quarantined { .. }
                | ScanOutcome::QuarantineFailed { .. }
                | ScanOutcome::Reported { .. }
        )
    }

    /// Suspicion score, 0 where content was never scored.
    pub fn score(&self) -> u32 {
        match self {
            ScanOutcome::Skipped | ScanOutcome::Missing | ScanOutcome::Unreadable => 0,
            ScanOutcome::Clean { score }
            | ScanOutcome::Quarantined { score }
            | ScanOutcome::QuarantineFailed { score }
            | ScanOutcome::Reported { score } => *score,
        }
    }

    /// Whether the file's content was actually read and scored.
    pub fn was_scanned(&self) -> bool {
        matches!(
            self,
            ScanOutcome::Clean { .. }
                | ScanOutcome::Quarantined { .. }
                | ScanOutcome::QuarantineFailed { .. }
                | ScanOutcome::Reported { .. }
        )
    }
}

/// A per-file suspicion verdict carried in the scan summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspicionResult {
    /// Path of the scanned file
    pub path: PathBuf,
    /// Suspicion score (signature match count)
    pub score: u32,
    /// Whether the score met the threshold
    pub is_suspect: bool,
    /// Whether the file was actually moved to quarantine
    pub quarantined: bool,
}

/// Summary of a completed scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Unique scan identifier
    pub scan_id: String,
    /// When the scan started
    pub start_time: DateTime<Utc>,
    /// When the scan ended
    pub end_time: Option<DateTime<Utc>>,
    /// Files whose content was read and scored
    pub files_scanned: u64,
    /// Files skipped via the mtime cache
    pub files_skipped: u64,
    /// Files that met the suspicion threshold
    pub threats_found: u32,
    /// Files successfully moved to quarantine
    pub files_quarantined: u32,
    /// Per-file and per-directory errors survived during the run
    pub errors: u32,
    /// Verdicts for every file that met the threshold
    pub suspects: Vec<SuspicionResult>,
}

impl ScanSummary {
    /// Create a new scan summary.
    pub fn new() -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            start_time: Utc::now(),
            end_time: None,
            files_scanned: 0,
            files_skipped: 0,
            threats_found: 0,
            files_quarantined: 0,
            errors: 0,
            suspects: Vec::new(),
        }
    }

    /// Fold a per-file outcome into the counters.
    ///
    /// A vanished file is a skip, not an error; it simply no longer
    /// needed scanning.
    pub fn record(&mut self, path: &Path, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Skipped | ScanOutcome::Missing => self.files_skipped += 1,
            ScanOutcome::Unreadable => self.errors += 1,
            ScanOutcome::Clean { .. } => self.files_scanned += 1,
            ScanOutcome::Quarantined { .. }
            | ScanOutcome::QuarantineFailed { .. }
            | ScanOutcome::Reported { .. } => {
                self.files_scanned += 1;
                self.threats_found += 1;
            }
        }
        if matches!(outcome, ScanOutcome::QuarantineFailed { .. }) {
            self.errors += 1;
        }
        if matches!(outcome, ScanOutcome::Quarantined { .. }) {
            self.files_quarantined += 1;
        }
        if outcome.is_suspect() {
            self.suspects.push(SuspicionResult {
                path: path.to_path_buf(),
                score: outcome.score(),
                is_suspect: true,
                quarantined: matches!(outcome, ScanOutcome::Quarantined { .. }),
            });
        }
    }

    /// Calculate scan duration in seconds.
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds())
    }

    /// Mark the scan as completed.
    pub fn complete(&mut self) {
        self.end_time = Some(Utc::now());
    }
}

impl Default for ScanSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        assert!(!ScanOutcome::Skipped.is_suspect());
        assert!(!ScanOutcome::Clean { score: 3 }.is_suspect());
        assert!(ScanOutcome::Quarantined { score: 7 }.is_suspect());
        assert!(ScanOutcome::QuarantineFailed { score: 7 }.is_suspect());

        assert_eq!(ScanOutcome::Skipped.score(), 0);
        assert_eq!(ScanOutcome::Clean { score: 3 }.score(), 3);
        assert_eq!(ScanOutcome::Quarantined { score: 7 }.score(), 7);

        assert!(!ScanOutcome::Skipped.was_scanned());
        assert!(ScanOutcome::Clean { score: 0 }.was_scanned());
    }

    #[test]
    fn test_summary_record() {
        let mut summary = ScanSummary::new();
        summary.record(Path::new("/www/index.php"), &ScanOutcome::Clean { score: 1 });
        summary.record(Path::new("/www/style.css"), &ScanOutcome::Skipped);
        summary.record(Path::new("/www/gone.php"), &ScanOutcome::Missing);
        summary.record(
            Path::new("/www/shell.php"),
            &ScanOutcome::Quarantined { score: 9 },
        );
        summary.record(
            Path::new("/www/locked.php"),
            &ScanOutcome::QuarantineFailed { score: 6 },
        );

        assert_eq!(summary.files_scanned, 3);
        assert_eq!(summary.files_skipped, 2);
        assert_eq!(summary.threats_found, 2);
        assert_eq!(summary.files_quarantined, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.suspects.len(), 2);
        assert!(summary.suspects[0].quarantined);
        assert!(!summary.suspects[1].quarantined);
    }

    #[test]
    fn test_summary_complete() {
        let mut summary = ScanSummary::new();
        assert!(summary.duration_secs().is_none());
        summary.complete();
        assert!(summary.end_time.is_some());
        assert!(summary.duration_secs().unwrap() >= 0);
    }
}
