//! Directory walk and whole-run aggregation.
//!
//! The orchestrator owns a run: load the cache once, walk every target
//! directory in order, feed candidate files through [`FileScanner`],
//! persist the cache wholesale at the end and emit a summary line. A
//! bad directory is logged and skipped; the rest of the run continues.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::cache::ScanCache;
use crate::core::config::Config;
use crate::core::types::ScanSummary;
use crate::scanner::file::FileScanner;
use crate::utils::logging::{EventLevel, EventSink};

/// Drives a complete scan over the configured directories.
pub struct ScanOrchestrator {
    /// Loaded configuration
    config: Arc<Config>,
    /// Scannable name suffixes, pre-lowercased
    extensions: Vec<String>,
    /// Per-file pipeline
    scanner: FileScanner,
    /// Audit event sink
    events: Arc<dyn EventSink>,
}

impl ScanOrchestrator {
    /// Create an orchestrator from the loaded configuration.
    pub fn new(config: Arc<Config>, events: Arc<dyn EventSink>) -> Self {
        let scanner = FileScanner::new(&config, events.clone());
        let extensions = config
            .scan
            .extensions
            .iter()
            .map(|ext| ext.to_ascii_lowercase())
            .collect();

        Self {
            config,
            extensions,
            scanner,
            events,
        }
    }

    /// Flag suspects without quarantining them.
    pub fn with_report_only(mut self, report_only: bool) -> Self {
        self.scanner = self.scanner.with_report_only(report_only);
        self
    }

    /// Run over the configured target directories.
    pub fn run(&self) -> ScanSummary {
        let targets = self.config.scan.target_directories.clone();
        self.run_on(&targets)
    }

    /// Run over an explicit set of target directories.
    ///
    /// The cache is loaded once at the start and persisted wholesale at
    /// the end. One invocation is idempotent modulo the cache and files
    /// that changed in between.
    pub fn run_on(&self, targets: &[PathBuf]) -> ScanSummary {
        self.events
            .record(EventLevel::Info, "Starting trapscan run...");

        let mut summary = ScanSummary::new();
        let mut cache = ScanCache::load(&self.config.cache.cache_file(), self.events.as_ref());

        for directory in targets {
            self.scan_directory(directory, &mut cache, &mut summary);
        }

        if let Err(e) = cache.save() {
            self.events.record(
                EventLevel::Error,
                &format!(
                    "Error saving scan cache '{}': {}",
                    cache.path().display(),
                    e
                ),
            );
            summary.errors += 1;
        }

        summary.complete();
        self.events.record(
            EventLevel::Info,
            &format!(
                "Scan run complete: {} files scanned, {} skipped, {} threats found, {} quarantined, {} errors",
                summary.files_scanned,
                summary.files_skipped,
                summary.threats_found,
                summary.files_quarantined,
                summary.errors
            ),
        );
        summary
    }

    /// Walk one directory tree and scan every candidate file.
    fn scan_directory(&self, directory: &Path, cache: &mut ScanCache, summary: &mut ScanSummary) {
        if !directory.is_dir() {
            self.events.record(
                EventLevel::Error,
                &format!(
                    "Directory '{}' does not exist or is not a valid directory",
                    directory.display()
                ),
            );
            summary.errors += 1;
            return;
        }

        self.events.record(
            EventLevel::Info,
            &format!("Starting scan of directory: {}", directory.display()),
        );

        for entry in WalkDir::new(directory).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.events.record(
                        EventLevel::Error,
                        &format!("Error walking '{}': {}", directory.display(), e),
                    );
                    summary.errors += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                // A link could escape the tree or double-process its target
                log::debug!("Skipping symlink: {}", entry.path().display());
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            if !self.is_scannable(entry.path()) {
                continue;
            }

            let outcome = self.scanner.scan(entry.path(), cache);
            summary.record(entry.path(), &outcome);
        }

        self.events.record(
            EventLevel::Info,
            &format!("Scan finished for directory: {}", directory.display()),
        );
    }

    /// Extension allow-list via case-insensitive name-suffix matching.
    ///
    /// Suffix matching rather than `Path::extension` so dotfiles like
    /// `.htaccess` are covered.
    fn is_scannable(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_ascii_lowercase(),
            None => return false,
        };
        self.extensions.iter().any(|ext| name.ends_with(ext))
    }
}
