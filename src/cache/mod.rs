//! Mtime-based scan cache.
//!
//! Persistent mapping of file path → last-seen modification time, used to
//! skip files already judged clean and untouched since. The cache is loaded
//! once per run, mutated in memory, and written back wholesale at run end.

use crate::core::error::{Error, Result};
use crate::utils::logging::{EventLevel, EventSink};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Modification time of `path` as fractional seconds since the Unix epoch.
///
/// The same conversion is used when recording and when comparing, so an
/// unchanged file always compares equal even where f64 cannot represent the
/// filesystem timestamp exactly.
pub fn mtime_seconds(path: &Path) -> std::io::Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0))
}

/// The on-disk skip cache.
///
/// Invariant: an entry exists only for a file whose last scan at that mtime
/// judged it clean. Suspicious files are evicted after a confirmed
/// quarantine move; vanished files are evicted when noticed.
pub struct ScanCache {
    path: PathBuf,
    entries: BTreeMap<PathBuf, f64>,
}

impl ScanCache {
    /// Load the cache from `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or malformed file
    /// also yields an empty cache, with a warning; starting cold just means
    /// one slow run.
    pub fn load(path: &Path, events: &dyn EventSink) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<PathBuf, f64>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    events.record(
                        EventLevel::Warning,
                        &format!(
                            "Scan cache {} is malformed ({}); starting cold",
                            path.display(),
                            e
                        ),
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                events.record(
                    EventLevel::Warning,
                    &format!(
                        "Scan cache {} could not be read ({}); starting cold",
                        path.display(),
                        e
                    ),
                );
                BTreeMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Create an empty cache bound to `path` without touching the disk.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    /// Persist the cache wholesale, overwriting prior contents.
    ///
    /// Writes to a temp file and renames over the target so a crash mid-write
    /// cannot leave a torn cache for the next run.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::file_write(&self.path, e))?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json).map_err(|e| Error::file_write(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::file_write(&self.path, e)
        })
    }

    /// Cached mtime for `path`, if present.
    pub fn lookup(&self, path: &Path) -> Option<f64> {
        self.entries.get(path).copied()
    }

    /// Whether `path` is cached at exactly `mtime`.
    pub fn is_fresh(&self, path: &Path, mtime: f64) -> bool {
        self.lookup(path) == Some(mtime)
    }

    /// Record a clean verdict for `path` at `mtime`.
    pub fn record(&mut self, path: &Path, mtime: f64) {
        self.entries.insert(path.to_path_buf(), mtime);
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn evict(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file this cache persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::MemoryEventLog;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_silent() {
        let dir = tempdir().unwrap();
        let events = MemoryEventLog::new();

        let cache = ScanCache::load(&dir.path().join("cache.json"), &events);
        assert!(cache.is_empty());
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_load_malformed_file_warns_and_starts_cold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json at all").unwrap();

        let events = MemoryEventLog::new();
        let cache = ScanCache::load(&path, &events);
        assert!(cache.is_empty());
        assert!(events.contains(EventLevel::Warning, "malformed"));
    }

    #[test]
    fn test_record_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        let file = dir.path().join("index.php");
        fs::write(&file, "<?php echo 1;").unwrap();
        let mtime = mtime_seconds(&file).unwrap();

        let events = MemoryEventLog::new();
        let mut cache = ScanCache::load(&cache_path, &events);
        cache.record(&file, mtime);
        cache.save().unwrap();

        let reloaded = ScanCache::load(&cache_path, &events);
        assert_eq!(reloaded.lookup(&file), Some(mtime));
        assert!(reloaded.is_fresh(&file, mtime));
    }

    #[test]
    fn test_save_is_wholesale_overwrite() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        let events = MemoryEventLog::new();

        let mut cache = ScanCache::load(&cache_path, &events);
        cache.record(Path::new("/www/a.php"), 100.0);
        cache.record(Path::new("/www/b.php"), 200.0);
        cache.save().unwrap();

        cache.evict(Path::new("/www/a.php"));
        cache.save().unwrap();

        let reloaded = ScanCache::load(&cache_path, &events);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.lookup(Path::new("/www/b.php")), Some(200.0));
        // No temp file left behind.
        assert!(!cache_path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_mtime_change_breaks_freshness() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("page.php");
        fs::write(&file, "<?php echo 1;").unwrap();
        let first = mtime_seconds(&file).unwrap();

        let mut cache = ScanCache::empty(&dir.path().join("cache.json"));
        cache.record(&file, first);
        assert!(cache.is_fresh(&file, first));

        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(1_600_000_000, 0))
            .unwrap();
        let second = mtime_seconds(&file).unwrap();
        assert_ne!(first, second);
        assert!(!cache.is_fresh(&file, second));
    }

    #[test]
    fn test_evict() {
        let mut cache = ScanCache::empty(Path::new("/tmp/cache.json"));
        cache.record(Path::new("/www/a.php"), 1.5);
        assert!(cache.evict(Path::new("/www/a.php")));
        assert!(!cache.evict(Path::new("/www/a.php")));
        assert!(cache.is_empty());
    }
}
