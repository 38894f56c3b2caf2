//! Quarantine manager.
//!
//! A flagged file is moved out of the web root into the quarantine
//! directory under a timestamped name:
//!
//! ```text
//! shell.php  ->  <quarantine_dir>/shell.php.20260314_092653.quarantined
//! ```
//!
//! Repeated detections of the same basename therefore never collide.
//! An optional tombstone marker is left at the original location so
//! the site operator can see what happened to the file.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::utils::hash::HashCalculator;
use crate::utils::logging::{EventLevel, EventSink};

/// Extension given to files stored in the quarantine directory.
pub const QUARANTINE_EXTENSION: &str = "quarantined";

/// Suffix of the tombstone marker left at the original location.
pub const TOMBSTONE_SUFFIX: &str = ".QUARANTINED";

/// Timestamp format embedded in quarantine file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Record of a completed quarantine move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantinedFile {
    /// Where the file lived before the move
    pub original_path: PathBuf,
    /// Where the file is stored now
    pub quarantine_path: PathBuf,
    /// Local time the move was performed
    pub moved_at: DateTime<Local>,
    /// SHA-256 of the content, when the file could be read before the move
    pub sha256: Option<String>,
}

/// A stored file found in the quarantine directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineEntry {
    /// Full path of the stored file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Modification time, if the metadata was readable
    pub modified: Option<DateTime<Local>>,
}

/// Moves suspect files into the quarantine directory.
pub struct QuarantineManager {
    /// Directory that receives quarantined files
    quarantine_dir: PathBuf,
    /// Leave a tombstone marker at the original path after a move
    write_tombstone: bool,
    /// Audit event sink
    events: Arc<dyn EventSink>,
}

impl QuarantineManager {
    /// Create a manager from the loaded configuration.
    pub fn new(config: &Config, events: Arc<dyn EventSink>) -> Self {
        Self::with_dir(
            config.quarantine.quarantine_dir(),
            config.quarantine.write_tombstone,
            events,
        )
    }

    /// Create a manager for an explicit quarantine directory.
    pub fn with_dir(
        quarantine_dir: PathBuf,
        write_tombstone: bool,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            quarantine_dir,
            write_tombstone,
            events,
        }
    }

    /// Get the quarantine directory.
    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Move a file into quarantine under a timestamped name.
    ///
    /// On success the file is gone from its original location and a
    /// [`QuarantinedFile`] record describes the move. Tombstone
    /// failures are logged but do not fail an otherwise complete move.
    pub fn quarantine(&self, path: &Path) -> Result<QuarantinedFile> {
        self.quarantine_at(path, Local::now())
    }

    fn quarantine_at(&self, path: &Path, moved_at: DateTime<Local>) -> Result<QuarantinedFile> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }

        self.ensure_dir()?;

        let dest = self.destination_for(path, &moved_at)?;

        // fs::rename replaces an existing destination silently on Unix
        if dest.exists() {
            return Err(Error::quarantine_failed(
                path,
                format!("destination already exists: {}", dest.display()),
            ));
        }

        // Hash before the move so the audit trail records what left the web root
        let sha256 = match HashCalculator::sha256_file(path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                log::warn!(
                    "Could not hash {} before quarantine: {}",
                    path.display(),
                    e
                );
                None
            }
        };

        self.move_file(path, &dest)?;

        self.events.record(
            EventLevel::Warning,
            &format!(
                "File quarantined: '{}' moved to '{}'",
                path.display(),
                dest.display()
            ),
        );

        if self.write_tombstone {
            if let Err(e) = self.leave_tombstone(path, &dest, &moved_at) {
                self.events.record(
                    EventLevel::Warning,
                    &format!(
                        "Could not write tombstone for '{}': {}",
                        path.display(),
                        e
                    ),
                );
            }
        }

        Ok(QuarantinedFile {
            original_path: path.to_path_buf(),
            quarantine_path: dest,
            moved_at,
            sha256,
        })
    }

    /// Build the destination path `<basename>.<timestamp>.quarantined`.
    fn destination_for(&self, path: &Path, moved_at: &DateTime<Local>) -> Result<PathBuf> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::quarantine_failed(path, "path has no usable file name"))?;

        let stamp = moved_at.format(TIMESTAMP_FORMAT);
        Ok(self
            .quarantine_dir
            .join(format!("{}.{}.{}", name, stamp, QUARANTINE_EXTENSION)))
    }

    /// Create the quarantine directory if missing, owner-only on Unix.
    fn ensure_dir(&self) -> Result<()> {
        if self.quarantine_dir.is_dir() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(&self.quarantine_dir)
                .map_err(|e| Error::directory_access(&self.quarantine_dir, e))?;
        }

        #[cfg(not(unix))]
        fs::create_dir_all(&self.quarantine_dir)
            .map_err(|e| Error::directory_access(&self.quarantine_dir, e))?;

        Ok(())
    }

    /// Move with a rename fast path, falling back to copy-then-delete
    /// for destinations on another filesystem.
    fn move_file(&self, source: &Path, dest: &Path) -> Result<()> {
        if fs::rename(source, dest).is_ok() {
            return Ok(());
        }

        fs::copy(source, dest).map_err(|e| Error::file_write(dest, e))?;

        // Verify the copy before touching the source
        let source_size = fs::metadata(source)
            .map_err(|e| Error::file_read(source, e))?
            .len();
        let dest_size = fs::metadata(dest)
            .map_err(|e| Error::file_read(dest, e))?
            .len();

        if source_size != dest_size {
            let _ = fs::remove_file(dest);
            return Err(Error::quarantine_failed(
                source,
                "copy verification failed: size mismatch",
            ));
        }

        fs::remove_file(source).map_err(|e| {
            Error::quarantine_failed(
                source,
                format!("copied but could not remove original: {}", e),
            )
        })?;

        Ok(())
    }

    /// Leave a `.QUARANTINED` marker at the original location.
    fn leave_tombstone(
        &self,
        original: &Path,
        dest: &Path,
        moved_at: &DateTime<Local>,
    ) -> std::io::Result<()> {
        let mut marker = original.as_os_str().to_os_string();
        marker.push(TOMBSTONE_SUFFIX);

        let mut file = fs::File::create(PathBuf::from(marker))?;
        writeln!(
            file,
            "This file was moved to quarantine by trapscan at {}.",
            moved_at.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(file, "Original location: {}", original.display())?;
        writeln!(file, "Quarantine location: {}", dest.display())?;
        Ok(())
    }

    /// List the stored files in the quarantine directory, sorted by name.
    ///
    /// Timestamped names sort chronologically within one basename. A
    /// missing quarantine directory means nothing was ever stored.
    pub fn list(&self) -> Result<Vec<QuarantineEntry>> {
        if !self.quarantine_dir.is_dir() {
            return Ok(Vec::new());
        }

        let read = fs::read_dir(&self.quarantine_dir)
            .map_err(|e| Error::directory_access(&self.quarantine_dir, e))?;

        let mut entries = Vec::new();
        for entry in read.flatten() {
            let path = entry.path();
            let stored = path
                .extension()
                .map(|ext| ext == QUARANTINE_EXTENSION)
                .unwrap_or(false);
            if !stored {
                continue;
            }

            let meta = entry.metadata().ok();
            let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
            let modified = meta
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from);
            entries.push(QuarantineEntry {
                path,
                size,
                modified,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::MemoryEventLog;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn manager(dir: &Path, write_tombstone: bool) -> (QuarantineManager, Arc<MemoryEventLog>) {
        let events = Arc::new(MemoryEventLog::new());
        let manager = QuarantineManager::with_dir(dir.to_path_buf(), write_tombstone, events.clone());
        (manager, events)
    }

    fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_quarantine_moves_file_and_leaves_tombstone() {
        let temp_dir = TempDir::new().unwrap();
        let webroot = temp_dir.path().join("webroot");
        fs::create_dir_all(&webroot).unwrap();

        let content = b"<?php eval($_POST['x']); ?>";
        let file_path = create_test_file(&webroot, "shell.php", content);

        let (manager, events) = manager(&temp_dir.path().join("quarantine"), true);
        let record = manager.quarantine(&file_path).unwrap();

        assert!(!file_path.exists());
        assert!(record.quarantine_path.exists());
        assert_eq!(fs::read(&record.quarantine_path).unwrap(), content);
        assert_eq!(record.sha256, Some(HashCalculator::sha256_bytes(content)));

        let stored_name = record
            .quarantine_path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap();
        assert!(stored_name.starts_with("shell.php."));
        assert!(stored_name.ends_with(".quarantined"));

        let tombstone = webroot.join("shell.php.QUARANTINED");
        let marker_text = fs::read_to_string(&tombstone).unwrap();
        assert!(marker_text.contains(file_path.to_str().unwrap()));
        assert!(marker_text.contains(record.quarantine_path.to_str().unwrap()));

        assert!(events.contains(EventLevel::Warning, "File quarantined"));
    }

    #[test]
    fn test_quarantine_without_tombstone() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "backdoor.php", b"system($_GET['c']);");

        let (manager, _events) = manager(&temp_dir.path().join("quarantine"), false);
        manager.quarantine(&file_path).unwrap();

        assert!(!file_path.exists());
        assert!(!temp_dir.path().join("backdoor.php.QUARANTINED").exists());
    }

    #[test]
    fn test_tombstone_failure_does_not_fail_the_move() {
        let temp_dir = TempDir::new().unwrap();
        let webroot = temp_dir.path().join("webroot");
        fs::create_dir_all(&webroot).unwrap();

        let file_path = create_test_file(&webroot, "shell.php", b"eval($_POST['x']);");
        // A directory squatting on the marker path makes the tombstone
        // write fail after the move already happened
        fs::create_dir(webroot.join("shell.php.QUARANTINED")).unwrap();

        let (manager, events) = manager(&temp_dir.path().join("quarantine"), true);
        let record = manager.quarantine(&file_path).unwrap();

        assert!(!file_path.exists());
        assert!(record.quarantine_path.exists());
        assert!(events.contains(EventLevel::Warning, "Could not write tombstone"));
        assert!(events.contains(EventLevel::Warning, "File quarantined"));
    }

    #[test]
    fn test_distinct_names_for_repeated_detections() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _events) = manager(&temp_dir.path().join("quarantine"), false);

        let first_seen = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let second_seen = Local.with_ymd_and_hms(2026, 3, 14, 9, 31, 7).unwrap();

        let file_path = create_test_file(temp_dir.path(), "shell.php", b"eval(1);");
        let first = manager.quarantine_at(&file_path, first_seen).unwrap();

        // Attacker re-drops the same file; it must not clobber the stored copy
        create_test_file(temp_dir.path(), "shell.php", b"eval(2);");
        let second = manager.quarantine_at(&file_path, second_seen).unwrap();

        assert_ne!(first.quarantine_path, second.quarantine_path);
        assert!(first.quarantine_path.exists());
        assert!(second.quarantine_path.exists());
        assert_eq!(
            first.quarantine_path.file_name().unwrap().to_str().unwrap(),
            "shell.php.20260314_092653.quarantined"
        );
    }

    #[test]
    fn test_destination_collision_leaves_source_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let quarantine_dir = temp_dir.path().join("quarantine");
        let (manager, _events) = manager(&quarantine_dir, false);

        let seen = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let file_path = create_test_file(temp_dir.path(), "shell.php", b"eval(1);");

        // Occupy the destination slot for this exact second
        fs::create_dir_all(&quarantine_dir).unwrap();
        fs::write(
            quarantine_dir.join("shell.php.20260314_092653.quarantined"),
            b"already here",
        )
        .unwrap();

        let err = manager.quarantine_at(&file_path, seen).unwrap_err();
        assert!(matches!(err, Error::QuarantineFailed { .. }));
        assert!(err.is_recoverable());
        assert!(file_path.exists());
    }

    #[test]
    fn test_quarantine_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _events) = manager(&temp_dir.path().join("quarantine"), true);

        let err = manager
            .quarantine(&temp_dir.path().join("vanished.php"))
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_list_reports_stored_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let quarantine_dir = temp_dir.path().join("quarantine");
        let (manager, _events) = manager(&quarantine_dir, false);

        assert!(manager.list().unwrap().is_empty());

        let file_a = create_test_file(temp_dir.path(), "a.php", b"eval(1);");
        let file_b = create_test_file(temp_dir.path(), "b.php", b"eval(22);");
        manager
            .quarantine_at(&file_a, Local.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap())
            .unwrap();
        manager
            .quarantine_at(&file_b, Local.with_ymd_and_hms(2026, 3, 14, 9, 0, 1).unwrap())
            .unwrap();

        // Stray files without the marker extension are not listed
        fs::write(quarantine_dir.join("notes.txt"), b"ignore me").unwrap();

        let entries = manager.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].size, 8);
        assert!(entries[0]
            .path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("a.php."));
    }

    #[cfg(unix)]
    #[test]
    fn test_quarantine_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let quarantine_dir = temp_dir.path().join("quarantine");
        let (manager, _events) = manager(&quarantine_dir, false);

        let file_path = create_test_file(temp_dir.path(), "shell.php", b"eval(1);");
        manager.quarantine(&file_path).unwrap();

        let mode = fs::metadata(&quarantine_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
