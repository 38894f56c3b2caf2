//! Configuration management for trapscan.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scan-related settings
    pub scan: ScanConfig,
    /// Quarantine settings
    pub quarantine: QuarantineConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Scan cache settings
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound(path.to_path_buf())
            } else {
                Error::ConfigLoad(format!("Failed to read config file: {}", e))
            }
        })?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| Error::ConfigSave(format!("Failed to write config file: {}", e)))
    }

    /// Load the configuration from `path`, writing defaults there first if
    /// the file does not exist yet.
    ///
    /// A missing file is bootstrapped; an unreadable or unparseable file is
    /// an error, since scanning with guessed settings on a misconfigured
    /// host would be worse than refusing to start.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Get the application data directory.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("trapscan")
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.scan.suspicion_threshold == 0 {
            return Err(Error::ConfigInvalid {
                field: "scan.suspicion_threshold".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.scan.target_directories.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "scan.target_directories".to_string(),
                message: "At least one target directory is required".to_string(),
            });
        }

        if self.scan.extensions.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "scan.extensions".to_string(),
                message: "At least one scannable extension is required".to_string(),
            });
        }

        Ok(())
    }

    /// Create the directories the logging and cache layers write into.
    pub fn ensure_directories(&self) -> Result<()> {
        let files = [
            self.logging.log_file(),
            self.logging.json_log_file(),
            self.cache.cache_file(),
        ];
        for parent in files.iter().filter_map(|p| p.parent()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::directory_access(parent, e))?;
        }
        Ok(())
    }
}

/// Scan-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directories walked on each run
    pub target_directories: Vec<PathBuf>,
    /// Minimum suspicion score (inclusive) at which a file is flagged
    pub suspicion_threshold: u32,
    /// Name suffixes of files worth scanning (web-servable and script content)
    pub extensions: Vec<String>,
    /// How signature matches accumulate into a score
    pub scoring_mode: ScoringMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_directories: vec![PathBuf::from("/var/www/html")],
            suspicion_threshold: 5,
            extensions: vec![
                ".php".to_string(),
                ".html".to_string(),
                ".js".to_string(),
                ".css".to_string(),
                ".htaccess".to_string(),
                ".py".to_string(),
                ".pl".to_string(),
                ".rb".to_string(),
            ],
            scoring_mode: ScoringMode::PerLine,
        }
    }
}

/// How signature matches accumulate into a suspicion score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Each signature counts at most once per file, regardless of how often
    /// it appears.
    PerFile,
    /// Each signature counts once per line it matches; a pattern on ten
    /// lines adds ten. Higher recall, the default.
    #[default]
    PerLine,
}

/// Quarantine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineConfig {
    /// Path for the quarantine directory
    pub directory: Option<PathBuf>,
    /// Leave a `.QUARANTINED` tombstone at the original path after a move
    pub write_tombstone: bool,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self {
            directory: None,
            write_tombstone: true,
        }
    }
}

impl QuarantineConfig {
    /// Get the effective quarantine directory.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("quarantine"))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Path for the human-readable audit log
    pub log_path: Option<PathBuf>,
    /// Path for the JSON-lines audit log
    pub json_log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_path: None,
            json_log_path: None,
        }
    }
}

impl LoggingConfig {
    /// Get the effective audit log path.
    pub fn log_file(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("logs").join("trapscan.log"))
    }

    /// Get the effective JSON-lines log path.
    pub fn json_log_file(&self) -> PathBuf {
        self.json_log_path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("logs").join("trapscan.json.log"))
    }
}

/// Scan cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path for the mtime cache file
    pub file: Option<PathBuf>,
}

impl CacheConfig {
    /// Get the effective cache file path.
    pub fn cache_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("scanned_cache.json"))
    }
}
