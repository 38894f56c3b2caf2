//! Logging infrastructure for trapscan.
//!
//! Two layers: console diagnostics through the `log` facade (env_logger with
//! a colored format), and an injected audit stream (`EventSink`) that records
//! every significant scan event to the text and JSON-lines log files.

use crate::core::config::Config;
use crate::core::error::Result;
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Console logging configuration.
pub struct LogConfig {
    /// Log level
    pub level: LevelFilter,
    /// Show timestamps
    pub timestamps: bool,
    /// Show module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            timestamps: true,
            module_path: false,
        }
    }
}

impl LogConfig {
    /// Create a log config from application config.
    pub fn from_config(config: &Config) -> Self {
        let level = match config.logging.log_level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" | "warning" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        };

        Self {
            level,
            timestamps: true,
            module_path: level == LevelFilter::Debug || level == LevelFilter::Trace,
        }
    }

    /// Create a verbose log config for CLI.
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Debug,
            timestamps: true,
            module_path: true,
        }
    }

    /// Create a quiet log config (errors only).
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::Error,
            timestamps: false,
            module_path: false,
        }
    }
}

/// Initialize the console logging system.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let mut builder = Builder::new();

    // Set the log level
    builder.filter_level(config.level);

    // Configure log format
    builder.format(move |buf, record| {
        let mut output = String::new();

        // Timestamp
        if config.timestamps {
            output.push_str(&format!("{} ", Local::now().format("%Y-%m-%d %H:%M:%S")));
        }

        // Level with color
        let level = record.level();
        let level_str = match level {
            log::Level::Error => "\x1b[31mERROR\x1b[0m",
            log::Level::Warn => "\x1b[33mWARN\x1b[0m ",
            log::Level::Info => "\x1b[32mINFO\x1b[0m ",
            log::Level::Debug => "\x1b[34mDEBUG\x1b[0m",
            log::Level::Trace => "\x1b[35mTRACE\x1b[0m",
        };
        output.push_str(&format!("[{}] ", level_str));

        // Module path
        if config.module_path {
            if let Some(path) = record.module_path() {
                output.push_str(&format!("{}: ", path));
            }
        }

        // Message
        output.push_str(&format!("{}", record.args()));

        writeln!(buf, "{}", output)
    });

    // Initialize the logger
    builder.init();

    log::debug!("Logging initialized with level: {:?}", config.level);
    Ok(())
}

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    /// Reserved for suspect detections and quarantine actions.
    Alert,
}

impl EventLevel {
    /// Get the string representation used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Debug => "DEBUG",
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
            EventLevel::Critical => "CRITICAL",
            EventLevel::Alert => "ALERT",
        }
    }

    /// Map to the closest `log` facade level for console echoing.
    fn log_level(&self) -> log::Level {
        match self {
            EventLevel::Debug => log::Level::Debug,
            EventLevel::Info => log::Level::Info,
            EventLevel::Warning => log::Level::Warn,
            EventLevel::Error | EventLevel::Critical | EventLevel::Alert => log::Level::Error,
        }
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination for audit events.
///
/// Injected into every component that observes scan activity; implementations
/// must never panic or abort the scan on a write failure.
pub trait EventSink: Send + Sync {
    /// Durably record one event.
    fn record(&self, level: EventLevel, message: &str);
}

/// Audit log writing to a human-readable file and a JSON-lines file.
///
/// Every event is also echoed to the `log` facade so console verbosity
/// settings apply. File writes are best-effort: a full disk must not take
/// the scan down with it. The default value has no file streams and only
/// echoes to the console.
#[derive(Default)]
pub struct FileEventLog {
    text: Option<Mutex<File>>,
    json: Option<Mutex<File>>,
}

impl FileEventLog {
    /// Open (append) the audit streams, creating parent directories.
    pub fn new(text_path: Option<&Path>, json_path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            text: text_path.map(open_append).transpose()?.map(Mutex::new),
            json: json_path.map(open_append).transpose()?.map(Mutex::new),
        })
    }

    /// Build the audit log from application config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            Some(&config.logging.log_file()),
            Some(&config.logging.json_log_file()),
        )
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| crate::core::error::Error::file_write(path, e))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| crate::core::error::Error::file_write(path, e))
}

impl EventSink for FileEventLog {
    fn record(&self, level: EventLevel, message: &str) {
        let now = Local::now();

        if let Some(text) = &self.text {
            if let Ok(mut file) = text.lock() {
                let _ = writeln!(
                    file,
                    "[{}] [{}] {}",
                    now.format("%Y-%m-%d %H:%M:%S"),
                    level,
                    message
                );
            }
        }

        if let Some(json) = &self.json {
            if let Ok(mut file) = json.lock() {
                let line = serde_json::json!({
                    "timestamp": now.to_rfc3339(),
                    "level": level.as_str(),
                    "message": message,
                });
                let _ = writeln!(file, "{}", line);
            }
        }

        log::log!(level.log_level(), "{}", message);
    }
}

/// In-memory sink capturing events, for tests and dry inspection.
#[derive(Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<(EventLevel, String)>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<(EventLevel, String)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Whether any event at `level` contains `needle`.
    pub fn contains(&self, level: EventLevel, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, level: EventLevel, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((level, message.to_string()));
        }
    }
}
