//! Scheduled-run snippets: crontab line and systemd service/timer pair.
//!
//! Generation only. The snippets are printed with installation
//! instructions; nothing here touches `/etc` or drives `systemctl`.

use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Base name of the systemd service/timer pair.
const SYSTEMD_UNIT_NAME: &str = "trapscan";

/// Parameters baked into the generated scheduler entries.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Absolute path of the binary the entries invoke
    pub binary_path: PathBuf,
    /// Config file passed through to the scheduled run, when not the default
    pub config_path: Option<PathBuf>,
    /// Hours between runs, clamped to 1..=24
    pub interval_hours: u32,
}

impl ScheduleConfig {
    /// Create a schedule config with an explicit binary path.
    pub fn new(binary_path: PathBuf, config_path: Option<PathBuf>, interval_hours: u32) -> Self {
        Self {
            binary_path,
            config_path,
            interval_hours: interval_hours.clamp(1, 24),
        }
    }

    /// Build a config for the currently running binary.
    pub fn from_env(config_path: Option<PathBuf>, interval_hours: u32) -> Self {
        let binary_path =
            env::current_exe().unwrap_or_else(|_| PathBuf::from(SYSTEMD_UNIT_NAME));
        Self::new(binary_path, config_path, interval_hours)
    }

    /// The scan invocation shared by every generated entry.
    fn scan_command(&self) -> String {
        match &self.config_path {
            Some(path) => format!(
                "{} --config {} scan",
                self.binary_path.display(),
                path.display()
            ),
            None => format!("{} scan", self.binary_path.display()),
        }
    }

    /// Crontab line running the scan every `interval_hours` hours.
    pub fn generate_cron_line(&self) -> String {
        format!("0 */{} * * * {}", self.interval_hours, self.scan_command())
    }

    /// Systemd oneshot service unit for a single scan run.
    ///
    /// No `[Install]` section: the timer owns activation.
    pub fn generate_service_unit(&self) -> String {
        let mut unit = String::with_capacity(512);

        writeln!(unit, "[Unit]").ok();
        writeln!(unit, "Description=Web shell scan of the configured web roots").ok();
        writeln!(unit, "After=local-fs.target").ok();
        writeln!(unit).ok();

        writeln!(unit, "[Service]").ok();
        writeln!(unit, "Type=oneshot").ok();
        writeln!(unit, "ExecStart={}", self.scan_command()).ok();
        writeln!(unit).ok();

        // A scan must never compete with the web server for I/O
        writeln!(unit, "Nice=19").ok();
        writeln!(unit, "IOSchedulingClass=idle").ok();
        writeln!(unit).ok();

        writeln!(unit, "NoNewPrivileges=true").ok();
        writeln!(unit, "PrivateTmp=true").ok();

        unit
    }

    /// Systemd timer unit firing every `interval_hours` hours.
    pub fn generate_timer_unit(&self) -> String {
        let mut unit = String::with_capacity(256);

        writeln!(unit, "[Unit]").ok();
        writeln!(
            unit,
            "Description=Run trapscan every {} hour(s)",
            self.interval_hours
        )
        .ok();
        writeln!(unit).ok();

        writeln!(unit, "[Timer]").ok();
        writeln!(unit, "OnBootSec=15min").ok();
        writeln!(unit, "OnUnitActiveSec={}h", self.interval_hours).ok();
        writeln!(unit, "Persistent=true").ok();
        writeln!(unit).ok();

        writeln!(unit, "[Install]").ok();
        writeln!(unit, "WantedBy=timers.target").ok();

        unit
    }

    /// Installed location of the service unit.
    pub fn service_unit_path(&self) -> PathBuf {
        PathBuf::from(format!("/etc/systemd/system/{}.service", SYSTEMD_UNIT_NAME))
    }

    /// Installed location of the timer unit.
    pub fn timer_unit_path(&self) -> PathBuf {
        PathBuf::from(format!("/etc/systemd/system/{}.timer", SYSTEMD_UNIT_NAME))
    }
}
