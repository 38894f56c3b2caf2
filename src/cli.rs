//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trapscan: Web shell scanner for web document roots
#[derive(Parser, Debug)]
#[command(name = "trapscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress everything except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use an alternate configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine processing
    Json,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the configured web roots for web shells
    Scan {
        /// Scan specific path(s) instead of the configured targets
        #[arg(short, long)]
        path: Option<Vec<PathBuf>>,

        /// Flag suspicious files without moving them to quarantine
        #[arg(long)]
        report_only: bool,
    },

    /// Manage quarantined files
    Quarantine {
        #[command(subcommand)]
        action: QuarantineAction,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate scheduler entries for unattended periodic scans
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Show application information
    Info,
}

/// Quarantine subcommands.
#[derive(Subcommand, Debug)]
pub enum QuarantineAction {
    /// List quarantined files
    List,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

/// Scheduler subcommands.
#[derive(Subcommand, Debug)]
pub enum ScheduleAction {
    /// Print a crontab line for periodic scans
    Cron {
        /// Hours between scan runs
        #[arg(long, default_value = "6")]
        interval_hours: u32,
    },

    /// Print a systemd service and timer unit pair
    Systemd {
        /// Hours between scan runs
        #[arg(long, default_value = "6")]
        interval_hours: u32,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        // Test that CLI can be constructed
        let cli = Cli {
            verbose: false,
            quiet: false,
            config: None,
            format: OutputFormat::Text,
            command: None,
        };
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "trapscan",
            "--format",
            "json",
            "scan",
            "--path",
            "/srv/www",
            "--report-only",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Some(Commands::Scan { path, report_only }) => {
                assert_eq!(path.unwrap(), vec![PathBuf::from("/srv/www")]);
                assert!(report_only);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_schedule_interval() {
        let cli = Cli::try_parse_from(["trapscan", "schedule", "cron", "--interval-hours", "12"])
            .unwrap();

        match cli.command {
            Some(Commands::Schedule {
                action: ScheduleAction::Cron { interval_hours },
            }) => assert_eq!(interval_hours, 12),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["trapscan", "-v", "-q", "scan"]).is_err());
    }
}
