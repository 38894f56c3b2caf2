//! trapscan: A web shell scanner and quarantine tool for web document roots.
//!
//! This is the main entry point for the CLI application.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use trapscan::cli::{Cli, Commands, ConfigAction, OutputFormat, QuarantineAction, ScheduleAction};
use trapscan::core::config::Config;
use trapscan::core::error::{Error, Result};
use trapscan::detection::PatternSet;
use trapscan::quarantine::QuarantineManager;
use trapscan::scanner::ScanOrchestrator;
use trapscan::scheduler::ScheduleConfig;
use trapscan::utils::logging::{init_logging, EventSink, FileEventLog, LogConfig};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.suggestion() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);

    // `config` subcommands must work even when the existing file is
    // unreadable, so they dispatch before the load.
    if let Some(Commands::Config { action }) = cli.command {
        return run_config(action, &config_path);
    }

    // Everything else refuses to start without a valid configuration.
    let config = Arc::new(Config::load_or_init(&config_path)?);

    // Initialize logging: CLI flags win over the configured level
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::from_config(&config)
    };
    init_logging(log_config)?;

    log::info!("trapscan v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Configuration loaded from {}", config_path.display());

    // Handle commands
    match cli.command {
        Some(Commands::Scan { path, report_only }) => {
            run_scan(config, path, report_only, cli.format)
        }
        Some(Commands::Quarantine { action }) => run_quarantine(action, &config, cli.format),
        Some(Commands::Schedule { action }) => run_schedule(action, cli.config),
        Some(Commands::Info) => run_info(&config, &config_path),
        Some(Commands::Config { .. }) => unreachable!("dispatched before the config load"),
        None => {
            // No command specified, show help
            println!("trapscan - Web Shell Scanner for Web Document Roots");
            println!();
            println!("Use --help for usage information");
            println!();
            println!("Quick start:");
            println!("  trapscan scan                Scan the configured web roots");
            println!("  trapscan scan --report-only  Flag suspects without quarantining");
            println!("  trapscan quarantine list     View quarantined files");
            println!("  trapscan schedule cron       Print a crontab line for periodic scans");
            Ok(())
        }
    }
}

/// Open the audit log, falling back to console-only echoing.
fn audit_sink(config: &Config) -> Arc<dyn EventSink> {
    match FileEventLog::from_config(config) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            log::warn!("Audit log unavailable ({}), events echo to the console only", e);
            Arc::new(FileEventLog::default())
        }
    }
}

/// Run a scan over the configured or requested directories.
fn run_scan(
    config: Arc<Config>,
    path: Option<Vec<PathBuf>>,
    report_only: bool,
    format: OutputFormat,
) -> Result<()> {
    if let Err(e) = config.ensure_directories() {
        log::warn!("Could not create data directories: {}", e);
    }

    let events = audit_sink(&config);
    let orchestrator = ScanOrchestrator::new(config, events).with_report_only(report_only);

    let summary = match path {
        Some(targets) => {
            log::info!("Scanning {} requested path(s)...", targets.len());
            orchestrator.run_on(&targets)
        }
        None => orchestrator.run(),
    };

    // Output results
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!();
            println!("=== Scan Complete ===");
            println!("Scan ID:           {}", summary.scan_id);
            println!("Files Scanned:     {}", summary.files_scanned);
            println!("Files Skipped:     {}", summary.files_skipped);
            println!("Threats Found:     {}", summary.threats_found);
            println!("Files Quarantined: {}", summary.files_quarantined);
            println!("Errors:            {}", summary.errors);
            if let Some(duration) = summary.duration_secs() {
                println!("Duration:          {} seconds", duration);
            }
            if !summary.suspects.is_empty() {
                println!();
                println!("Suspects:");
                for suspect in &summary.suspects {
                    let action = if suspect.quarantined {
                        "quarantined"
                    } else {
                        "flagged"
                    };
                    println!(
                        "  {} (score {}, {})",
                        suspect.path.display(),
                        suspect.score,
                        action
                    );
                }
            }
        }
    }

    Ok(())
}

/// Manage quarantine.
fn run_quarantine(action: QuarantineAction, config: &Config, format: OutputFormat) -> Result<()> {
    match action {
        QuarantineAction::List => {
            let events: Arc<dyn EventSink> = Arc::new(FileEventLog::default());
            let manager = QuarantineManager::new(config, events);
            let entries = manager.list()?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("Quarantine is empty.");
                    } else {
                        println!(
                            "{} quarantined file(s) in {}:",
                            entries.len(),
                            manager.quarantine_dir().display()
                        );
                        for entry in &entries {
                            match entry.modified {
                                Some(ts) => println!(
                                    "  {} ({} bytes, {})",
                                    entry.path.display(),
                                    entry.size,
                                    ts.format("%Y-%m-%d %H:%M:%S")
                                ),
                                None => {
                                    println!("  {} ({} bytes)", entry.path.display(), entry.size)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Handle configuration commands.
///
/// These run before the main config load so that a broken file can still
/// be inspected or replaced.
fn run_config(action: ConfigAction, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                return Err(Error::ConfigSave(format!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                )));
            }
            Config::default().save(config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
    }
    Ok(())
}

/// Print scheduler entries for unattended periodic scans.
fn run_schedule(action: ScheduleAction, config_override: Option<PathBuf>) -> Result<()> {
    match action {
        ScheduleAction::Cron { interval_hours } => {
            let schedule = ScheduleConfig::from_env(config_override, interval_hours);
            println!("# Add to root's crontab (crontab -e):");
            println!("{}", schedule.generate_cron_line());
        }
        ScheduleAction::Systemd { interval_hours } => {
            let schedule = ScheduleConfig::from_env(config_override, interval_hours);
            println!("# {}", schedule.service_unit_path().display());
            println!("{}", schedule.generate_service_unit());
            println!("# {}", schedule.timer_unit_path().display());
            println!("{}", schedule.generate_timer_unit());
            println!("# Install with:");
            println!("#   systemctl daemon-reload");
            println!("#   systemctl enable --now trapscan.timer");
        }
    }
    Ok(())
}

/// Show application information.
fn run_info(config: &Config, config_path: &Path) -> Result<()> {
    println!("trapscan - Web Shell Scanner");
    println!();
    println!("Version:          {}", env!("CARGO_PKG_VERSION"));
    println!("Config Path:      {}", config_path.display());
    println!("Data Directory:   {}", Config::data_dir().display());
    println!("Quarantine Path:  {}", config.quarantine.quarantine_dir().display());
    println!("Audit Log:        {}", config.logging.log_file().display());
    println!("Cache File:       {}", config.cache.cache_file().display());
    println!();
    println!("Scan Settings:");
    println!("  Threshold:      {}", config.scan.suspicion_threshold);
    println!("  Scoring:        {:?}", config.scan.scoring_mode);
    println!("  Signatures:     {}", PatternSet::builtin(config.scan.scoring_mode).len());
    println!("  Extensions:     {}", config.scan.extensions.join(", "));
    println!("  Targets:");
    for target in &config.scan.target_directories {
        println!("    {}", target.display());
    }
    Ok(())
}
