//! hidsctl command implementations

use anyhow::{Context, Result};
use hids_common::schedule::{register_daily_task, task_command};
use hids_common::{AlertLog, Checker, HidsConfig, SnapshotStore, WindowsProbe};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Effective configuration plus the file it came from
pub struct Session {
    pub config: HidsConfig,
    pub config_path: Option<PathBuf>,
}

impl Session {
    /// Load configuration and apply command-line path overrides
    pub fn load(
        config_path: Option<&Path>,
        reference: Option<PathBuf>,
        log: Option<PathBuf>,
    ) -> Result<Self> {
        let source = HidsConfig::discover(config_path);
        let mut config = HidsConfig::load(source.as_deref())?;

        if let Some(path) = reference {
            config.reference_path = path;
        }
        if let Some(path) = log {
            config.log_path = path;
        }
        debug!(
            source = ?source,
            reference = %config.reference_path.display(),
            log = %config.log_path.display(),
            "configuration loaded"
        );

        Ok(Self {
            config,
            config_path: source,
        })
    }

    fn checker(&self) -> Checker<WindowsProbe> {
        Checker::from_config(WindowsProbe::new(self.config.probe.clone()), &self.config)
    }
}

/// Execute `hidsctl capture`
pub async fn capture(session: &Session) -> Result<()> {
    let checker = session.checker();
    let snapshot = checker.capture_baseline().await?;

    println!(
        "{} Reference state saved to {}",
        "✓".green(),
        checker.store().path().display()
    );
    println!(
        "  {} policy line(s), registry {}",
        snapshot.policy_line_count(),
        format_scalar(snapshot.registry)
    );
    Ok(())
}

/// Execute `hidsctl check`
pub async fn check(session: &Session) -> Result<()> {
    let checker = session.checker();
    let report = checker.run_check().await?;

    if report.is_clean() {
        println!("{} No changes detected", "✓".green());
    } else {
        println!(
            "{} {} alert(s) recorded in {}",
            "!".yellow(),
            report.alerts.len(),
            checker.log().path().display()
        );
    }
    Ok(())
}

/// Execute `hidsctl schedule`
pub async fn schedule(
    session: &Session,
    task_name: Option<String>,
    time: Option<String>,
) -> Result<()> {
    let mut config = session.config.clone();
    if let Some(name) = task_name {
        config.schedule.task_name = name;
    }
    if let Some(time) = time {
        config.schedule.start_time = time;
    }
    config.validate()?;

    let exe = std::env::current_exe().context("Cannot determine hidsctl executable path")?;

    // The scheduler runs from its own working directory, so pin every path
    let reference = absolute(&config.reference_path)?;
    let log = absolute(&config.log_path)?;
    let config_file = session.config_path.as_deref().map(absolute).transpose()?;

    let mut options: Vec<(&str, &Path)> = Vec::new();
    if let Some(path) = config_file.as_deref() {
        options.push(("--config", path));
    }
    options.push(("--reference", reference.as_path()));
    options.push(("--log", log.as_path()));

    let command = task_command(&exe, &options);
    register_daily_task(&config.schedule, &command, config.probe.timeout()).await?;

    println!(
        "{} Task '{}' scheduled to run daily at {}",
        "✓".green(),
        config.schedule.task_name,
        config.schedule.start_time
    );
    Ok(())
}

/// Execute `hidsctl show`
pub fn show(session: &Session) -> Result<()> {
    let store = SnapshotStore::new(&session.config.reference_path);
    let Some(summary) = store.summary()? else {
        println!(
            "No reference found at {}. Run 'hidsctl capture' first.",
            store.path().display()
        );
        return Ok(());
    };

    println!("Reference snapshot");
    println!("==================");
    println!("  path      : {}", summary.path.display());
    if let Some(at) = summary.captured_at {
        println!("  captured  : {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  gpo       : {} line(s)", summary.snapshot.policy_line_count());
    println!(
        "  registry  : {} = {}",
        session.config.probe.registry,
        format_scalar(summary.snapshot.registry)
    );
    println!(
        "  service   : {} (must be running, not baselined)",
        session.config.probe.service_name
    );
    Ok(())
}

/// Execute `hidsctl alerts`
pub fn alerts(session: &Session, limit: usize) -> Result<()> {
    let log = AlertLog::new(&session.config.log_path);
    let lines = log.recent(limit)?;

    if lines.is_empty() {
        println!("No alerts recorded in {}", log.path().display());
        return Ok(());
    }

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Execute `hidsctl config`
pub fn config_show(session: &Session) -> Result<()> {
    match &session.config_path {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# Config file: none (using defaults)"),
    }
    print!("{}", session.config.to_toml()?);
    Ok(())
}

fn format_scalar(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "absent".to_string(),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    Ok(cwd.join(path))
}
