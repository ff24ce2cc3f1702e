//! Daily check registration with the Windows Task Scheduler.

use crate::config::ScheduleConfig;
use crate::error::{HidsError, Result};
use crate::exec::run_bounded;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Command line the scheduled task runs: `"<exe>" [--flag "<path>"]... check`
pub fn task_command(exe: &Path, options: &[(&str, &Path)]) -> String {
    let mut command = format!("\"{}\"", exe.display());
    for (flag, path) in options {
        command.push_str(&format!(" {} \"{}\"", flag, path.display()));
    }
    command.push_str(" check");
    command
}

/// schtasks arguments for a daily task, replacing any existing one
pub fn schtasks_args(schedule: &ScheduleConfig, task_command: &str) -> Vec<String> {
    vec![
        "/create".to_string(),
        "/tn".to_string(),
        schedule.task_name.clone(),
        "/tr".to_string(),
        task_command.to_string(),
        "/sc".to_string(),
        "daily".to_string(),
        "/st".to_string(),
        schedule.start_time.clone(),
        "/f".to_string(),
    ]
}

/// Register `task_command` to run every day at the configured time
pub async fn register_daily_task(
    schedule: &ScheduleConfig,
    task_command: &str,
    timeout: Duration,
) -> Result<()> {
    let args = schtasks_args(schedule, task_command);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let out = run_bounded(&schedule.schtasks, &args, timeout)
        .await
        .map_err(|e| HidsError::Schedule(e.to_string()))?;

    if !out.success() {
        let detail = if out.stderr.trim().is_empty() {
            out.stdout.trim()
        } else {
            out.stderr.trim()
        };
        return Err(HidsError::Schedule(format!(
            "schtasks exited with {:?}: {}",
            out.code, detail
        )));
    }

    info!(task = %schedule.task_name, time = %schedule.start_time, "daily task registered");
    Ok(())
}
