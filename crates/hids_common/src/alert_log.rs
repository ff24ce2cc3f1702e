//! Alert log
//!
//! Append-only text file, one alert per line:
//! `YYYY-MM-DD HH:MM:SS: <message>` (local time).
//! Each alert is also echoed to stdout for the operator.

use crate::error::{HidsError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A recorded alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl AlertRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Line as written to the log (without newline)
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

pub struct AlertLog {
    path: PathBuf,
    echo: bool,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
        }
    }

    /// Disable the stdout echo
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one alert line and echo the message
    pub fn record(&self, message: &str) -> Result<AlertRecord> {
        let record = AlertRecord::new(message);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| HidsError::io(parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HidsError::io(&self.path, e))?;

        writeln!(file, "{}", record.to_line()).map_err(|e| HidsError::io(&self.path, e))?;
        file.sync_all().map_err(|e| HidsError::io(&self.path, e))?;

        if self.echo {
            println!("{}", record.message);
        }

        Ok(record)
    }

    /// Last `limit` lines of the log, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HidsError::io(&self.path, e)),
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let start = lines.len().saturating_sub(limit);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}
