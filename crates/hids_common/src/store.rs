//! Snapshot store: owns the reference file.

use crate::error::{HidsError, Result};
use crate::snapshot::Snapshot;
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stored baseline plus file metadata, for display
#[derive(Debug, Clone)]
pub struct BaselineSummary {
    pub path: PathBuf,
    pub snapshot: Snapshot,
    pub captured_at: Option<DateTime<Local>>,
}

/// JSON-backed reference snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the reference file with `snapshot`
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| HidsError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string(snapshot).map_err(|e| {
            HidsError::io(&self.path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;
        fs::write(&self.path, json).map_err(|e| HidsError::io(&self.path, e))?;

        info!(path = %self.path.display(), "reference snapshot saved");
        Ok(())
    }

    /// Load the reference, `Ok(None)` if no baseline has been captured yet
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HidsError::io(&self.path, e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| HidsError::CorruptedReference {
                path: self.path.clone(),
                source,
            })
    }

    /// Loaded baseline with its modification time
    pub fn summary(&self) -> Result<Option<BaselineSummary>> {
        let Some(snapshot) = self.load()? else {
            return Ok(None);
        };

        let captured_at = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);

        Ok(Some(BaselineSummary {
            path: self.path.clone(),
            snapshot,
            captured_at,
        }))
    }
}
