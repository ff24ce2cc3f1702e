//! Error types for HIDS.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidsError {
    #[error("No reference found. Capture the baseline first.")]
    NoBaseline,

    #[error("Invalid option: {0:?}")]
    InvalidSelection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference file {} is corrupted; capture the baseline again", .path.display())]
    CorruptedReference {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scheduled task registration failed: {0}")]
    Schedule(String),
}

impl HidsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HidsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            HidsError::NoBaseline => 1,
            HidsError::InvalidSelection(_) => 2,
            HidsError::Config(_) => 2,
            HidsError::Io { .. } => 3,
            HidsError::CorruptedReference { .. } => 4,
            HidsError::Schedule(_) => 5,
        }
    }
}

/// Failure of an external collaborator while probing live state.
///
/// Probe errors never abort an operation: the orchestrator logs them and
/// degrades the fact. During a check a degraded fact always raises its alert.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{program} is not available: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("Unknown registry root: {0}")]
    UnknownRoot(String),

    #[error("Malformed registry path: {0:?}")]
    MalformedPath(String),

    #[error("Registry access failed: {0}")]
    RegistryAccess(String),

    #[error("Unsupported registry value type {kind} for {name}")]
    UnsupportedType { name: String, kind: String },
}

pub type Result<T> = std::result::Result<T, HidsError>;
