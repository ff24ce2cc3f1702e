//! Reference snapshot of the watched configuration facts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Captured value of the watched registry scalar (`None` = key or value absent)
pub type RegistryScalar = Option<i64>;

/// Persisted facts. The service state is live-only and never part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Raw policy listing text, compared byte for byte
    pub gpo: String,

    /// Registry scalar; the field must be present even when null
    #[serde(deserialize_with = "Option::deserialize")]
    pub registry: RegistryScalar,
}

impl Snapshot {
    pub fn new(gpo: impl Into<String>, registry: RegistryScalar) -> Self {
        Self {
            gpo: gpo.into(),
            registry,
        }
    }

    /// Number of non-blank lines in the policy listing
    pub fn policy_line_count(&self) -> usize {
        self.gpo.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// Persisted facts as read from the live system during a check.
///
/// A fact whose collaborator failed keeps its degraded value in `snapshot`
/// and is listed in `unreadable`; it never compares as unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reading {
    pub snapshot: Snapshot,
    pub unreadable: Vec<FactName>,
}

impl Reading {
    pub fn is_unreadable(&self, fact: FactName) -> bool {
        self.unreadable.contains(&fact)
    }
}

/// Name of a persisted fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactName {
    Gpo,
    Registry,
}

impl FactName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpo => "gpo",
            Self::Registry => "registry",
        }
    }
}

impl fmt::Display for FactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
