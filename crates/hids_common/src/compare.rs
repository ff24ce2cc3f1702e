//! Comparator between the reference snapshot and live state.

use crate::snapshot::{FactName, Reading, Snapshot};

/// One reason to raise an alert, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// A persisted fact no longer matches the reference
    Fact(FactName),
    /// The watched service is not running (fixed expectation, no baseline)
    ServiceNotRunning,
}

/// Persisted facts whose current value differs from the reference.
///
/// Exact equality only: the policy listing byte for byte, the registry
/// scalar with absent distinct from every concrete value.
pub fn diff(reference: &Snapshot, current: &Snapshot) -> Vec<FactName> {
    let mut changed = Vec::new();
    if reference.gpo != current.gpo {
        changed.push(FactName::Gpo);
    }
    if reference.registry != current.registry {
        changed.push(FactName::Registry);
    }
    changed
}

/// All divergences: persisted facts first, then the live service check.
///
/// A fact that could not be read diverges whatever the reference holds.
pub fn evaluate(reference: &Snapshot, current: &Reading, service_running: bool) -> Vec<Divergence> {
    let changed = diff(reference, &current.snapshot);
    let mut divergences: Vec<Divergence> = [FactName::Gpo, FactName::Registry]
        .into_iter()
        .filter(|fact| changed.contains(fact) || current.is_unreadable(*fact))
        .map(Divergence::Fact)
        .collect();
    if !service_running {
        divergences.push(Divergence::ServiceNotRunning);
    }
    divergences
}
