//! Check orchestrator: capture baseline and run check.

use crate::alert_log::{AlertLog, AlertRecord};
use crate::compare::{evaluate, Divergence};
use crate::config::{HidsConfig, RegistryLocation};
use crate::error::{HidsError, Result};
use crate::probe::StateProbe;
use crate::snapshot::{FactName, Snapshot};
use crate::store::SnapshotStore;
use tracing::info;

/// Outcome of a completed check
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub alerts: Vec<AlertRecord>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.alerts.is_empty()
    }
}

pub struct Checker<P> {
    probe: P,
    store: SnapshotStore,
    log: AlertLog,
    registry: RegistryLocation,
    service_name: String,
}

impl<P: StateProbe> Checker<P> {
    pub fn new(
        probe: P,
        store: SnapshotStore,
        log: AlertLog,
        registry: RegistryLocation,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            store,
            log,
            registry,
            service_name: service_name.into(),
        }
    }

    /// Wire a checker from configuration
    pub fn from_config(probe: P, config: &HidsConfig) -> Self {
        Self::new(
            probe,
            SnapshotStore::new(&config.reference_path),
            AlertLog::new(&config.log_path),
            config.probe.registry.clone(),
            config.probe.service_name.clone(),
        )
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn log(&self) -> &AlertLog {
        &self.log
    }

    /// Probe the persisted facts and overwrite the baseline
    pub async fn capture_baseline(&self) -> Result<Snapshot> {
        let snapshot = self.probe.probe(&self.registry).await;
        self.store.save(&snapshot)?;
        info!(
            policy_lines = snapshot.policy_line_count(),
            registry = ?snapshot.registry,
            "baseline captured"
        );
        Ok(snapshot)
    }

    /// Compare live state with the baseline, recording one alert per divergence
    pub async fn run_check(&self) -> Result<CheckReport> {
        let reference = self.store.load()?.ok_or(HidsError::NoBaseline)?;

        let current = self.probe.read_facts(&self.registry).await;
        let running = self.probe.service_running(&self.service_name).await;

        let mut report = CheckReport::default();
        for divergence in evaluate(&reference, &current, running) {
            let record = self.log.record(&self.alert_message(divergence))?;
            report.alerts.push(record);
        }

        info!(alerts = report.alerts.len(), "check finished");
        Ok(report)
    }

    fn alert_message(&self, divergence: Divergence) -> String {
        match divergence {
            Divergence::Fact(FactName::Gpo) => {
                "[ALERT] Group Policy objects (GPO) have been modified!".to_string()
            }
            Divergence::Fact(FactName::Registry) => {
                format!("[ALERT] Registry value {} has been modified!", self.registry)
            }
            Divergence::ServiceNotRunning => {
                format!("[ALERT] The {} service is not running!", self.service_name)
            }
        }
    }
}
