//! Capture/check flows against a scripted probe.
//!
//! The probe's facts are mutated between capture and check to simulate
//! changes on the host.

use hids_common::{
    AlertLog, Checker, HidsError, ProbeError, RegistryLocation, RegistryScalar, SnapshotStore,
    StateProbe,
};
use std::cell::{Cell, RefCell};
use std::fs;
use tempfile::{tempdir, TempDir};

struct FakeProbe {
    gpo: RefCell<String>,
    gpo_fails: Cell<bool>,
    registry: Cell<RegistryScalar>,
    registry_fails: Cell<bool>,
    running: Cell<bool>,
    service_queries: Cell<usize>,
}

impl FakeProbe {
    fn new(gpo: &str, registry: RegistryScalar, running: bool) -> Self {
        Self {
            gpo: RefCell::new(gpo.to_string()),
            gpo_fails: Cell::new(false),
            registry: Cell::new(registry),
            registry_fails: Cell::new(false),
            running: Cell::new(running),
            service_queries: Cell::new(0),
        }
    }
}

impl StateProbe for &FakeProbe {
    async fn policy_listing(&self) -> Result<String, ProbeError> {
        if self.gpo_fails.get() {
            return Err(ProbeError::Timeout {
                program: "powershell.exe".into(),
                secs: 60,
            });
        }
        Ok(self.gpo.borrow().clone())
    }

    async fn registry_scalar(
        &self,
        _location: &RegistryLocation,
    ) -> Result<RegistryScalar, ProbeError> {
        if self.registry_fails.get() {
            return Err(ProbeError::RegistryAccess("access denied".into()));
        }
        Ok(self.registry.get())
    }

    async fn service_running(&self, _service: &str) -> bool {
        self.service_queries.set(self.service_queries.get() + 1);
        self.running.get()
    }
}

fn checker<'a>(probe: &'a FakeProbe, dir: &TempDir) -> Checker<&'a FakeProbe> {
    Checker::new(
        probe,
        SnapshotStore::new(dir.path().join("hids_reference.json")),
        AlertLog::new(dir.path().join("hids_log.txt")).quiet(),
        RegistryLocation::default(),
        "Netlogon",
    )
}

fn log_lines(dir: &TempDir) -> Vec<String> {
    fs::read_to_string(dir.path().join("hids_log.txt"))
        .map(|c| c.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_check_without_baseline_is_precondition_failure() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), false);
    let checker = checker(&probe, &dir);

    let err = checker.run_check().await.unwrap_err();
    assert!(matches!(err, HidsError::NoBaseline));
    assert_eq!(err.exit_code(), 1);
    assert!(!dir.path().join("hids_log.txt").exists());
    assert_eq!(probe.service_queries.get(), 0);
}

#[tokio::test]
async fn test_capture_is_idempotent() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled\r\nB:Disabled\r\n", Some(2), true);
    let checker = checker(&probe, &dir);
    let path = dir.path().join("hids_reference.json");

    checker.capture_baseline().await.unwrap();
    let first = fs::read(&path).unwrap();
    checker.capture_baseline().await.unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_capture_does_not_query_service() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), false);

    checker(&probe, &dir).capture_baseline().await.unwrap();

    assert_eq!(probe.service_queries.get(), 0);
    let raw = fs::read_to_string(dir.path().join("hids_reference.json")).unwrap();
    assert!(!raw.contains("service"));
}

#[tokio::test]
async fn test_unchanged_host_produces_no_alerts() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    let report = checker.run_check().await.unwrap();

    assert!(report.is_clean());
    assert!(log_lines(&dir).is_empty());
}

#[tokio::test]
async fn test_policy_change_raises_one_gpo_alert() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    *probe.gpo.borrow_mut() = "A:Disabled".to_string();
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("GPO"));
    let lines = log_lines(&dir);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("GPO"));
}

#[tokio::test]
async fn test_deleted_registry_value_raises_one_alert() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    probe.registry.set(None);
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("Registry"));
}

#[tokio::test]
async fn test_absent_registry_in_both_is_not_an_alert() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", None, true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    let report = checker.run_check().await.unwrap();

    assert!(report.is_clean());
}

#[tokio::test]
async fn test_registry_read_error_against_concrete_baseline_alerts() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(4), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    probe.registry_fails.set(true);
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("Registry"));
}

#[tokio::test]
async fn test_registry_read_error_against_absent_baseline_alerts() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", None, true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    probe.registry_fails.set(true);
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("Registry"));
    assert_eq!(log_lines(&dir).len(), 1);
}

#[tokio::test]
async fn test_capture_with_failed_registry_read_stores_absent() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), true);
    probe.registry_fails.set(true);
    let checker = checker(&probe, &dir);

    let snapshot = checker.capture_baseline().await.unwrap();
    assert_eq!(snapshot.registry, None);

    // once the value is readable again it no longer matches the stored null
    probe.registry_fails.set(false);
    let report = checker.run_check().await.unwrap();
    assert_eq!(report.alerts.len(), 1);
}

#[tokio::test]
async fn test_failed_policy_enumeration_alerts_even_with_empty_baseline() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("", Some(2), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    probe.gpo_fails.set(true);
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("GPO"));
}

#[tokio::test]
async fn test_service_down_alerts_regardless_of_other_facts() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), false);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    let report = checker.run_check().await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].message.contains("Netlogon service"));
}

#[tokio::test]
async fn test_all_divergences_logged_in_fixed_order() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), true);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    *probe.gpo.borrow_mut() = "A:Disabled".to_string();
    probe.registry.set(Some(4));
    probe.running.set(false);
    checker.run_check().await.unwrap();

    let lines = log_lines(&dir);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("GPO"));
    assert!(lines[1].contains("Registry"));
    assert!(lines[2].contains("service"));
}

#[tokio::test]
async fn test_repeated_checks_append() {
    let dir = tempdir().unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), false);
    let checker = checker(&probe, &dir);

    checker.capture_baseline().await.unwrap();
    checker.run_check().await.unwrap();
    checker.run_check().await.unwrap();

    assert_eq!(log_lines(&dir).len(), 2);
}

#[tokio::test]
async fn test_corrupted_reference_aborts_check() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hids_reference.json"), "[1, 2").unwrap();
    let probe = FakeProbe::new("A:Enabled", Some(2), false);

    let err = checker(&probe, &dir).run_check().await.unwrap_err();

    assert!(matches!(err, HidsError::CorruptedReference { .. }));
    assert!(log_lines(&dir).is_empty());
}
