//! HIDS Common - reference-snapshot integrity checks for a Windows host
//!
//! Captures a baseline of security-relevant configuration (Group Policy
//! listing, one registry value) and later compares the live system against
//! it, together with a fixed "service must be running" expectation.

pub mod alert_log;
pub mod checker;
pub mod compare;
pub mod config;
pub mod error;
pub mod exec;
pub mod probe;
pub mod schedule;
pub mod snapshot;
pub mod store;

pub use alert_log::{AlertLog, AlertRecord};
pub use checker::{CheckReport, Checker};
pub use compare::{diff, evaluate, Divergence};
pub use config::{HidsConfig, ProbeConfig, RegistryLocation, RegistryRoot, ScheduleConfig};
pub use error::{HidsError, ProbeError};
pub use probe::{StateProbe, WindowsProbe};
pub use snapshot::{FactName, Reading, RegistryScalar, Snapshot};
pub use store::{BaselineSummary, SnapshotStore};
