//! HIDS configuration
//!
//! Config file: path given with `--config`, `$HIDS_CONFIG`, or `hids.toml`
//! in the working directory. Every field has a default, so an empty file
//! (or no file at all) yields the stock Netlogon watch.

use crate::error::{HidsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HIDS_CONFIG";

/// Config file picked up from the working directory
pub const LOCAL_CONFIG_FILE: &str = "hids.toml";

pub const DEFAULT_REFERENCE_FILE: &str = "hids_reference.json";
pub const DEFAULT_LOG_FILE: &str = "hids_log.txt";

const POWERSHELL_EXE: &str = r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";
const REG_EXE: &str = r"C:\Windows\System32\reg.exe";
const SC_EXE: &str = r"C:\Windows\System32\sc.exe";
const SCHTASKS_EXE: &str = r"C:\Windows\System32\schtasks.exe";

/// Registry hive a watched value lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryRoot {
    LocalMachine,
    CurrentUser,
    ClassesRoot,
    Users,
    CurrentConfig,
}

impl RegistryRoot {
    /// Short form accepted by reg.exe
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::LocalMachine => "HKLM",
            Self::CurrentUser => "HKCU",
            Self::ClassesRoot => "HKCR",
            Self::Users => "HKU",
            Self::CurrentConfig => "HKCC",
        }
    }
}

impl FromStr for RegistryRoot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HKLM" | "HKEY_LOCAL_MACHINE" => Ok(Self::LocalMachine),
            "HKCU" | "HKEY_CURRENT_USER" => Ok(Self::CurrentUser),
            "HKCR" | "HKEY_CLASSES_ROOT" => Ok(Self::ClassesRoot),
            "HKU" | "HKEY_USERS" => Ok(Self::Users),
            "HKCC" | "HKEY_CURRENT_CONFIG" => Ok(Self::CurrentConfig),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for RegistryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Location of the watched registry value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryLocation {
    /// Hive name, e.g. "HKLM"
    #[serde(default = "default_registry_root")]
    pub root: String,

    /// Subkey path below the hive
    #[serde(default = "default_registry_path")]
    pub path: String,

    /// Value name under the subkey
    #[serde(default = "default_registry_value")]
    pub value: String,
}

impl Default for RegistryLocation {
    fn default() -> Self {
        Self {
            root: default_registry_root(),
            path: default_registry_path(),
            value: default_registry_value(),
        }
    }
}

impl fmt::Display for RegistryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r"{}\{}\{}", self.root, self.path, self.value)
    }
}

/// State probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound on every external command, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_powershell")]
    pub powershell: PathBuf,

    #[serde(default = "default_reg")]
    pub reg: PathBuf,

    #[serde(default = "default_sc")]
    pub sc: PathBuf,

    /// PowerShell pipeline producing the policy listing
    #[serde(default = "default_policy_query")]
    pub policy_query: String,

    /// Service that must be running
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Keyword in the service query output meaning "running"
    #[serde(default = "default_running_marker")]
    pub running_marker: String,

    #[serde(default)]
    pub registry: RegistryLocation,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            powershell: default_powershell(),
            reg: default_reg(),
            sc: default_sc(),
            policy_query: default_policy_query(),
            service_name: default_service_name(),
            running_marker: default_running_marker(),
            registry: RegistryLocation::default(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Daily task registration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schtasks")]
    pub schtasks: PathBuf,

    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Daily start time, HH:MM (24h)
    #[serde(default = "default_start_time")]
    pub start_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            schtasks: default_schtasks(),
            task_name: default_task_name(),
            start_time: default_start_time(),
        }
    }
}

/// Main HIDS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HidsConfig {
    /// Reference snapshot file
    #[serde(default = "default_reference_path")]
    pub reference_path: PathBuf,

    /// Append-only alert log
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for HidsConfig {
    fn default() -> Self {
        Self {
            reference_path: default_reference_path(),
            log_path: default_log_path(),
            probe: ProbeConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl HidsConfig {
    /// Resolve which config file applies, if any
    ///
    /// Priority:
    /// 1. Explicit path (from `--config`)
    /// 2. `$HIDS_CONFIG`
    /// 3. `hids.toml` in the working directory
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        None
    }

    /// Load and validate the configuration, falling back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match Self::discover(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| HidsError::io(path, e))?;
        Self::from_toml(&contents)
            .map_err(|e| HidsError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| HidsError::Config(format!("cannot serialize configuration: {}", e)))
    }

    /// Reject values that would make a probe or the schedule meaningless
    pub fn validate(&self) -> Result<()> {
        if self.probe.timeout_secs == 0 {
            return Err(HidsError::Config("probe.timeout_secs must be > 0".into()));
        }
        if self.probe.service_name.trim().is_empty() {
            return Err(HidsError::Config("probe.service_name must not be empty".into()));
        }
        if self.probe.running_marker.is_empty() {
            return Err(HidsError::Config("probe.running_marker must not be empty".into()));
        }
        self.probe
            .registry
            .root
            .parse::<RegistryRoot>()
            .map_err(|root| HidsError::Config(format!("unknown registry root '{}'", root)))?;
        chrono::NaiveTime::parse_from_str(&self.schedule.start_time, "%H:%M").map_err(|_| {
            HidsError::Config(format!(
                "schedule.start_time '{}' is not HH:MM",
                self.schedule.start_time
            ))
        })?;
        if self.schedule.task_name.trim().is_empty() {
            return Err(HidsError::Config("schedule.task_name must not be empty".into()));
        }
        Ok(())
    }
}

fn default_reference_path() -> PathBuf {
    PathBuf::from(DEFAULT_REFERENCE_FILE)
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_powershell() -> PathBuf {
    PathBuf::from(POWERSHELL_EXE)
}

fn default_reg() -> PathBuf {
    PathBuf::from(REG_EXE)
}

fn default_sc() -> PathBuf {
    PathBuf::from(SC_EXE)
}

fn default_schtasks() -> PathBuf {
    PathBuf::from(SCHTASKS_EXE)
}

fn default_policy_query() -> String {
    // Redirected powershell output otherwise uses the OEM code page
    "[Console]::OutputEncoding=[Text.Encoding]::UTF8; Get-GPO -All | Select-Object DisplayName, GPOStatus"
        .to_string()
}

fn default_service_name() -> String {
    "Netlogon".to_string()
}

fn default_running_marker() -> String {
    "RUNNING".to_string()
}

fn default_registry_root() -> String {
    "HKLM".to_string()
}

fn default_registry_path() -> String {
    r"SYSTEM\CurrentControlSet\Services\Netlogon".to_string()
}

fn default_registry_value() -> String {
    "Start".to_string()
}

fn default_task_name() -> String {
    "HIDS_Check".to_string()
}

fn default_start_time() -> String {
    "09:00".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HidsConfig::default();
        assert_eq!(config.reference_path, PathBuf::from("hids_reference.json"));
        assert_eq!(config.log_path, PathBuf::from("hids_log.txt"));
        assert_eq!(config.probe.service_name, "Netlogon");
        assert_eq!(config.probe.registry.value, "Start");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_policy_query_forces_utf8_output() {
        let query = ProbeConfig::default().policy_query;
        assert!(query.starts_with("[Console]::OutputEncoding=[Text.Encoding]::UTF8;"));
        assert!(query.contains("Get-GPO -All"));
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = HidsConfig::from_toml("").unwrap();
        assert_eq!(config.schedule.task_name, "HIDS_Check");
        assert_eq!(config.probe.timeout_secs, 60);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = HidsConfig::from_toml(
            r#"
reference_path = "/tmp/ref.json"

[probe]
service_name = "W32Time"

[probe.registry]
value = "Type"
"#,
        )
        .unwrap();

        assert_eq!(config.reference_path, PathBuf::from("/tmp/ref.json"));
        assert_eq!(config.log_path, PathBuf::from("hids_log.txt"));
        assert_eq!(config.probe.service_name, "W32Time");
        assert_eq!(config.probe.registry.value, "Type");
        assert_eq!(config.probe.registry.root, "HKLM");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = HidsConfig::default();
        config.probe.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = HidsConfig::default();
        config.schedule.start_time = "9am".into();
        assert!(config.validate().is_err());

        let mut config = HidsConfig::default();
        config.probe.registry.root = "HKXX".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_root_parsing() {
        assert_eq!("hklm".parse::<RegistryRoot>(), Ok(RegistryRoot::LocalMachine));
        assert_eq!(
            "HKEY_CURRENT_USER".parse::<RegistryRoot>(),
            Ok(RegistryRoot::CurrentUser)
        );
        assert!("HKEY_NOWHERE".parse::<RegistryRoot>().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut original = HidsConfig::default();
        original.schedule.start_time = "22:15".into();

        let text = original.to_toml().unwrap();
        let parsed = HidsConfig::from_toml(&text).unwrap();

        assert_eq!(parsed.schedule.start_time, "22:15");
        assert_eq!(parsed.probe.registry, original.probe.registry);
    }

    #[test]
    fn test_explicit_path_wins_discovery() {
        let path = Path::new("/etc/hids/custom.toml");
        assert_eq!(HidsConfig::discover(Some(path)), Some(path.to_path_buf()));
    }
}
