//! State probe: reads the live values of the watched facts.
//!
//! Collaborators: powershell (policy listing), reg.exe (registry scalar),
//! sc.exe (service state). A failed read is reported as unreadable and
//! degrades to the alerting value: empty listing, absent scalar, service
//! not running.

use crate::config::{ProbeConfig, RegistryLocation, RegistryRoot};
use crate::error::ProbeError;
use crate::exec::run_bounded;
use crate::snapshot::{FactName, Reading, RegistryScalar, Snapshot};
use tracing::warn;

/// Source of live configuration facts
#[allow(async_fn_in_trait)]
pub trait StateProbe {
    /// Raw policy listing text, unparsed
    async fn policy_listing(&self) -> Result<String, ProbeError>;

    /// One registry value; `Ok(None)` when the key or value does not exist
    async fn registry_scalar(&self, location: &RegistryLocation)
        -> Result<RegistryScalar, ProbeError>;

    /// Whether the named service reports a running state
    async fn service_running(&self, service: &str) -> bool;

    /// Current persisted facts (policy listing and registry scalar)
    async fn probe(&self, location: &RegistryLocation) -> Snapshot {
        self.read_facts(location).await.snapshot
    }

    /// Current persisted facts, noting which collaborators failed
    async fn read_facts(&self, location: &RegistryLocation) -> Reading {
        let mut unreadable = Vec::new();

        let gpo = match self.policy_listing().await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "policy enumeration failed");
                unreadable.push(FactName::Gpo);
                String::new()
            }
        };
        let registry = match self.registry_scalar(location).await {
            Ok(value) => value,
            Err(e) => {
                warn!(location = %location, error = %e, "registry read failed");
                unreadable.push(FactName::Registry);
                None
            }
        };

        Reading {
            snapshot: Snapshot { gpo, registry },
            unreadable,
        }
    }
}

/// Probe backed by the stock Windows administration tools
#[derive(Debug, Clone)]
pub struct WindowsProbe {
    config: ProbeConfig,
}

impl WindowsProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

impl StateProbe for WindowsProbe {
    async fn policy_listing(&self) -> Result<String, ProbeError> {
        let args = [
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            self.config.policy_query.as_str(),
        ];
        let out = run_bounded(&self.config.powershell, &args, self.config.timeout()).await?;
        if !out.success() {
            warn!(code = ?out.code, stderr = %out.stderr.trim(), "policy enumeration exited with failure");
        }
        Ok(out.stdout)
    }

    async fn registry_scalar(
        &self,
        location: &RegistryLocation,
    ) -> Result<RegistryScalar, ProbeError> {
        let key = registry_key(location)?;
        let args = ["query", key.as_str(), "/v", location.value.as_str()];
        let out = run_bounded(&self.config.reg, &args, self.config.timeout()).await?;

        if !out.success() {
            if is_not_found(&out.stderr) || is_not_found(&out.stdout) {
                return Ok(None);
            }
            return Err(ProbeError::RegistryAccess(out.stderr.trim().to_string()));
        }

        parse_reg_scalar(&out.stdout, &location.value)
    }

    async fn service_running(&self, service: &str) -> bool {
        let args = ["query", service];
        match run_bounded(&self.config.sc, &args, self.config.timeout()).await {
            Ok(out) => reports_running(&out.stdout, &self.config.running_marker),
            Err(e) => {
                warn!(service, error = %e, "service query unavailable; assuming not running");
                false
            }
        }
    }
}

/// Full `ROOT\path` key for reg.exe, validating root and path
pub fn registry_key(location: &RegistryLocation) -> Result<String, ProbeError> {
    let root: RegistryRoot = location
        .root
        .parse()
        .map_err(ProbeError::UnknownRoot)?;

    let path = location.path.trim();
    if path.is_empty() || path.starts_with('\\') || path.contains('/') {
        return Err(ProbeError::MalformedPath(location.path.clone()));
    }

    Ok(format!(r"{}\{}", root.short_name(), path))
}

fn is_not_found(text: &str) -> bool {
    text.contains("unable to find")
}

/// Whether service query output reports the running marker
pub fn reports_running(output: &str, marker: &str) -> bool {
    !marker.is_empty() && output.contains(marker)
}

/// Extract an integer value from `reg query` output.
///
/// Rows read `<name>    REG_<TYPE>    <data>`; the name may contain spaces,
/// so it is matched as a prefix followed by the type token. A successful
/// query that does not list the value is treated as absent.
pub fn parse_reg_scalar(output: &str, value_name: &str) -> Result<RegistryScalar, ProbeError> {
    for line in output.lines() {
        let Some((kind, raw)) = value_row(line, value_name) else {
            continue;
        };

        let parsed = match kind {
            "REG_DWORD" => parse_number(&raw).and_then(|v| u32::try_from(v).ok().map(i64::from)),
            "REG_QWORD" => parse_number(&raw).and_then(|v| i64::try_from(v).ok()),
            other => {
                return Err(ProbeError::UnsupportedType {
                    name: value_name.to_string(),
                    kind: other.to_string(),
                })
            }
        };

        return parsed.map(Some).ok_or_else(|| {
            ProbeError::RegistryAccess(format!("unparsable {} value '{}'", kind, raw))
        });
    }

    Ok(None)
}

/// Type token and data of the row for `value_name`, if `line` is that row
fn value_row<'a>(line: &'a str, value_name: &str) -> Option<(&'a str, String)> {
    let line = line.trim_start();
    let head = line.get(..value_name.len())?;
    if value_name.is_empty() || !head.eq_ignore_ascii_case(value_name) {
        return None;
    }

    let rest = &line[value_name.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut parts = rest.split_whitespace();
    let kind = parts.next().filter(|k| k.starts_with("REG_"))?;
    Some((kind, parts.collect::<Vec<_>>().join(" ")))
}

fn parse_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
