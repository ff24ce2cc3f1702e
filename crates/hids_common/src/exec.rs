//! Bounded external command execution.
//!
//! Every collaborator (powershell, reg, sc, schtasks) is spawned directly by
//! path, never through a shell, and killed if it outlives the timeout.

use crate::error::ProbeError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `program args...` to completion or until `timeout` elapses.
pub async fn run_bounded(
    program: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ProbeError> {
    let name = program.display().to_string();
    debug!(program = %name, ?args, "spawning collaborator");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProbeError::Unavailable {
            program: name.clone(),
            source,
        })?;

    // Dropping the pending future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ProbeError::Unavailable {
            program: name.clone(),
            source,
        })?,
        Err(_) => {
            return Err(ProbeError::Timeout {
                program: name,
                secs: timeout.as_secs(),
            })
        }
    };

    let result = CommandOutput {
        code: output.status.code(),
        stdout: decode_output(&output.stdout),
        stderr: decode_output(&output.stderr),
    };
    debug!(program = %name, code = ?result.code, "collaborator finished");
    Ok(result)
}

/// Decode collaborator output without dropping bytes.
///
/// Valid UTF-8 passes through unchanged; each byte of an invalid sequence is
/// kept as a `\xNN` escape, so outputs that differ in any byte decode to
/// different text.
pub fn decode_output(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                // `valid_up_to` marks a UTF-8 prefix
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad = e.error_len().unwrap_or(after.len());
                for byte in &after[..bad] {
                    text.push_str(&format!("\\x{:02X}", byte));
                }
                rest = &after[bad..];
            }
        }
    }
}
