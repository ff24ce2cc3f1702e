//! Exit status for hidsctl

use hids_common::HidsError;

/// Exit code for success (alerts raised by a check still count as success)
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code when `check` runs before any baseline was captured
pub const EXIT_NO_BASELINE: i32 = 1;

/// Exit code for an invalid menu selection or invalid configuration
pub const EXIT_INVALID_SELECTION: i32 = 2;

/// Exit code when the reference or log file cannot be read or written
pub const EXIT_IO_ERROR: i32 = 3;

/// Exit code when the reference file exists but cannot be parsed
pub const EXIT_CORRUPTED_REFERENCE: i32 = 4;

/// Exit code when the scheduled task could not be registered
pub const EXIT_SCHEDULE_FAILED: i32 = 5;

/// Map a command failure to a process exit code
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<HidsError>() {
        Some(e) => e.exit_code(),
        None => EXIT_IO_ERROR,
    }
}
