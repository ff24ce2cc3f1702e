//! Interactive operation menu (hidsctl with no subcommand)

use hids_common::HidsError;
use std::io::{BufRead, Write};

pub const PROMPT: &str =
    "Choose an option: (1) Capture baseline, (2) Run HIDS check, (3) Schedule daily check: ";

/// Operation picked by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Capture,
    Check,
    Schedule,
}

pub fn parse_selection(input: &str) -> Result<Selection, HidsError> {
    match input.trim() {
        "1" => Ok(Selection::Capture),
        "2" => Ok(Selection::Check),
        "3" => Ok(Selection::Schedule),
        other => Err(HidsError::InvalidSelection(other.to_string())),
    }
}

/// Show the prompt on `output` and read one selection from `input`
pub fn prompt<R: BufRead, W: Write>(mut input: R, mut output: W) -> anyhow::Result<Selection> {
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_selection(&line)?)
}
