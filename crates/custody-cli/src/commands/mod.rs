//! CLI command implementations.

pub mod config;
pub mod count;
pub mod locked;
pub mod owned;
pub mod version;
pub mod vote;

use anyhow::Result;
use serde::Serialize;

/// Prints `report` as pretty JSON.
pub(crate) fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
