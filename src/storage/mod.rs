//! Persistence layer.
//!
//! Two JSON artefacts survive a run: the saved constituent list used as
//! the universe fallback, and the optional screen report.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::{ScreenReport, UniverseEntry};

/// Default fallback universe file path.
pub const DEFAULT_UNIVERSE_FILE: &str = "S_P_500.json";

/// Save the universe list as a JSON array of `{"Symbol", "Security"}`.
pub fn save_universe(entries: &[UniverseEntry], path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)
        .context("Failed to serialise universe")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write universe to {path}"))?;

    debug!(path, count = entries.len(), "Universe saved");
    Ok(())
}

/// Load a universe list previously written by `save_universe`.
pub fn load_universe(path: &str) -> Result<Vec<UniverseEntry>> {
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read universe from {path}"))?;

    let entries: Vec<UniverseEntry> = serde_json::from_str(&json)
        .context(format!("Failed to parse universe from {path}"))?;

    info!(path, count = entries.len(), "Universe loaded from disk");
    Ok(entries)
}

/// Write a screen report as pretty JSON.
pub fn save_report(report: &ScreenReport, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialise screen report")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write report to {path}"))?;

    debug!(path, rows = report.rows.len(), "Report saved");
    Ok(())
}

/// Read a report back, e.g. to compare runs.
/// Returns None if the file doesn't exist.
pub fn load_report(path: &str) -> Result<Option<ScreenReport>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read report from {path}"))?;

    let report: ScreenReport = serde_json::from_str(&json)
        .context(format!("Failed to parse report from {path}"))?;

    Ok(Some(report))
}

/// Delete a file if present (for testing or reset).
pub fn delete_file(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
