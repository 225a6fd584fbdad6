//! CSV writers for derived tables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use refframe_core::{Error, Result};

use crate::loader::ParticipantRange;

/// `{dir}/{start}-{end}{suffix}`, e.g. `5-28_preprocessed_art.csv`
pub fn output_path(dir: &Path, range: ParticipantRange, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}", range.label(), suffix))
}

/// Serialize rows with their serde column names as header
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Csv(format!("{}: {e}", path.display())))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write an already formatted table
pub fn write_table(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    if let Some(row) = rows.iter().find(|row| row.len() != header.len()) {
        return Err(Error::InvalidInput(format!(
            "row has {} cells but header has {}",
            row.len(),
            header.len()
        )));
    }

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Csv(format!("{}: {e}", path.display())))?;

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!("Wrote {}x{} table to {}", rows.len(), header.len(), path.display());
    Ok(())
}

/// Shortest round-tripping representation; undefined values stay empty
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}
