//! Tidy-CSV writers.
//!
//! Output column names and file names are part of the external contract:
//! the figure builders and any downstream consumers read them literally.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::HpiPanel;
use crate::error::AppError;

/// Serialize `rows` to `path` as CSV, one record per row.
///
/// The header row comes from the struct's field names, so the on-disk schema
/// always matches the domain type.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

/// Write an HPI panel, whose value columns are only known at runtime.
///
/// `key_column` names the period column (`date` for the monthly panel,
/// `quarter` for the quarterly one); absent values become empty fields.
pub fn write_hpi_panel(path: &Path, key_column: &str, panel: &HpiPanel) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;

    let mut header = vec!["geo".to_string(), key_column.to_string()];
    header.extend(panel.value_columns.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;

    for row in &panel.rows {
        let mut record = vec![row.geo.clone(), row.date.to_string()];
        for v in &row.values {
            record.push(v.map(|x| x.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::input(format!("Failed to create directory '{}': {e}", dir.display()))
        })?;
    }
    Ok(())
}
