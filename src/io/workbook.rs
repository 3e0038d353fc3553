//! XLSX workbook access.
//!
//! This is the only module that touches `calamine`; sheets are converted to a
//! plain cell grid so the HPI cleaner (and its tests) never deal with Excel
//! cell types directly.

use std::path::Path;

use calamine::{Data, DataType, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;

use crate::error::AppError;

/// One workbook cell, reduced to what the cleaners care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// A native Excel datetime, already reduced to its calendar date.
    Date(NaiveDate),
}

/// A sheet as rows of cells, in worksheet order (first row = headers).
pub type SheetGrid = Vec<Vec<Cell>>;

/// Read `sheet_name` from the workbook at `path`.
///
/// A missing sheet is fatal: the HPI contract requires all three geography
/// sheets to be present.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<SheetGrid, AppError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        AppError::input(format!(
            "Failed to open workbook '{}': {e}",
            path.display()
        ))
    })?;
    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        AppError::input(format!(
            "Missing required sheet `{sheet_name}` in '{}': {e}",
            path.display()
        ))
    })?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(grid)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => data
            .as_datetime()
            .map(|dt| Cell::Date(dt.date()))
            .unwrap_or_else(|| match data.as_string() {
                Some(s) => Cell::Text(s),
                None => Cell::Empty,
            }),
    }
}
