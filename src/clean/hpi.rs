//! House-price-index cleaner.
//!
//! The HPI workbook has one sheet per geography, each with a month-label date
//! column and a set of numeric index columns that varies by vintage. We stack
//! the three geographies into one monthly panel and derive a quarterly panel
//! of per-column means.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::dates::{month_end_of, parse_month_label_4y, quarter_end_of};
use crate::domain::{HpiPanel, HpiRow, HpiTables};
use crate::error::AppError;
use crate::io::table::normalize_header_name;
use crate::io::workbook::{Cell, SheetGrid, read_sheet};
use crate::io::write::write_hpi_panel;

pub const MONTHLY_FILE: &str = "hpi_monthly_clean.csv";
pub const QUARTERLY_FILE: &str = "hpi_quarterly_avg.csv";

/// The three required sheets and the geography labels their rows get tagged
/// with. A missing sheet is fatal.
pub const SHEETS: [(&str, &str); 3] = [
    ("ALBERTA", "Alberta"),
    ("CALGARY", "Calgary"),
    ("EDMONTON", "Edmonton"),
];

/// Read the three geography sheets, stack them into a monthly panel, and
/// derive the quarterly means. Writes both panels into `processed_dir`.
pub fn clean_hpi(input: &Path, processed_dir: &Path) -> Result<HpiTables, AppError> {
    let mut sheets = Vec::with_capacity(SHEETS.len());
    for (sheet_name, geo_label) in SHEETS {
        let grid = read_sheet(input, sheet_name)?;
        sheets.push((geo_label.to_string(), grid));
    }
    let tables = clean_sheets(&sheets)?;

    write_hpi_panel(&processed_dir.join(MONTHLY_FILE), "date", &tables.monthly)?;
    write_hpi_panel(&processed_dir.join(QUARTERLY_FILE), "quarter", &tables.quarterly)?;
    info!(
        rows = tables.monthly.rows.len(),
        columns = tables.monthly.value_columns.len(),
        "HPI cleaned"
    );
    Ok(tables)
}

/// Core transform, separated from workbook reading so it can be exercised on
/// constructed cell grids.
pub fn clean_sheets(sheets: &[(String, SheetGrid)]) -> Result<HpiTables, AppError> {
    // Union of value columns across sheets, in first-seen order. Sheets from
    // different vintages may disagree on the exact column set; absent cells
    // stay absent.
    let mut value_columns: Vec<String> = Vec::new();
    let mut rows: Vec<HpiRow> = Vec::new();

    for (geo, grid) in sheets {
        let mut iter = grid.iter().enumerate();
        let (_, header_row) = iter.next().ok_or_else(|| {
            AppError::input(format!("HPI sheet for '{geo}' is empty"))
        })?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| match cell {
                Cell::Text(s) => normalize_header_name(s),
                _ => String::new(),
            })
            .collect();
        let date_idx = headers.iter().position(|h| h == "date").ok_or_else(|| {
            AppError::input(format!("Missing required column `date` in HPI sheet for '{geo}'"))
        })?;

        // Map this sheet's value columns into the union.
        let mut union_idx: Vec<Option<usize>> = Vec::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            if idx == date_idx || name.is_empty() {
                union_idx.push(None);
                continue;
            }
            let pos = match value_columns.iter().position(|c| c == name) {
                Some(pos) => pos,
                None => {
                    value_columns.push(name.clone());
                    value_columns.len() - 1
                }
            };
            union_idx.push(Some(pos));
        }

        for (row_no, row) in iter {
            if row.iter().all(|c| matches!(c, Cell::Empty)) {
                continue;
            }
            let date = parse_date_cell(row.get(date_idx)).ok_or_else(|| {
                AppError::input(format!(
                    "Unparseable `date` at row {} of HPI sheet for '{geo}'",
                    row_no + 1
                ))
            })?;

            let mut values = vec![None; value_columns.len()];
            for (idx, cell) in row.iter().enumerate() {
                let Some(Some(pos)) = union_idx.get(idx) else {
                    continue;
                };
                values[*pos] = numeric_cell(cell);
            }
            rows.push(HpiRow {
                geo: geo.clone(),
                date,
                values,
            });
        }
    }

    // Earlier sheets may have produced shorter value vectors than the final
    // union; pad them out.
    for row in &mut rows {
        row.values.resize(value_columns.len(), None);
    }
    rows.sort_by(|a, b| (&a.geo, a.date).cmp(&(&b.geo, b.date)));

    let monthly = HpiPanel {
        value_columns: value_columns.clone(),
        rows,
    };
    let quarterly = derive_quarterly_means(&monthly);
    Ok(HpiTables { monthly, quarterly })
}

fn parse_date_cell(cell: Option<&Cell>) -> Option<NaiveDate> {
    match cell? {
        Cell::Text(s) => parse_month_label_4y(s),
        Cell::Date(d) => Some(month_end_of(*d)),
        _ => None,
    }
}

fn numeric_cell(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) if v.is_finite() => Some(*v),
        Cell::Text(s) => crate::io::table::parse_count(s),
        _ => None,
    }
}

/// Per-geography quarterly mean of every numeric column, over present values
/// only; a column with no present values in a quarter stays absent.
fn derive_quarterly_means(monthly: &HpiPanel) -> HpiPanel {
    let width = monthly.value_columns.len();
    let mut buckets: BTreeMap<(String, NaiveDate), Vec<(f64, usize)>> = BTreeMap::new();
    for row in &monthly.rows {
        let key = (row.geo.clone(), quarter_end_of(row.date));
        let acc = buckets.entry(key).or_insert_with(|| vec![(0.0, 0); width]);
        for (idx, value) in row.values.iter().enumerate() {
            if let Some(v) = value {
                acc[idx].0 += v;
                acc[idx].1 += 1;
            }
        }
    }

    let rows = buckets
        .into_iter()
        .map(|((geo, quarter), acc)| HpiRow {
            geo,
            date: quarter,
            values: acc
                .into_iter()
                .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
                .collect(),
        })
        .collect();
    HpiPanel {
        value_columns: monthly.value_columns.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sheet(label: &str, grid: SheetGrid) -> (String, SheetGrid) {
        (label.to_string(), grid)
    }

    #[test]
    fn stacks_sheets_and_averages_quarters() {
        let grid = vec![
            vec![text("Date"), text("Composite HPI SA"), text("Benchmark SA")],
            vec![text("Jan 2024"), Cell::Number(200.0), Cell::Number(500000.0)],
            vec![text("Feb 2024"), Cell::Number(210.0), Cell::Empty],
            vec![text("Mar 2024"), Cell::Number(220.0), Cell::Number(520000.0)],
        ];
        let tables = clean_sheets(&[sheet("Calgary", grid)]).unwrap();

        assert_eq!(
            tables.monthly.value_columns,
            vec!["composite_hpi_sa", "benchmark_sa"]
        );
        assert_eq!(tables.monthly.rows.len(), 3);
        assert_eq!(tables.monthly.rows[0].date, d(2024, 1, 31));

        assert_eq!(tables.quarterly.rows.len(), 1);
        let q = &tables.quarterly.rows[0];
        assert_eq!(q.date, d(2024, 3, 31));
        assert_eq!(q.values[0], Some(210.0));
        // Benchmark mean covers only the two present months.
        assert_eq!(q.values[1], Some(510000.0));
    }

    #[test]
    fn sheets_sort_by_geography_then_date() {
        let mk = |label: &str, month: &str, v: f64| {
            sheet(
                label,
                vec![
                    vec![text("Date"), text("Composite")],
                    vec![text(month), Cell::Number(v)],
                ],
            )
        };
        let tables = clean_sheets(&[
            mk("Edmonton", "Jan 2024", 1.0),
            mk("Alberta", "Feb 2024", 2.0),
            mk("Alberta", "Jan 2024", 3.0),
        ])
        .unwrap();
        let keys: Vec<_> = tables
            .monthly
            .rows
            .iter()
            .map(|r| (r.geo.clone(), r.date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Alberta".to_string(), d(2024, 1, 31)),
                ("Alberta".to_string(), d(2024, 2, 29)),
                ("Edmonton".to_string(), d(2024, 1, 31)),
            ]
        );
    }

    #[test]
    fn column_union_pads_earlier_sheets() {
        let a = sheet(
            "Alberta",
            vec![
                vec![text("Date"), text("Composite")],
                vec![text("Jan 2024"), Cell::Number(1.0)],
            ],
        );
        let b = sheet(
            "Calgary",
            vec![
                vec![text("Date"), text("Composite"), text("Apartment")],
                vec![text("Jan 2024"), Cell::Number(2.0), Cell::Number(3.0)],
            ],
        );
        let tables = clean_sheets(&[a, b]).unwrap();
        assert_eq!(
            tables.monthly.value_columns,
            vec!["composite", "apartment"]
        );
        // The Alberta row has no apartment column: explicit absence.
        assert_eq!(tables.monthly.rows[0].values, vec![Some(1.0), None]);
    }

    #[test]
    fn native_excel_dates_are_accepted() {
        let grid = vec![
            vec![text("Date"), text("Composite")],
            vec![Cell::Date(d(2024, 1, 1)), Cell::Number(9.0)],
        ];
        let tables = clean_sheets(&[sheet("Alberta", grid)]).unwrap();
        assert_eq!(tables.monthly.rows[0].date, d(2024, 1, 31));
    }

    #[test]
    fn unparseable_date_is_fatal() {
        let grid = vec![
            vec![text("Date"), text("Composite")],
            vec![text("not a month"), Cell::Number(1.0)],
        ];
        let err = clean_sheets(&[sheet("Alberta", grid)]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Alberta"));
    }

    #[test]
    fn missing_date_column_is_fatal() {
        let grid = vec![
            vec![text("Period"), text("Composite")],
            vec![text("Jan 2024"), Cell::Number(1.0)],
        ];
        let err = clean_sheets(&[sheet("Calgary", grid)]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("date"));
    }
}
