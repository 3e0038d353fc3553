//! International-migration cleaner.
//!
//! The raw quarterly file carries a human-readable period label plus three
//! count columns that mix thousands-separators and StatCan placeholder
//! tokens. We normalize to a wide table (one row per quarter) and a long
//! table (one row per quarter per component) for series-style consumption.

use std::path::Path;

use tracing::{info, warn};

use crate::dates::parse_quarter_label;
use crate::domain::{MigrationComponentObs, MigrationQuarter, MigrationTables};
use crate::error::AppError;
use crate::io::table::{build_header_map, open_csv, parse_count, require_column};
use crate::io::write::write_rows;

pub const WIDE_FILE: &str = "ab_international_migration_quarterly_wide.csv";
pub const LONG_FILE: &str = "ab_international_migration_quarterly_long.csv";

/// Geography tag stamped onto every long-format row.
const GEO_LABEL: &str = "Alberta";

/// Clean the quarterly migration components and derive total inflow pressure.
/// Writes the wide and long tables into `processed_dir`.
pub fn clean_international_migration(
    input: &Path,
    processed_dir: &Path,
) -> Result<MigrationTables, AppError> {
    let mut reader = open_csv(input)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read headers of '{}': {e}", input.display())))?
        .clone();
    let header_map = build_header_map(&headers);

    let period_idx = require_column(&header_map, "reference_period", input)?;
    let immigrants_idx = require_column(&header_map, "immigrants", input)?;
    let emigration_idx = require_column(&header_map, "net_emigration", input)?;
    let npr_idx = require_column(&header_map, "net_non_permanent_residents", input)?;

    let mut wide = Vec::new();
    let mut dropped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::input(format!(
                "CSV parse error in '{}' at record {idx}: {e}",
                input.display()
            ))
        })?;
        let label = record.get(period_idx).unwrap_or_default();
        let Some(quarter) = parse_quarter_label(label) else {
            // The quarter key is not needed for a pivot here, so a malformed
            // label costs only its own row.
            warn!(label, "migration: dropped row with unparseable period");
            dropped += 1;
            continue;
        };
        let immigrants = record.get(immigrants_idx).and_then(parse_count);
        let net_non_permanent_residents = record.get(npr_idx).and_then(parse_count);
        let net_emigration = record.get(emigration_idx).and_then(parse_count);

        // Inflow pressure = permanent + temporary inflows. `net_emigration`
        // is excluded on purpose: it is the outflow side of the ledger.
        let total_pressure = match (immigrants, net_non_permanent_residents) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        wide.push(MigrationQuarter {
            quarter,
            immigrants,
            net_non_permanent_residents,
            net_emigration,
            total_pressure,
        });
    }
    if wide.is_empty() {
        return Err(AppError::missing(format!(
            "No valid migration rows in '{}'",
            input.display()
        )));
    }
    wide.sort_by_key(|row| row.quarter);

    let tables = MigrationTables {
        long: melt_components(&wide),
        wide,
    };
    write_rows(&processed_dir.join(WIDE_FILE), &tables.wide)?;
    write_rows(&processed_dir.join(LONG_FILE), &tables.long)?;
    info!(
        quarters = tables.wide.len(),
        dropped, "international migration cleaned"
    );
    Ok(tables)
}

/// Component names in the long table, in their sorted (output) order.
pub const COMPONENTS: [&str; 4] = [
    "immigrants",
    "net_emigration",
    "net_non_permanent_residents",
    "total_pressure",
];

fn component_value(row: &MigrationQuarter, component: &str) -> Option<f64> {
    match component {
        "immigrants" => row.immigrants,
        "net_emigration" => row.net_emigration,
        "net_non_permanent_residents" => row.net_non_permanent_residents,
        "total_pressure" => row.total_pressure,
        _ => None,
    }
}

/// Melt the wide table to one row per (quarter, component), sorted by
/// quarter then component name.
fn melt_components(wide: &[MigrationQuarter]) -> Vec<MigrationComponentObs> {
    let mut long = Vec::with_capacity(wide.len() * COMPONENTS.len());
    for row in wide {
        for component in COMPONENTS {
            long.push(MigrationComponentObs {
                geo: GEO_LABEL.to_string(),
                quarter: row.quarter,
                component: component.to_string(),
                value: component_value(row, component),
            });
        }
    }
    long
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_raw(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("migration.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    const HEADER: &str =
        "Reference period,Immigrants,Net emigration,Net non-permanent residents\n";

    #[test]
    fn total_pressure_sums_the_two_inflow_components() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            &format!("{HEADER}Q1 2024,\"12,345\",1200,\"3,000\"\nQ2 2024,10000,..,-500\n"),
        );
        let tables = clean_international_migration(&raw, dir.path())?;
        assert_eq!(tables.wide.len(), 2);

        let q1 = &tables.wide[0];
        assert_eq!(q1.quarter, d(2024, 3, 31));
        assert_eq!(q1.total_pressure, Some(15345.0));

        let q2 = &tables.wide[1];
        assert_eq!(q2.net_emigration, None);
        assert_eq!(q2.total_pressure, Some(9500.0));
        Ok(())
    }

    #[test]
    fn absent_inflow_component_propagates_into_total() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(dir.path(), &format!("{HEADER}Q1 2024,..,100,3000\n"));
        let tables = clean_international_migration(&raw, dir.path())?;
        assert_eq!(tables.wide[0].immigrants, None);
        assert_eq!(tables.wide[0].total_pressure, None);
        Ok(())
    }

    #[test]
    fn malformed_period_labels_drop_only_their_row() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            &format!("{HEADER}Total 2024,1,2,3\nQ3 2024,100,10,20\n"),
        );
        let tables = clean_international_migration(&raw, dir.path())?;
        assert_eq!(tables.wide.len(), 1);
        assert_eq!(tables.wide[0].quarter, d(2024, 9, 30));
        Ok(())
    }

    #[test]
    fn long_table_is_sorted_and_round_trips_to_wide() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            &format!("{HEADER}Q2 2024,200,20,40\nQ1 2024,100,10,30\n"),
        );
        let tables = clean_international_migration(&raw, dir.path())?;

        // Sorted by quarter then component name.
        let keys: Vec<_> = tables
            .long
            .iter()
            .map(|r| (r.quarter, r.component.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(tables.long.iter().all(|r| r.geo == "Alberta"));

        // Pivoting the long table back on component recovers the wide table.
        for row in &tables.wide {
            for component in COMPONENTS {
                let obs = tables
                    .long
                    .iter()
                    .find(|r| r.quarter == row.quarter && r.component == component)
                    .unwrap();
                assert_eq!(obs.value, component_value(row, component));
            }
        }
        assert_eq!(tables.long.len(), tables.wide.len() * COMPONENTS.len());
        Ok(())
    }

    #[test]
    fn missing_component_column_is_fatal_and_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Reference period,Immigrants,Net emigration\nQ1 2024,1,2\n",
        );
        let err = clean_international_migration(&raw, dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("net_non_permanent_residents"));
    }
}
