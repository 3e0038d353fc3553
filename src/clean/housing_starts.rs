//! Housing-starts cleaner.
//!
//! The raw file is a wide panel: one row per geography, one column per
//! abbreviated-month label (`Jan-00`, `Feb-00`, ...). We take the single
//! target-region row, melt it into a monthly series, and derive quarterly
//! means.

use std::path::Path;

use tracing::{info, warn};

use crate::dates::{parse_month_label_2y, quarter_end_of};
use crate::domain::{HousingStartsTables, MonthlyStarts, QuarterlyStarts};
use crate::error::AppError;
use crate::io::table::{build_header_map, open_csv, parse_count, require_column};
use crate::io::write::write_rows;

pub const MONTHLY_FILE: &str = "ab_housing_starts_monthly.csv";
pub const QUARTERLY_FILE: &str = "ab_housing_starts_quarterly_avg.csv";

/// Melt the target region's row into monthly (SAAR) starts and derive the
/// quarterly mean. Writes both tables into `processed_dir`.
pub fn clean_housing_starts(
    input: &Path,
    processed_dir: &Path,
    region: &str,
) -> Result<HousingStartsTables, AppError> {
    let mut reader = open_csv(input)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read headers of '{}': {e}", input.display())))?
        .clone();
    let header_map = build_header_map(&headers);
    let geo_idx = require_column(&header_map, "geography", input)?;

    let region_row = find_region_row(&mut reader, geo_idx, region, input)?;

    // Melt: every non-geography column becomes one (date, value) candidate.
    let mut monthly = Vec::new();
    let mut skipped_labels = 0usize;
    for (idx, label) in headers.iter().enumerate() {
        if idx == geo_idx {
            continue;
        }
        let Some(date) = parse_month_label_2y(label) else {
            skipped_labels += 1;
            continue;
        };
        let Some(starts_saar_units) = region_row.get(idx).and_then(parse_count) else {
            continue;
        };
        monthly.push(MonthlyStarts {
            date,
            starts_saar_units,
        });
    }
    if skipped_labels > 0 {
        warn!(
            skipped_labels,
            "housing starts: ignored columns without a month label"
        );
    }
    if monthly.is_empty() {
        return Err(AppError::missing(format!(
            "No monthly housing-starts values for '{region}' in '{}'",
            input.display()
        )));
    }
    monthly.sort_by_key(|row| row.date);

    let tables = HousingStartsTables {
        quarterly: derive_quarterly_mean(&monthly),
        monthly,
    };
    write_rows(&processed_dir.join(MONTHLY_FILE), &tables.monthly)?;
    write_rows(&processed_dir.join(QUARTERLY_FILE), &tables.quarterly)?;
    info!(
        months = tables.monthly.len(),
        quarters = tables.quarterly.len(),
        region, "housing starts cleaned"
    );
    Ok(tables)
}

fn find_region_row(
    reader: &mut csv::Reader<std::fs::File>,
    geo_idx: usize,
    region: &str,
    input: &Path,
) -> Result<csv::StringRecord, AppError> {
    let target = region.trim().to_lowercase();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::input(format!(
                "CSV parse error in '{}' at record {idx}: {e}",
                input.display()
            ))
        })?;
        let geo = record.get(geo_idx).map(str::trim).unwrap_or_default();
        if geo.to_lowercase() == target {
            return Ok(record);
        }
    }
    Err(AppError::missing(format!(
        "Could not find '{region}' row in '{}'",
        input.display()
    )))
}

/// Arithmetic mean of the monthly values within each quarter. Quarters with
/// no contributing months are simply absent, never zero-filled.
fn derive_quarterly_mean(monthly: &[MonthlyStarts]) -> Vec<QuarterlyStarts> {
    use std::collections::BTreeMap;
    let mut buckets: BTreeMap<chrono::NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in monthly {
        let bucket = buckets.entry(quarter_end_of(row.date)).or_insert((0.0, 0));
        bucket.0 += row.starts_saar_units;
        bucket.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(quarter, (sum, n))| QuarterlyStarts {
            quarter,
            starts_saar_units: sum / n as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_raw(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("starts.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn quarterly_mean_matches_contributing_months() {
        let monthly = vec![
            MonthlyStarts {
                date: d(2024, 1, 31),
                starts_saar_units: 28000.0,
            },
            MonthlyStarts {
                date: d(2024, 2, 29),
                starts_saar_units: 30000.0,
            },
            MonthlyStarts {
                date: d(2024, 3, 31),
                starts_saar_units: 31000.0,
            },
            // A lone April month: Q2 mean is just this value.
            MonthlyStarts {
                date: d(2024, 4, 30),
                starts_saar_units: 20000.0,
            },
        ];
        let quarterly = derive_quarterly_mean(&monthly);
        assert_eq!(quarterly.len(), 2);
        assert_eq!(quarterly[0].quarter, d(2024, 3, 31));
        assert!((quarterly[0].starts_saar_units - 29666.666_666_666_668).abs() < 0.01);
        assert_eq!(quarterly[1].quarter, d(2024, 6, 30));
        assert_eq!(quarterly[1].starts_saar_units, 20000.0);
    }

    #[test]
    fn empty_quarters_do_not_appear() {
        let monthly = vec![
            MonthlyStarts {
                date: d(2024, 1, 31),
                starts_saar_units: 100.0,
            },
            MonthlyStarts {
                date: d(2024, 8, 31),
                starts_saar_units: 200.0,
            },
        ];
        let quarterly = derive_quarterly_mean(&monthly);
        let quarters: Vec<_> = quarterly.iter().map(|q| q.quarter).collect();
        assert_eq!(quarters, vec![d(2024, 3, 31), d(2024, 9, 30)]);
    }

    #[test]
    fn region_lookup_is_case_and_whitespace_insensitive() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Geography,Jan-24,Feb-24\nOntario,10000,11000\n  ALBERTA ,28000,\"30,000\"\n",
        );
        let tables = clean_housing_starts(&raw, dir.path(), "Alberta")?;
        assert_eq!(
            tables.monthly,
            vec![
                MonthlyStarts {
                    date: d(2024, 1, 31),
                    starts_saar_units: 28000.0
                },
                MonthlyStarts {
                    date: d(2024, 2, 29),
                    starts_saar_units: 30000.0
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_region_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(dir.path(), "Geography,Jan-24\nOntario,10000\n");
        let err = clean_housing_starts(&raw, dir.path(), "Alberta").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unparseable_values_are_dropped_not_zeroed() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Geography,Jan-24,Feb-24,Mar-24\nAlberta,28000,..,31000\n",
        );
        let tables = clean_housing_starts(&raw, dir.path(), "Alberta")?;
        assert_eq!(tables.monthly.len(), 2);
        // Mean over the two present months only.
        assert!((tables.quarterly[0].starts_saar_units - 29500.0).abs() < 1e-9);
        Ok(())
    }
}
