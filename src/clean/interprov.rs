//! Interprovincial-migration cleaner.
//!
//! The raw file is a two-row flow table after a header-continuation row: one
//! row of in-migrants, one of out-migrants, with quarter-label columns. We
//! melt to long form, then pivot back to a wide quarterly table with
//! canonical in/out/net columns.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dates::parse_quarter_label;
use crate::domain::{InterprovObs, InterprovQuarter, InterprovTables};
use crate::error::AppError;
use crate::io::table::{normalize_label, open_csv, parse_count};
use crate::io::write::write_rows;

pub const LONG_FILE: &str = "interprovincial_migration_long.csv";
pub const QUARTERLY_FILE: &str = "interprovincial_migration_quarterly.csv";

/// Clean the two-row interprovincial flow table. Writes the long and wide
/// tables into `processed_dir`.
pub fn clean_interprov_migration(
    input: &Path,
    processed_dir: &Path,
) -> Result<InterprovTables, AppError> {
    let mut reader = open_csv(input)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read headers of '{}': {e}", input.display())))?
        .clone();

    // The first body row continues the header; the two after it are the
    // in-migrants / out-migrants series.
    let mut records = reader.records();
    let mut flow_rows = Vec::with_capacity(2);
    for (idx, result) in records.by_ref().enumerate() {
        let record = result.map_err(|e| {
            AppError::input(format!(
                "CSV parse error in '{}' at record {idx}: {e}",
                input.display()
            ))
        })?;
        if idx == 0 {
            continue;
        }
        flow_rows.push(record);
        if flow_rows.len() == 2 {
            break;
        }
    }
    if flow_rows.len() < 2 {
        return Err(AppError::input(format!(
            "Expected two flow rows (in-migrants, out-migrants) in '{}', found {}",
            input.display(),
            flow_rows.len()
        )));
    }

    // Melt: (flow_type, quarter_label, people, quarter). Both the count and
    // the quarter key are required here — the quarter is the pivot key.
    let mut long = Vec::new();
    for record in &flow_rows {
        let flow_type = record.get(0).map(str::trim).unwrap_or_default().to_string();
        for (idx, label) in headers.iter().enumerate().skip(1) {
            let quarter_label = label.trim().to_string();
            let raw = record.get(idx).map(str::trim).unwrap_or_default();
            if raw.is_empty() && quarter_label.is_empty() {
                continue;
            }
            let people = parse_count(raw).ok_or_else(|| {
                AppError::input(format!(
                    "Unparseable count '{raw}' for '{flow_type}' at '{quarter_label}' in '{}'",
                    input.display()
                ))
            })?;
            let quarter = parse_quarter_label(&quarter_label).ok_or_else(|| {
                AppError::input(format!(
                    "Unparseable quarter label '{quarter_label}' in '{}'",
                    input.display()
                ))
            })?;
            long.push(InterprovObs {
                flow_type: flow_type.clone(),
                quarter_label,
                people,
                quarter,
            });
        }
    }

    let tables = InterprovTables {
        wide: pivot_quarterly(&long),
        long,
    };
    write_rows(&processed_dir.join(LONG_FILE), &tables.long)?;
    write_rows(&processed_dir.join(QUARTERLY_FILE), &tables.wide)?;
    info!(quarters = tables.wide.len(), "interprovincial migration cleaned");
    Ok(tables)
}

/// Pivot the long table to one row per quarter with canonical in/out/net
/// columns. Flow labels are matched by substring after normalization; a flow
/// with no matching rows defaults to zero for every quarter.
fn pivot_quarterly(long: &[InterprovObs]) -> Vec<InterprovQuarter> {
    #[derive(Default, Clone, Copy)]
    struct Flows {
        inflow: Option<f64>,
        outflow: Option<f64>,
    }

    let mut buckets: BTreeMap<NaiveDate, Flows> = BTreeMap::new();
    for obs in long {
        let flows = buckets.entry(obs.quarter).or_default();
        let label = normalize_label(&obs.flow_type);
        if label.contains("in-migrants") {
            flows.inflow = Some(obs.people);
        } else if label.contains("out-migrants") {
            flows.outflow = Some(obs.people);
        } else {
            warn!(flow_type = %obs.flow_type, "interprov: ignoring unrecognized flow row");
        }
    }

    buckets
        .into_iter()
        .map(|(quarter, flows)| {
            let interprov_in = flows.inflow.unwrap_or(0.0);
            let interprov_out = flows.outflow.unwrap_or(0.0);
            InterprovQuarter {
                quarter,
                interprov_in,
                interprov_out,
                interprov_net: interprov_in - interprov_out,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_raw(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("interprov.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn net_is_in_minus_out_for_every_quarter() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Flow,Q1 2024,Q2 2024,Q3 2024\n\
             continuation,0,0,0\n\
             In-migrants,100,250,300\n\
             Out-migrants,40,260,180\n",
        );
        let tables = clean_interprov_migration(&raw, dir.path())?;
        assert_eq!(tables.wide.len(), 3);
        for q in &tables.wide {
            assert_eq!(q.interprov_net, q.interprov_in - q.interprov_out);
        }
        // Net can be negative when outflows dominate.
        assert_eq!(tables.wide[1].interprov_net, -10.0);
        Ok(())
    }

    #[test]
    fn canonical_layout_produces_in_out_net() -> Result<(), AppError> {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Geography,Q1 2024,Q2 2024\n\
             Alberta - header continuation,0,0\n\
             \u{a0}In-migrants,\"32,000\",\"35,500\"\n\
             \u{a0}Out-migrants,\"21,000\",\"22,500\"\n",
        );
        let tables = clean_interprov_migration(&raw, dir.path())?;
        assert_eq!(
            tables.wide,
            vec![
                InterprovQuarter {
                    quarter: d(2024, 3, 31),
                    interprov_in: 32000.0,
                    interprov_out: 21000.0,
                    interprov_net: 11000.0,
                },
                InterprovQuarter {
                    quarter: d(2024, 6, 30),
                    interprov_in: 35500.0,
                    interprov_out: 22500.0,
                    interprov_net: 13000.0,
                },
            ]
        );
        assert_eq!(tables.long.len(), 4);
        assert_eq!(tables.long[0].quarter_label, "Q1 2024");
        Ok(())
    }

    #[test]
    fn missing_out_flow_defaults_to_zero() {
        let long = vec![
            InterprovObs {
                flow_type: "In-migrants".to_string(),
                quarter_label: "Q1 2024".to_string(),
                people: 100.0,
                quarter: d(2024, 3, 31),
            },
            InterprovObs {
                flow_type: "In-migrants".to_string(),
                quarter_label: "Q2 2024".to_string(),
                people: 200.0,
                quarter: d(2024, 6, 30),
            },
        ];
        let wide = pivot_quarterly(&long);
        assert!(wide.iter().all(|q| q.interprov_out == 0.0));
        assert_eq!(wide[0].interprov_net, 100.0);
        assert_eq!(wide[1].interprov_net, 200.0);
    }

    #[test]
    fn unparseable_count_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Geography,Q1 2024\n\
             continuation,0\n\
             In-migrants,n/a\n\
             Out-migrants,5\n",
        );
        let err = clean_interprov_migration(&raw, dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unparseable_quarter_label_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_raw(
            dir.path(),
            "Geography,Annual 2024\n\
             continuation,0\n\
             In-migrants,10\n\
             Out-migrants,5\n",
        );
        let err = clean_interprov_migration(&raw, dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Annual 2024"));
    }
}
