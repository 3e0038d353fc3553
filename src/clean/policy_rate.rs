//! Bank of Canada policy-rate cleaner.
//!
//! Turns the raw daily CSV (which mixes sentinel rows like "Bank holiday"
//! into the rate column) into a clean daily step series, plus two derived
//! tables: month-end levels and change (announcement) dates.

use std::path::Path;

use chrono::Datelike;
use tracing::{info, warn};

use crate::dates::{month_end, parse_date};
use crate::domain::{PolicyRateTables, RateObs};
use crate::error::AppError;
use crate::io::table::{build_header_map, open_csv, parse_rate, require_column};
use crate::io::write::write_rows;

pub const DAILY_FILE: &str = "boc_policy_rate_daily_clean.csv";
pub const MONTHLY_END_FILE: &str = "boc_policy_rate_monthly_end.csv";
pub const CHANGES_FILE: &str = "boc_policy_rate_change_dates.csv";

/// Clean the daily policy-rate series and derive month-end levels and change
/// dates. Writes all three tables into `processed_dir`.
pub fn clean_policy_rate(input: &Path, processed_dir: &Path) -> Result<PolicyRateTables, AppError> {
    let mut reader = open_csv(input)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read headers of '{}': {e}", input.display())))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = require_column(&header_map, "date", input)?;
    // The source names the target-rate series by its bank series id; accept
    // the canonical name too so re-cleaning our own output is a no-op.
    let rate_idx = header_map
        .get("policy_rate_pct")
        .or_else(|| header_map.get("v39079"))
        .copied()
        .ok_or_else(|| {
            AppError::input(format!(
                "Missing required rate column (`v39079` or `policy_rate_pct`) in '{}'",
                input.display()
            ))
        })?;

    let mut daily = Vec::new();
    let mut dropped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::input(format!(
                "CSV parse error in '{}' at record {idx}: {e}",
                input.display()
            ))
        })?;
        let rate = record.get(rate_idx).and_then(parse_rate);
        let date = record.get(date_idx).and_then(parse_date);
        match (date, rate) {
            (Some(date), Some(policy_rate_pct)) => daily.push(RateObs {
                date,
                policy_rate_pct,
            }),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "policy rate: dropped rows with unparseable date/rate");
    }
    if daily.is_empty() {
        return Err(AppError::missing(format!(
            "No valid policy-rate rows in '{}'",
            input.display()
        )));
    }
    daily.sort_by_key(|obs| obs.date);

    let tables = PolicyRateTables {
        monthly_end: derive_monthly_end(&daily),
        changes: derive_changes(&daily),
        daily,
    };

    write_rows(&processed_dir.join(DAILY_FILE), &tables.daily)?;
    write_rows(&processed_dir.join(MONTHLY_END_FILE), &tables.monthly_end)?;
    write_rows(&processed_dir.join(CHANGES_FILE), &tables.changes)?;
    info!(
        days = tables.daily.len(),
        months = tables.monthly_end.len(),
        changes = tables.changes.len(),
        "policy rate cleaned"
    );
    Ok(tables)
}

/// One row per calendar month between the first and last observation, each
/// carrying the last observation on/before that month's end.
///
/// The first month always contains an observation, so every later month has
/// a level to carry forward; no row is ever absent.
fn derive_monthly_end(daily: &[RateObs]) -> Vec<RateObs> {
    let (Some(first), Some(last)) = (daily.first(), daily.last()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut iter = daily.iter().peekable();
    let mut level: Option<f64> = None;
    let mut year = first.date.year();
    let mut month = first.date.month();
    loop {
        let Some(end) = month_end(year, month) else {
            break;
        };
        while iter.peek().is_some_and(|obs| obs.date <= end) {
            level = iter.next().map(|obs| obs.policy_rate_pct);
        }
        if let Some(policy_rate_pct) = level {
            out.push(RateObs {
                date: end,
                policy_rate_pct,
            });
        }
        if end >= last.date {
            break;
        }
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    out
}

/// The first row plus every row whose rate differs from its predecessor.
fn derive_changes(daily: &[RateObs]) -> Vec<RateObs> {
    let mut out = Vec::new();
    let mut prev: Option<f64> = None;
    for obs in daily {
        if prev != Some(obs.policy_rate_pct) {
            out.push(*obs);
        }
        prev = Some(obs.policy_rate_pct);
    }
    out
}

/// Quarter-end snapshot of the daily series: last observation per quarter.
///
/// Used by the figure stage, which joins the rate against quarterly tables.
pub fn quarter_end_levels(daily: &[RateObs]) -> Vec<RateObs> {
    use crate::dates::quarter_end_of;
    let mut out: Vec<RateObs> = Vec::new();
    for obs in daily {
        let quarter = quarter_end_of(obs.date);
        match out.last_mut() {
            Some(last) if last.date == quarter => last.policy_rate_pct = obs.policy_rate_pct,
            _ => out.push(RateObs {
                date: quarter,
                policy_rate_pct: obs.policy_rate_pct,
            }),
        }
    }
    out
}
