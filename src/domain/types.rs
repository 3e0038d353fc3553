//! Tidy-table row types.
//!
//! These types are intentionally lightweight and serializable so they can be:
//!
//! - produced in-memory by the cleaners
//! - persisted as tidy CSV (column order = field order)
//! - reloaded later by the figure builders
//!
//! Absent values are `Option<f64>` and serialize as empty CSV fields; they are
//! never silently dropped once a row's key has parsed.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed relative locations for raw inputs, processed outputs, and figures.
///
/// The output directory is passed into every transform explicitly rather than
/// living in process-wide state, so tests can point each run at its own
/// temporary directory.
#[derive(Debug, Clone)]
pub struct Paths {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub figures_dir: PathBuf,
}

impl Paths {
    /// Conventional layout relative to the working directory:
    /// `data/raw`, `data/processed`, `figures`.
    pub fn relative_to(root: &Path) -> Self {
        Self {
            raw_dir: root.join("data").join("raw"),
            processed_dir: root.join("data").join("processed"),
            figures_dir: root.join("figures"),
        }
    }
}

/// One observed policy-rate value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObs {
    pub date: NaiveDate,
    pub policy_rate_pct: f64,
}

/// Output of the policy-rate cleaner.
#[derive(Debug, Clone)]
pub struct PolicyRateTables {
    /// Clean daily step series, sorted ascending by date.
    pub daily: Vec<RateObs>,
    /// One row per calendar month: last observation on/before the month end.
    pub monthly_end: Vec<RateObs>,
    /// First row plus every row whose rate differs from its predecessor.
    pub changes: Vec<RateObs>,
}

/// One month of housing starts (SAAR units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStarts {
    pub date: NaiveDate,
    pub starts_saar_units: f64,
}

/// Quarterly arithmetic mean of the monthly SAAR values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyStarts {
    pub quarter: NaiveDate,
    pub starts_saar_units: f64,
}

/// Output of the housing-starts cleaner.
#[derive(Debug, Clone)]
pub struct HousingStartsTables {
    pub monthly: Vec<MonthlyStarts>,
    pub quarterly: Vec<QuarterlyStarts>,
}

/// One quarter of international-migration components (wide layout).
///
/// `total_pressure` is `immigrants + net_non_permanent_residents`;
/// `net_emigration` is deliberately excluded from the sum (it is an outflow
/// component reported alongside the inflows, not part of inflow pressure).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MigrationQuarter {
    pub quarter: NaiveDate,
    pub immigrants: Option<f64>,
    pub net_non_permanent_residents: Option<f64>,
    pub net_emigration: Option<f64>,
    pub total_pressure: Option<f64>,
}

/// One (quarter, component) observation (long layout, for series plotting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationComponentObs {
    pub geo: String,
    pub quarter: NaiveDate,
    pub component: String,
    pub value: Option<f64>,
}

/// Output of the international-migration cleaner.
#[derive(Debug, Clone)]
pub struct MigrationTables {
    pub wide: Vec<MigrationQuarter>,
    pub long: Vec<MigrationComponentObs>,
}

/// A house-price-index panel with dynamic numeric columns.
///
/// The index workbook's value columns vary by vintage, so the panel keeps the
/// column names alongside the rows instead of fixing them in the type. Rows
/// are keyed by `(geo, date)`; `values` is parallel to `value_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct HpiPanel {
    pub value_columns: Vec<String>,
    pub rows: Vec<HpiRow>,
}

/// One `(geo, period)` row of an HPI panel.
#[derive(Debug, Clone, PartialEq)]
pub struct HpiRow {
    pub geo: String,
    /// Month-end date (monthly panel) or quarter-end date (quarterly panel).
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Output of the HPI cleaner.
#[derive(Debug, Clone)]
pub struct HpiTables {
    pub monthly: HpiPanel,
    pub quarterly: HpiPanel,
}

/// One interprovincial flow observation (long layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterprovObs {
    pub flow_type: String,
    pub quarter_label: String,
    pub people: f64,
    pub quarter: NaiveDate,
}

/// One quarter of interprovincial flows (wide layout).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterprovQuarter {
    pub quarter: NaiveDate,
    pub interprov_in: f64,
    pub interprov_out: f64,
    pub interprov_net: f64,
}

/// Output of the interprovincial-migration cleaner.
#[derive(Debug, Clone)]
pub struct InterprovTables {
    pub long: Vec<InterprovObs>,
    pub wide: Vec<InterprovQuarter>,
}
