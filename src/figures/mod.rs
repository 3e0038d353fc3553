//! Figure builders.
//!
//! Both figures are built strictly from the processed CSVs (never from the
//! cleaners' in-memory state), so the figure stage can run in a separate
//! invocation once the cleaning stage has persisted its outputs.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::clean::policy_rate::quarter_end_levels;
use crate::clean::{housing_starts, intl_migration, policy_rate};
use crate::domain::{MigrationQuarter, Paths, QuarterlyStarts, RateObs};
use crate::error::AppError;

pub mod migration;
pub mod starts_vs_rate;
pub mod style;

pub use migration::figure_migration_inflows;
pub use starts_vs_rate::figure_starts_vs_rate;

/// Build both figures from the processed outputs.
pub fn build_all(paths: &Paths) -> Result<(), AppError> {
    let processed = &paths.processed_dir;

    let mig_wide: Vec<MigrationQuarter> =
        load_processed(&processed.join(intl_migration::WIDE_FILE))?;
    let starts_q: Vec<QuarterlyStarts> =
        load_processed(&processed.join(housing_starts::QUARTERLY_FILE))?;
    let boc_daily: Vec<RateObs> = load_processed(&processed.join(policy_rate::DAILY_FILE))?;
    let rate_q = quarter_end_levels(&boc_daily);

    let (png1, _) = figure_migration_inflows(&mig_wide, &paths.figures_dir)?;
    info!(path = %png1.display(), "figure 1 written");
    let (png2, _) = figure_starts_vs_rate(&starts_q, &rate_q, &paths.figures_dir)?;
    info!(path = %png2.display(), "figure 2 written");
    Ok(())
}

/// Load one processed tidy CSV into its row type.
///
/// A missing file means the cleaning stage has not run; that is fatal for
/// the figure stage.
fn load_processed<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::input(format!(
            "Failed to open processed table '{}' (run `clean` first?): {e}",
            path.display()
        ))
    })?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.map_err(|e| {
            AppError::input(format!("Failed to parse '{}': {e}", path.display()))
        })?;
        rows.push(row);
    }
    Ok(rows)
}
