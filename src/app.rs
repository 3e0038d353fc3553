//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - dispatches to the cleaning stage or the figure stage

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::domain::Paths;
use crate::error::AppError;

/// Fixed raw file names under `data/raw`, as delivered by the agencies.
pub const FILE_BOC: &str = "Canadian Policy Rate BoC.csv";
pub const FILE_STARTS: &str = "housing starts statcan.csv";
pub const FILE_MIGRATION: &str = "Alberta_international_migration_quarterly_clean.csv";
pub const FILE_HPI: &str = "MLS HPI SA.xlsx";
pub const FILE_INTERPROV: &str = "Interprovincial migration.csv";

/// Target region row in the housing-starts panel.
const REGION: &str = "Alberta";

/// Entry point for the `abh` binary.
pub fn run() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let paths = Paths::relative_to(Path::new("."));
    match cli.command {
        Command::Clean => run_clean(&paths),
        Command::Figures => run_figures(&paths),
    }
}

/// Run the full cleaning stage: five independent cleaners, each a pure
/// function of its raw file. Order does not matter; none reads another's
/// output.
pub fn run_clean(paths: &Paths) -> Result<(), AppError> {
    let raw = &paths.raw_dir;
    let processed = &paths.processed_dir;

    info!("cleaning policy rate");
    crate::clean::clean_policy_rate(&raw.join(FILE_BOC), processed)?;
    info!("cleaning housing starts");
    crate::clean::clean_housing_starts(&raw.join(FILE_STARTS), processed, REGION)?;
    info!("cleaning international migration");
    crate::clean::clean_international_migration(&raw.join(FILE_MIGRATION), processed)?;
    info!("cleaning HPI");
    crate::clean::clean_hpi(&raw.join(FILE_HPI), processed)?;
    info!("cleaning interprovincial migration");
    crate::clean::clean_interprov_migration(&raw.join(FILE_INTERPROV), processed)?;

    println!("Done. Clean files written to {}.", processed.display());
    Ok(())
}

/// Build both figures from the processed outputs.
pub fn run_figures(paths: &Paths) -> Result<(), AppError> {
    crate::figures::build_all(paths)?;
    println!("Figures saved in {}.", paths.figures_dir.display());
    Ok(())
}
