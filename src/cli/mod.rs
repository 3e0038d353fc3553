//! Command-line parsing for the data pipeline.
//!
//! Two batch entry points, mirroring the two pipeline stages. There is no
//! other configuration surface: raw file names and output locations are fixed
//! relative paths, and a fatal parse failure exits non-zero.

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "abh", version, about = "Alberta housing & migration data pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run all five cleaners over the fixed set of raw files in `data/raw`,
    /// writing tidy CSVs to `data/processed`.
    Clean,
    /// Build both report figures from `data/processed` into `figures`.
    ///
    /// Requires a prior `clean` run to have persisted its outputs.
    Figures,
}
