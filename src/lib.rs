//! `ab-housing` library crate.
//!
//! The binary (`abh`) is a thin wrapper around this library so that:
//!
//! - every transform is testable without spawning processes
//! - the cleaners and figure builders are reusable from other tools
//! - code stays easy to navigate as the pipeline grows

pub mod app;
pub mod clean;
pub mod cli;
pub mod dates;
pub mod domain;
pub mod error;
pub mod figures;
pub mod io;
