//! Shared domain types for the cleaning pipeline and figure builders.

mod types;

pub use types::*;
