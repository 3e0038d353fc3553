//! The five source-file cleaners.
//!
//! Each cleaner is a pure function of one raw file: it reads, normalizes,
//! writes its tidy CSVs into the processed directory, and returns the tables
//! for immediate in-memory reuse. Failure is terminal for that invocation —
//! outputs are written only after the whole transform has succeeded, so a
//! failed run leaves nothing partial behind.

pub mod housing_starts;
pub mod hpi;
pub mod interprov;
pub mod intl_migration;
pub mod policy_rate;

pub use housing_starts::clean_housing_starts;
pub use hpi::clean_hpi;
pub use interprov::clean_interprov_migration;
pub use intl_migration::clean_international_migration;
pub use policy_rate::clean_policy_rate;
