//! File I/O: CSV reading helpers, tidy-CSV writers, and XLSX workbook access.

pub mod table;
pub mod workbook;
pub mod write;
