//! CSV reading helpers shared by the cleaners.
//!
//! Design goals:
//! - **Normalized headers** so lookups survive agency renames of casing,
//!   spacing, and punctuation
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Value-level coercion** that turns placeholder tokens into explicit
//!   absences instead of dropping rows

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;

/// Open a CSV file with the pipeline's standard reader settings.
///
/// `flexible` is on because agency exports occasionally pad rows with
/// trailing empty fields; trimming happens per-value instead of globally so
/// raw labels (e.g. pivot keys) are preserved verbatim where needed.
pub fn open_csv(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
}

/// Normalize a header name: strip BOM and surrounding whitespace, lowercase,
/// and collapse every run of non-alphanumeric characters into `_`.
///
/// `"Net non-permanent residents"` → `"net_non_permanent_residents"`.
pub fn normalize_header_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Map normalized header names to their column indices.
pub fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

/// Look up a required column, failing with a message naming it.
pub fn require_column(
    header_map: &HashMap<String, usize>,
    name: &str,
    path: &Path,
) -> Result<usize, AppError> {
    header_map.get(name).copied().ok_or_else(|| {
        AppError::input(format!(
            "Missing required column `{name}` in '{}'",
            path.display()
        ))
    })
}

/// Coerce an agency count field to a number.
///
/// Strips thousands-separators and non-breaking spaces first; the StatCan
/// placeholder tokens `..` and `...` (and empty fields) become `None`.
pub fn parse_count(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '\u{a0}')
        .collect();
    if cleaned.is_empty() || cleaned == ".." || cleaned == "..." {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a policy-rate field, accepting only non-negative finite decimals.
///
/// Sentinel rows ("Bank holiday", a bare ".") must not slip through; `f64`
/// parsing already rejects a lone decimal point, and the sign check rejects
/// negative sentinels.
pub fn parse_rate(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Normalize a pivot label: trim, lowercase, and turn non-breaking spaces
/// into plain spaces (StatCan wraps some flow labels in NBSPs).
pub fn normalize_label(s: &str) -> String {
    s.replace('\u{a0}', " ").trim().to_lowercase()
}
