//! Period-label parsing and month/quarter-end arithmetic.
//!
//! Every cleaned table uses the *last calendar date* of its period as the
//! canonical timestamp: monthly rows carry the month-end date, quarterly rows
//! the quarter-end date. Keeping that convention in one module means no
//! cleaner re-derives it ad hoc.

use chrono::{Datelike, NaiveDate};

/// Last calendar day of `(year, month)`.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1).and_then(|d| d.pred_opt())
}

/// Month-end date of the month containing `d`.
pub fn month_end_of(d: NaiveDate) -> NaiveDate {
    month_end(d.year(), d.month()).expect("valid month")
}

/// Quarter-end date of the quarter containing `d`.
pub fn quarter_end_of(d: NaiveDate) -> NaiveDate {
    let q = (d.month() - 1) / 3 + 1;
    month_end(d.year(), q * 3).expect("valid quarter month")
}

/// 1-based quarter number of `d`.
pub fn quarter_of(d: NaiveDate) -> u32 {
    (d.month() - 1) / 3 + 1
}

/// Parse a `"Q<1-4> <4-digit year>"` label (e.g. `"Q3 2024"`) to its
/// quarter-end date. Returns `None` for anything not matching the pattern.
pub fn parse_quarter_label(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let rest = s.strip_prefix('Q')?;
    let (qs, ys) = rest.split_once(char::is_whitespace)?;
    let q: u32 = qs.parse().ok()?;
    if !(1..=4).contains(&q) {
        return None;
    }
    let ys = ys.trim();
    if ys.len() != 4 {
        return None;
    }
    let year: i32 = ys.parse().ok()?;
    month_end(year, q * 3)
}

/// Parse an abbreviated-month + two-digit-year label (e.g. `"Jan-00"`) to its
/// month-end date. Two-digit years pivot at 69 (`00`–`68` → 2000s), matching
/// the source agency's export convention.
pub fn parse_month_label_2y(s: &str) -> Option<NaiveDate> {
    let padded = format!("{}-01", s.trim());
    NaiveDate::parse_from_str(&padded, "%b-%y-%d")
        .ok()
        .map(month_end_of)
}

/// Parse an abbreviated-month + four-digit-year label (e.g. `"Jan 2005"`) to
/// its month-end date.
pub fn parse_month_label_4y(s: &str) -> Option<NaiveDate> {
    let padded = format!("{} 01", s.trim());
    NaiveDate::parse_from_str(&padded, "%b %Y %d")
        .ok()
        .map(month_end_of)
}

/// Parse a calendar date in the handful of formats agency exports actually use.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    let s = s.trim();
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
