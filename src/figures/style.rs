//! Shared chart styling: report palette, fonts, and axis-label helpers.

use chrono::{Datelike, NaiveDate};
use plotters::style::RGBColor;

use crate::dates::quarter_of;

// Report palette (white background, muted frame, two accent series colors).
pub const ORANGE: RGBColor = RGBColor(0xF9, 0x73, 0x16);
pub const BLUE_DARK: RGBColor = RGBColor(0x1E, 0x3A, 0x8A);
pub const GREY: RGBColor = RGBColor(0x6B, 0x72, 0x80);
pub const FRAME: RGBColor = RGBColor(0xD1, 0xD5, 0xDB);
pub const TEXT: RGBColor = RGBColor(0x37, 0x41, 0x51);

/// Raster canvas size; the SVG rendering uses the same logical size.
pub const CANVAS: (u32, u32) = (1200, 700);

pub const TITLE_FONT: (&str, u32) = ("sans-serif", 26);
pub const LABEL_FONT: (&str, u32) = ("sans-serif", 15);

/// Axis tick label for a quarter-end date, e.g. `"2024 Q1"`.
pub fn quarter_tick(d: &NaiveDate) -> String {
    format!("{} Q{}", d.year(), quarter_of(*d))
}

/// Pad a y-range by 5% on both sides so series don't hug the frame.
pub fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * 0.05 } else { min.abs().max(1.0) * 0.05 };
    (min - pad, max + pad)
}
