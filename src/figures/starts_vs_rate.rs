//! Figure 2: quarterly housing starts against the quarter-end policy rate.
//!
//! Two series on twin y-axes: starts (SAAR units) on the left, the policy
//! rate (%) on the right. The two tables are joined inner on quarter — a
//! quarter only plots when both series have a value.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::domain::{QuarterlyStarts, RateObs};
use crate::error::AppError;
use crate::figures::style::{
    BLUE_DARK, CANVAS, FRAME, LABEL_FONT, ORANGE, TEXT, TITLE_FONT, padded_range, quarter_tick,
};

pub const PNG_FILE: &str = "figure2_starts_vs_policy_rate.png";
pub const SVG_FILE: &str = "figure2_starts_vs_policy_rate.svg";

/// Render the starts-vs-rate figure as PNG + SVG into `figures_dir`.
pub fn figure_starts_vs_rate(
    starts_q: &[QuarterlyStarts],
    rate_q: &[RateObs],
    figures_dir: &Path,
) -> Result<(PathBuf, PathBuf), AppError> {
    let joined = join_on_quarter(starts_q, rate_q);
    if joined.is_empty() {
        return Err(AppError::missing(
            "No overlapping quarters between housing starts and policy rate",
        ));
    }
    fs::create_dir_all(figures_dir).map_err(|e| {
        AppError::render(format!(
            "Failed to create figures directory '{}': {e}",
            figures_dir.display()
        ))
    })?;

    let png = figures_dir.join(PNG_FILE);
    let svg = figures_dir.join(SVG_FILE);
    {
        let root = BitMapBackend::new(&png, CANVAS).into_drawing_area();
        draw(&root, &joined)?;
        root.present()
            .map_err(|e| AppError::render(format!("Failed to write '{}': {e}", png.display())))?;
    }
    {
        let root = SVGBackend::new(&svg, CANVAS).into_drawing_area();
        draw(&root, &joined)?;
        root.present()
            .map_err(|e| AppError::render(format!("Failed to write '{}': {e}", svg.display())))?;
    }
    Ok((png, svg))
}

/// Inner join of the two quarterly tables, sorted by quarter.
fn join_on_quarter(
    starts_q: &[QuarterlyStarts],
    rate_q: &[RateObs],
) -> Vec<(NaiveDate, f64, f64)> {
    use std::collections::BTreeMap;
    let rates: BTreeMap<NaiveDate, f64> = rate_q
        .iter()
        .map(|r| (r.date, r.policy_rate_pct))
        .collect();
    let mut joined: Vec<(NaiveDate, f64, f64)> = starts_q
        .iter()
        .filter_map(|s| {
            rates
                .get(&s.quarter)
                .map(|rate| (s.quarter, s.starts_saar_units, *rate))
        })
        .collect();
    joined.sort_by_key(|(q, _, _)| *q);
    joined
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    joined: &[(NaiveDate, f64, f64)],
) -> Result<(), AppError> {
    let fail = |e: DrawingAreaErrorKind<DB::ErrorType>| AppError::render(format!("figure 2: {e}"));

    root.fill(&WHITE).map_err(fail)?;

    let (Some(x0), Some(x1)) = (
        joined.first().map(|(q, _, _)| *q),
        joined.last().map(|(q, _, _)| *q),
    ) else {
        return Err(AppError::missing("Cannot render an empty series"));
    };
    let (s0, s1) = bounds(joined.iter().map(|(_, s, _)| *s));
    let (r0, r1) = bounds(joined.iter().map(|(_, _, r)| *r));

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Builders kept building despite restrictive borrowing costs",
            TITLE_FONT.into_font().color(&TEXT),
        )
        .margin(25)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .right_y_label_area_size(60)
        .build_cartesian_2d(x0..x1, s0..s1)
        .map_err(fail)?
        .set_secondary_coord(x0..x1, r0..r1);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&FRAME.mix(0.4))
        .light_line_style(&TRANSPARENT)
        .x_labels(10)
        .x_label_formatter(&quarter_tick)
        .y_label_formatter(&|v: &f64| format!("{:.0}", v))
        .x_desc("Quarter")
        .y_desc("Housing starts (SAAR units)")
        .label_style(LABEL_FONT.into_font().color(&TEXT))
        .axis_style(&FRAME)
        .draw()
        .map_err(fail)?;
    chart
        .configure_secondary_axes()
        .y_desc("Policy rate (%)")
        .y_label_formatter(&|v: &f64| format!("{v:.2}"))
        .label_style(LABEL_FONT.into_font().color(&TEXT))
        .axis_style(&FRAME)
        .draw()
        .map_err(fail)?;

    chart
        .draw_series(LineSeries::new(
            joined.iter().map(|(q, s, _)| (*q, *s)),
            ORANGE.stroke_width(2),
        ))
        .map_err(fail)?
        .label("Housing starts (SAAR, quarterly avg)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], ORANGE.stroke_width(2)));

    chart
        .draw_secondary_series(LineSeries::new(
            joined.iter().map(|(q, _, r)| (*q, *r)),
            BLUE_DARK.stroke_width(2),
        ))
        .map_err(fail)?
        .label("Policy rate (quarter-end)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLUE_DARK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.9))
        .border_style(&FRAME)
        .label_font(LABEL_FONT.into_font().color(&TEXT))
        .draw()
        .map_err(fail)?;
    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        (0.0, 1.0)
    } else {
        padded_range(min, max)
    }
}
