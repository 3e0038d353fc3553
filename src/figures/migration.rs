//! Figure 1: quarterly population inflows (permanent, temporary, total).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::domain::MigrationQuarter;
use crate::error::AppError;
use crate::figures::style::{
    BLUE_DARK, CANVAS, FRAME, GREY, LABEL_FONT, ORANGE, TEXT, TITLE_FONT, padded_range,
    quarter_tick,
};

pub const PNG_FILE: &str = "figure1_migration_pressure.png";
pub const SVG_FILE: &str = "figure1_migration_pressure.svg";

/// Render the migration-inflows figure as PNG + SVG into `figures_dir`.
pub fn figure_migration_inflows(
    wide: &[MigrationQuarter],
    figures_dir: &Path,
) -> Result<(PathBuf, PathBuf), AppError> {
    if wide.is_empty() {
        return Err(AppError::missing(
            "Cannot render migration figure from an empty table",
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
        draw(&root, wide)?;
        root.present()
            .map_err(|e| AppError::render(format!("Failed to write '{}': {e}", png.display())))?;
    }
    {
        let root = SVGBackend::new(&svg, CANVAS).into_drawing_area();
        draw(&root, wide)?;
        root.present()
            .map_err(|e| AppError::render(format!("Failed to write '{}': {e}", svg.display())))?;
    }
    Ok((png, svg))
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    wide: &[MigrationQuarter],
) -> Result<(), AppError> {
    let fail = |e: DrawingAreaErrorKind<DB::ErrorType>| AppError::render(format!("figure 1: {e}"));

    root.fill(&WHITE).map_err(fail)?;

    let (Some(x0), Some(x1)) = (
        wide.first().map(|r| r.quarter),
        wide.last().map(|r| r.quarter),
    ) else {
        return Err(AppError::missing("Cannot render an empty series"));
    };
    let (y0, y1) = value_bounds(wide);

    let mut chart = ChartBuilder::on(root)
        .caption("Population inflow remains elevated", TITLE_FONT.into_font().color(&TEXT))
        .margin(25)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(fail)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&FRAME.mix(0.4))
        .light_line_style(&TRANSPARENT)
        .x_labels(10)
        .x_label_formatter(&quarter_tick)
        .y_label_formatter(&|v: &f64| format!("{:.0}", v))
        .x_desc("Quarter")
        .y_desc("People (count)")
        .label_style(LABEL_FONT.into_font().color(&TEXT))
        .axis_style(&FRAME)
        .draw()
        .map_err(fail)?;

    let series: [(&str, &RGBColor, fn(&MigrationQuarter) -> Option<f64>); 3] = [
        ("Immigrants (permanent)", &ORANGE, |r| r.immigrants),
        ("Net non-permanent residents", &BLUE_DARK, |r| {
            r.net_non_permanent_residents
        }),
        ("Total inflow pressure (perm + temp)", &GREY, |r| {
            r.total_pressure
        }),
    ];
    for (name, color, pick) in series {
        let points: Vec<(NaiveDate, f64)> = wide
            .iter()
            .filter_map(|r| pick(r).map(|v| (r.quarter, v)))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(fail)?
            .label(name)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

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

fn value_bounds(wide: &[MigrationQuarter]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for row in wide {
        for v in [
            row.immigrants,
            row.net_non_permanent_residents,
            row.total_pressure,
        ]
        .into_iter()
        .flatten()
        {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !(min.is_finite() && max.is_finite()) {
        (0.0, 1.0)
    } else {
        padded_range(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(y: i32, q: u32) -> NaiveDate {
        crate::dates::month_end(y, q * 3).unwrap()
    }

    fn row(y: i32, q: u32, imm: f64, npr: f64) -> MigrationQuarter {
        MigrationQuarter {
            quarter: quarter(y, q),
            immigrants: Some(imm),
            net_non_permanent_residents: Some(npr),
            net_emigration: Some(1000.0),
            total_pressure: Some(imm + npr),
        }
    }

    #[test]
    fn renders_png_and_svg() {
        let dir = tempfile::tempdir().unwrap();
        let wide = vec![
            row(2023, 4, 12000.0, 9000.0),
            row(2024, 1, 13000.0, 7000.0),
            row(2024, 2, 12500.0, -2000.0),
        ];
        let (png, svg) = figure_migration_inflows(&wide, dir.path()).unwrap();
        assert!(png.metadata().unwrap().len() > 0);
        assert!(svg.metadata().unwrap().len() > 0);
    }

    #[test]
    fn empty_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = figure_migration_inflows(&[], dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
