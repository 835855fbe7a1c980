//! Static Chart Renderer
//! Draws one chart per summary table with plotters, matching the dark theme
//! of the original dashboard: bar charts for the categorical dimensions,
//! line charts for age and pandemic week.

use plotters::prelude::*;
use polars::prelude::{DataFrame, PolarsError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::charts::page;
use crate::data::schema::{Dimension, COUNT_COLUMN};
use crate::data::DeathSummaries;

// Theme colors (paper / plot area split as in the original dashboard)
const PAPER_BG: RGBColor = RGBColor(10, 10, 10);
const PLOT_BG: RGBColor = RGBColor(17, 17, 17);
const ACCENT: RGBColor = RGBColor(99, 110, 250);

const CHART_SIZE: (u32, u32) = (1280, 560);
const Y_LABEL: &str = "Patient Deaths";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Summary table error: {0}")]
    Data(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render chart: {0}")]
    Draw(String),
}

/// How one summary table is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Bar,
    Line,
}

struct ChartSpec {
    dim: Dimension,
    kind: ChartKind,
    title: &'static str,
    x_label: &'static str,
    file_name: &'static str,
}

const CHARTS: [ChartSpec; 5] = [
    ChartSpec {
        dim: Dimension::Gender,
        kind: ChartKind::Bar,
        title: "Deaths by Patient Gender",
        x_label: "Patient Gender",
        file_name: "gender_death.png",
    },
    ChartSpec {
        dim: Dimension::Age,
        kind: ChartKind::Line,
        title: "Covid Deaths by Age",
        x_label: "Patient Age",
        file_name: "age_death.png",
    },
    ChartSpec {
        dim: Dimension::Financing,
        kind: ChartKind::Bar,
        title: "Publicly vs Privately Funded Care Deaths",
        x_label: "Financing Source",
        file_name: "financing_source.png",
    },
    ChartSpec {
        dim: Dimension::Province,
        kind: ChartKind::Bar,
        title: "Deaths by Residence Province",
        x_label: "Province of Origin",
        file_name: "province_deaths.png",
    },
    ChartSpec {
        dim: Dimension::Week,
        kind: ChartKind::Line,
        title: "Deaths per Week of Pandemic",
        x_label: "Pandemic Week",
        file_name: "week_deaths.png",
    },
];

/// Render all five charts into `out_dir` and assemble the dashboard page.
/// Returns the path of the written `index.html`.
pub fn render_dashboard(
    summaries: &DeathSummaries,
    out_dir: &Path,
) -> Result<PathBuf, ChartError> {
    std::fs::create_dir_all(out_dir)?;

    for spec in &CHARTS {
        let table = summaries.table(spec.dim);
        let path = out_dir.join(spec.file_name);
        match spec.kind {
            ChartKind::Bar => draw_bar_chart(table, spec, &path)?,
            ChartKind::Line => draw_line_chart(table, spec, &path)?,
        }
        info!("rendered {}", path.display());
    }

    let titles: Vec<(&str, &str)> = CHARTS.iter().map(|s| (s.title, s.file_name)).collect();
    let index = page::write_index(out_dir, &titles)?;
    Ok(index)
}

fn draw_bar_chart(table: &DataFrame, spec: &ChartSpec, path: &Path) -> Result<(), ChartError> {
    let points = label_points(table, spec.dim)?;
    let keys: Vec<String> = points.iter().map(|(k, _)| k.clone()).collect();
    let y_max = axis_top(points.iter().map(|&(_, c)| c));

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&PAPER_BG).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 28).into_font().color(&WHITE))
        .margin(20)
        .x_label_area_size(if keys.len() > 8 { 140 } else { 50 })
        .y_label_area_size(90)
        .build_cartesian_2d((0..keys.len()).into_segmented(), 0i64..y_max)
        .map_err(draw_err)?;

    chart.plotting_area().fill(&PLOT_BG).map_err(draw_err)?;

    // Long categorical axes (provinces) get rotated labels.
    let label_font = if keys.len() > 8 {
        ("sans-serif", 14)
            .into_font()
            .color(&WHITE)
            .transform(FontTransform::Rotate90)
    } else {
        ("sans-serif", 16).into_font().color(&WHITE)
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(PLOT_BG)
        .bold_line_style(RGBColor(40, 40, 40))
        .axis_style(WHITE)
        .x_desc(spec.x_label)
        .y_desc(Y_LABEL)
        .x_labels(keys.len())
        .label_style(label_font)
        .axis_desc_style(("sans-serif", 18).into_font().color(&WHITE))
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                keys.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(points.iter().enumerate().map(|(i, &(_, count))| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), count),
                ],
                ACCENT.filled(),
            )
        }))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_line_chart(table: &DataFrame, spec: &ChartSpec, path: &Path) -> Result<(), ChartError> {
    let points = numeric_points(table, spec.dim)?;
    let x_min = points.first().map(|&(x, _)| x).unwrap_or(0);
    let x_max = points.last().map(|&(x, _)| x).unwrap_or(1).max(x_min + 1);
    let y_max = axis_top(points.iter().map(|&(_, c)| c));

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&PAPER_BG).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 28).into_font().color(&WHITE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, 0i64..y_max)
        .map_err(draw_err)?;

    chart.plotting_area().fill(&PLOT_BG).map_err(draw_err)?;

    chart
        .configure_mesh()
        .light_line_style(PLOT_BG)
        .bold_line_style(RGBColor(40, 40, 40))
        .axis_style(WHITE)
        .x_desc(spec.x_label)
        .y_desc(Y_LABEL)
        .label_style(("sans-serif", 16).into_font().color(&WHITE))
        .axis_desc_style(("sans-serif", 18).into_font().color(&WHITE))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            ACCENT.stroke_width(2),
        ))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Y-axis upper bound with ~10% headroom.
fn axis_top(counts: impl Iterator<Item = i64>) -> i64 {
    let max = counts.max().unwrap_or(0).max(1);
    max + max / 10 + 1
}

/// Extract `(key, count)` pairs with keys rendered as display strings.
fn label_points(table: &DataFrame, dim: Dimension) -> Result<Vec<(String, i64)>, ChartError> {
    let keys = table.column(dim.column())?.as_materialized_series().clone();
    let counts = counts_column(table)?;

    Ok((0..table.height())
        .zip(counts)
        .map(|(i, count)| {
            let key = keys
                .get(i)
                .map(|v| v.to_string().trim_matches('"').to_string())
                .unwrap_or_default();
            (key, count)
        })
        .collect())
}

/// Extract `(key, count)` pairs for a numeric dimension.
fn numeric_points(table: &DataFrame, dim: Dimension) -> Result<Vec<(i64, i64)>, ChartError> {
    let keys: Vec<i64> = table
        .column(dim.column())?
        .as_materialized_series()
        .i64()?
        .into_no_null_iter()
        .collect();
    let counts = counts_column(table)?;
    Ok(keys.into_iter().zip(counts).collect())
}

fn counts_column(table: &DataFrame) -> Result<Vec<i64>, ChartError> {
    Ok(table
        .column(COUNT_COLUMN)?
        .as_materialized_series()
        .i64()?
        .into_no_null_iter()
        .collect())
}

fn draw_err(err: impl std::fmt::Display) -> ChartError {
    ChartError::Draw(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn week_table() -> DataFrame {
        df![
            "index" => [0i64, 1, 2],
            "pandemic_week" => [10i64, 11, 14],
            "death_count" => [3i64, 1, 7],
        ]
        .unwrap()
    }

    #[test]
    fn test_numeric_points_pairs_keys_and_counts() {
        let points = numeric_points(&week_table(), Dimension::Week).unwrap();
        assert_eq!(points, [(10, 3), (11, 1), (14, 7)]);
    }

    #[test]
    fn test_label_points_renders_string_keys() {
        let table = df![
            "index" => [0i64, 1],
            "patient_gender" => ["F", "M"],
            "death_count" => [5i64, 4],
        ]
        .unwrap();

        let points = label_points(&table, Dimension::Gender).unwrap();
        assert_eq!(points, [("F".to_string(), 5), ("M".to_string(), 4)]);
    }

    #[test]
    fn test_axis_top_has_headroom() {
        assert_eq!(axis_top([0i64].into_iter()), 2);
        assert!(axis_top([100i64].into_iter()) > 100);
    }

    #[test]
    fn test_chart_specs_cover_every_dimension() {
        for dim in Dimension::ALL {
            assert!(CHARTS.iter().any(|spec| spec.dim == dim));
        }
    }
}
