//! Chart Renderer Module
//! Renders static PNG charts (grouped bars and category line series).

use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No data to plot")]
    NoData,
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

/// Color palette for series
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Gray
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

/// One named series aligned to the chart's category axis.
#[derive(Debug, Clone)]
pub struct SeriesData {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A chart over an ordered categorical x-axis.
#[derive(Debug, Clone)]
pub struct CategoryChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<SeriesData>,
}

/// Renders chart images to disk.
pub struct ChartRenderer;

impl ChartRenderer {
    /// Grouped bar chart: one bar cluster per category, one bar per series.
    pub fn render_grouped_bars(
        chart: &CategoryChart,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), ChartError> {
        if chart.categories.is_empty() || chart.series.is_empty() {
            return Err(ChartError::NoData);
        }

        let n = chart.categories.len();
        let (_, y_max) = Self::value_range(&chart.series).ok_or(ChartError::NoData)?;

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChartError::Render(e.to_string()))?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0..y_max)
            .map_err(|e| ChartError::Render(e.to_string()))?;

        let categories = chart.categories.clone();
        let x_formatter = move |x: &f64| Self::category_label(&categories, *x);

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .axis_desc_style(("sans-serif", 16))
            .x_labels(n)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()
            .map_err(|e| ChartError::Render(e.to_string()))?;

        // Bar clusters span 0.8 of each category slot.
        let bar_width = 0.8 / chart.series.len() as f64;
        for (si, series) in chart.series.iter().enumerate() {
            let color = PALETTE[si % PALETTE.len()];
            let bars = series.values.iter().enumerate().filter_map(|(i, v)| {
                let value = (*v)?;
                let x0 = i as f64 - 0.4 + si as f64 * bar_width;
                Some(Rectangle::new([(x0, 0.0), (x0 + bar_width, value)], color.filled()))
            });

            ctx.draw_series(bars)
                .map_err(|e| ChartError::Render(e.to_string()))?
                .label(&series.name)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        ctx.configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()
            .map_err(|e| ChartError::Render(e.to_string()))?;

        root.present().map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(())
    }

    /// Line chart: one marked line per series over the ordered categories.
    ///
    /// Gaps in a series (missing values) break the line, matching how the
    /// categories were reindexed upstream.
    pub fn render_category_lines(
        chart: &CategoryChart,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), ChartError> {
        if chart.categories.is_empty() || chart.series.is_empty() {
            return Err(ChartError::NoData);
        }

        let n = chart.categories.len();
        let (y_min, y_max) = Self::value_range(&chart.series).ok_or(ChartError::NoData)?;

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChartError::Render(e.to_string()))?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(70)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)
            .map_err(|e| ChartError::Render(e.to_string()))?;

        let categories = chart.categories.clone();
        let x_formatter = move |x: &f64| Self::category_label(&categories, *x);
        let label_style = ("sans-serif", 13)
            .into_font()
            .transform(FontTransform::Rotate90);

        ctx.configure_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .axis_desc_style(("sans-serif", 16))
            .x_labels(n)
            .x_label_formatter(&x_formatter)
            .x_label_style(label_style)
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()
            .map_err(|e| ChartError::Render(e.to_string()))?;

        for (si, series) in chart.series.iter().enumerate() {
            let color = PALETTE[si % PALETTE.len()];

            for run in Self::contiguous_runs(&series.values) {
                ctx.draw_series(LineSeries::new(
                    run.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(|e| ChartError::Render(e.to_string()))?;
            }

            let points: Vec<(f64, f64)> = Self::contiguous_runs(&series.values)
                .into_iter()
                .flatten()
                .collect();

            // Alternate circle and square markers per series.
            if si % 2 == 0 {
                ctx.draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
                )
                .map_err(|e| ChartError::Render(e.to_string()))?
                .label(&series.name)
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
            } else {
                ctx.draw_series(points.iter().map(|&(x, y)| {
                    EmptyElement::at((x, y)) + Rectangle::new([(-4, -4), (4, 4)], color.filled())
                }))
                .map_err(|e| ChartError::Render(e.to_string()))?
                .label(&series.name)
                .legend(move |(x, y)| Rectangle::new([(x + 1, y - 4), (x + 9, y + 4)], color.filled()));
            }
        }

        ctx.configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()
            .map_err(|e| ChartError::Render(e.to_string()))?;

        root.present().map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(())
    }

    /// Padded y-axis range over every finite value, or `None` if there are no
    /// values to plot.
    fn value_range(series: &[SeriesData]) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in series {
            for v in s.values.iter().flatten() {
                if !v.is_nan() {
                    min = min.min(*v);
                    max = max.max(*v);
                }
            }
        }
        if min.is_infinite() {
            return None;
        }

        let pad = ((max - min) * 0.15).max(1.0);
        Some(((min - pad).floor(), (max + pad).ceil()))
    }

    fn category_label(categories: &[String], x: f64) -> String {
        let idx = x.round();
        if idx < 0.0 || (x - idx).abs() > 0.25 {
            return String::new();
        }
        categories
            .get(idx as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn contiguous_runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
        let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();

        for (i, v) in values.iter().enumerate() {
            match v {
                Some(v) if !v.is_nan() => current.push((i as f64, *v)),
                _ => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}
