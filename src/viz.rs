//! Chart rendering using Plotters
//!
//! Charts are rendered to SVG strings so they can be written to disk and
//! inlined into the HTML dashboard.

use crate::factors::{Factor, FeatureImportance, SegmentChurnRate};
use crate::finance::{RevenueImpact, PROJECTION_MONTHS};
use anyhow::Context;
use plotters::prelude::*;
use std::fs;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (900, 500);
const BAR_HALF_WIDTH: f64 = 0.35;
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Line chart of projected revenue per future month, with markers
///
/// # Arguments
/// * `impact` - Revenue impact holding the projection series
///
/// # Returns
/// * SVG document as a string
pub fn render_projection_chart(impact: &RevenueImpact) -> crate::Result<String> {
    let points: Vec<(f64, f64)> = impact
        .projection_points()
        .into_iter()
        .map(|(month, revenue)| (f64::from(month), revenue))
        .collect();
    let (y_min, y_max) = padded_range(points.iter().map(|&(_, revenue)| revenue));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Revenue Projection for the Next {} Months", PROJECTION_MONTHS),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(90)
            .build_cartesian_2d(0.5f64..(PROJECTION_MONTHS as f64 + 0.5), y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(PROJECTION_MONTHS)
            .x_label_formatter(&|month| format!("{:.0}", month))
            .y_label_formatter(&|revenue| format!("{:.0}", revenue))
            .x_desc("Month")
            .y_desc("Revenue")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        chart.draw_series(std::iter::once(PathElement::new(
            points.clone(),
            LINE_COLOR.stroke_width(2),
        )))?;
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 4, LINE_COLOR.filled())),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Horizontal bar chart of the strongest features, largest at the top
pub fn render_importance_chart(ranking: &[FeatureImportance]) -> crate::Result<String> {
    let n = ranking.len().max(1);
    // Row 0 is drawn at the bottom, so the ranking is laid out in reverse
    let labels: Vec<String> = ranking.iter().rev().map(|f| f.feature.clone()).collect();
    let x_max = upper_bound(ranking.iter().map(|f| f.importance));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Top {} Factors Influencing Churn", ranking.len()),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(220)
            .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|y| category_label(&labels, *y))
            .x_desc("Importance (|coefficient|)")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        chart.draw_series(ranking.iter().rev().enumerate().map(|(row, feature)| {
            let y = row as f64;
            Rectangle::new(
                [
                    (0.0, y - BAR_HALF_WIDTH),
                    (feature.importance, y + BAR_HALF_WIDTH),
                ],
                BAR_COLOR.filled(),
            )
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Vertical bar chart of churn percentage per segment of `factor`
pub fn render_breakdown_chart(factor: Factor, rates: &[SegmentChurnRate]) -> crate::Result<String> {
    let n = rates.len().max(1);
    let labels: Vec<String> = rates.iter().map(|r| r.label.clone()).collect();
    let y_max = upper_bound(rates.iter().map(|r| r.churn_pct));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Churn Rate by {}", factor.title()), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| category_label(&labels, *x))
            .y_label_formatter(&|pct| format!("{:.0}", pct))
            .x_desc(factor.title())
            .y_desc("% Churn")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        chart.draw_series(rates.iter().enumerate().map(|(idx, rate)| {
            let x = idx as f64;
            Rectangle::new(
                [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, rate.churn_pct)],
                BAR_COLOR.filled(),
            )
        }))?;

        chart.draw_series(rates.iter().enumerate().map(|(idx, rate)| {
            Text::new(
                format!("{:.1}%", rate.churn_pct),
                (idx as f64 - BAR_HALF_WIDTH / 2.0, rate.churn_pct + y_max * 0.04),
                ("sans-serif", 13),
            )
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Write an SVG document to `path`
pub fn save_svg(path: &Path, svg: &str) -> crate::Result<()> {
    fs::write(path, svg).with_context(|| format!("Failed to write chart {}", path.display()))?;
    log::info!("Chart saved to: {}", path.display());
    Ok(())
}

/// Category name for an axis position; empty between categories
fn category_label(labels: &[String], position: f64) -> String {
    let rounded = position.round();
    if (position - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Axis maximum with headroom above the largest value
fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

/// Axis range around the values with 5% padding on each side
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.05
    } else if max.abs() > 0.0 {
        max.abs() * 0.05
    } else {
        1.0
    };
    (min - pad, max + pad)
}
