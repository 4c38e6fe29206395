//! Dashboard rendering: console panels, HTML page, and JSON summary

use crate::context::DashboardContext;
use crate::factors::{Factor, FeatureImportance, SegmentChurnRate};
use crate::finance::{RevenueImpact, PROJECTION_MONTHS};
use crate::recommendations::{Recommendation, RECOMMENDATIONS};
use crate::viz;
use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const PAGE_TITLE: &str = "Churn & Revenue Analysis Dashboard";
pub const SIDEBAR_HEADER: &str = "Telecom Churn Analysis";
pub const SIDEBAR_DESCRIPTION: &str = "This dashboard presents an analysis of customer churn \
    at a telecommunications company, including a revenue forecast and insights for retention \
    strategies.";
const LOGO_FALLBACK: &str = "Logo";

/// The dashboard's three tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Financial,
    Factors,
    Actions,
    All,
}

impl View {
    pub fn includes(self, other: View) -> bool {
        self == View::All || self == other
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Financial => "Overview & Financial Impact",
            View::Factors => "Churn Factor Diagnostics",
            View::Actions => "Action Plan & Recommendations",
            View::All => PAGE_TITLE,
        }
    }
}

/// Presentation options that are not part of the computation
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub factor: Factor,
    pub top_features: usize,
    pub currency: String,
}

/// Every number and series the views display, computed once from the context
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: String,
    pub customers: usize,
    pub predicted_churners: usize,
    pub currency: String,
    pub revenue: RevenueImpact,
    /// `None` when the classifier has no linear coefficients
    pub feature_importance: Option<Vec<FeatureImportance>>,
    pub selected_factor: Factor,
    pub breakdown: Vec<SegmentChurnRate>,
    pub recommendations: Vec<Recommendation>,
}

impl DashboardReport {
    /// Aggregate the loaded context into the dashboard's metrics.
    ///
    /// # Arguments
    /// * `context` - Loaded datasets with predictions attached
    /// * `options` - Selected factor, ranking size, and currency symbol
    ///
    /// # Returns
    /// * `DashboardReport` ready for console, HTML, and JSON rendering
    pub fn build(context: &DashboardContext, options: &ReportOptions) -> crate::Result<Self> {
        let feature_importance = context.feature_importance(options.top_features);
        if feature_importance.is_none() {
            log::warn!("Classifier exposes no coefficients; feature importance view omitted");
        }

        Ok(Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            customers: context.customers.len(),
            predicted_churners: context.predicted_churners(),
            currency: options.currency.clone(),
            revenue: context.revenue_impact(),
            feature_importance,
            selected_factor: options.factor,
            breakdown: context.churn_breakdown(options.factor)?,
            recommendations: RECOMMENDATIONS.to_vec(),
        })
    }
}

/// Format money as `"<symbol> 1,234,567.89"`
pub fn format_currency(value: f64, symbol: &str) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{} {}{}.{}", symbol, sign, grouped, fraction)
}

/// Format a 0..1 ratio as a percentage with two decimals
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Print the selected views as text panels
pub fn write_console<W: Write>(out: &mut W, report: &DashboardReport, view: View) -> io::Result<()> {
    writeln!(out, "=== {} ===", PAGE_TITLE)?;
    writeln!(
        out,
        "Customers: {} ({} predicted to churn)",
        report.customers, report.predicted_churners
    )?;

    if view.includes(View::Financial) {
        write_financial_view(out, report)?;
    }
    if view.includes(View::Factors) {
        write_factors_view(out, report)?;
    }
    if view.includes(View::Actions) {
        write_actions_view(out, &report.recommendations)?;
    }
    Ok(())
}

fn write_financial_view<W: Write>(out: &mut W, report: &DashboardReport) -> io::Result<()> {
    let revenue = &report.revenue;
    let currency = &report.currency;

    writeln!(out, "\n--- {} ---", View::Financial.title())?;
    writeln!(
        out,
        "Current Monthly Revenue:      {}",
        format_currency(revenue.total_revenue, currency)
    )?;
    writeln!(
        out,
        "Estimated Monthly Loss:       {} ({})",
        format_currency(revenue.lost_revenue, currency),
        format_percent(revenue.monthly_loss_rate)
    )?;
    writeln!(
        out,
        "Projected Revenue ({} months): {}",
        PROJECTION_MONTHS,
        format_currency(revenue.final_revenue(), currency)
    )?;

    writeln!(out, "\n  Month | Projected Revenue")?;
    writeln!(out, "  ------|------------------")?;
    for (month, value) in revenue.projection_points() {
        writeln!(out, "  {:5} | {}", month, format_currency(value, currency))?;
    }
    Ok(())
}

fn write_factors_view<W: Write>(out: &mut W, report: &DashboardReport) -> io::Result<()> {
    writeln!(out, "\n--- {} ---", View::Factors.title())?;

    match &report.feature_importance {
        Some(ranking) => {
            writeln!(out, "Top {} factors influencing churn:", ranking.len())?;
            for (rank, feature) in ranking.iter().enumerate() {
                writeln!(
                    out,
                    "  {:2}. {:<40} {:.4}",
                    rank + 1,
                    feature.feature,
                    feature.importance
                )?;
            }
        }
        None => writeln!(out, "Feature importance unavailable for this model")?,
    }

    writeln!(
        out,
        "\nChurn rate by {}:",
        report.selected_factor.title()
    )?;
    for rate in &report.breakdown {
        writeln!(
            out,
            "  {:<30} {:6.2}%  ({} of {} customers)",
            rate.label, rate.churn_pct, rate.churned, rate.customers
        )?;
    }
    Ok(())
}

fn write_actions_view<W: Write>(out: &mut W, recommendations: &[Recommendation]) -> io::Result<()> {
    writeln!(out, "\n--- {} ---", View::Actions.title())?;
    for recommendation in recommendations {
        writeln!(out, "\n{}", recommendation.title)?;
        writeln!(out, "  Insight: {}", recommendation.insight)?;
        writeln!(out, "  Suggested action: {}", recommendation.action)?;
    }
    Ok(())
}

/// Sidebar logo: an image copied next to the page, or a text label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logo {
    Image(String),
    Text(String),
}

impl Logo {
    /// Copy the logo into `output_dir`. Any failure falls back to a text label.
    pub fn install(source: Option<&Path>, output_dir: &Path) -> Self {
        let Some(source) = source else {
            return Logo::Text(LOGO_FALLBACK.to_string());
        };

        let Some(file_name) = source.file_name() else {
            log::warn!("Logo path {} has no file name; using text label", source.display());
            return Logo::Text(LOGO_FALLBACK.to_string());
        };

        let target = output_dir.join(file_name);
        let image = Logo::Image(file_name.to_string_lossy().into_owned());

        // Copying a file onto itself truncates it
        if let (Ok(from), Ok(to)) = (source.canonicalize(), target.canonicalize()) {
            if from == to {
                log::debug!("Logo {} already in output directory", source.display());
                return image;
            }
        }

        match fs::copy(source, &target) {
            Ok(_) => image,
            Err(err) => {
                log::warn!(
                    "Could not load logo {}: {}; using text label",
                    source.display(),
                    err
                );
                Logo::Text(LOGO_FALLBACK.to_string())
            }
        }
    }
}

/// Pre-rendered SVG charts embedded in the page
#[derive(Debug, Clone)]
pub struct ChartSet {
    pub projection: String,
    pub importance: Option<String>,
    /// One chart per supported factor, in [`Factor::ALL`] order
    pub breakdowns: Vec<(Factor, String)>,
}

impl ChartSet {
    pub fn render(context: &DashboardContext, report: &DashboardReport) -> crate::Result<Self> {
        let projection = viz::render_projection_chart(&report.revenue)?;
        let importance = report
            .feature_importance
            .as_deref()
            .map(viz::render_importance_chart)
            .transpose()?;

        let mut breakdowns = Vec::with_capacity(Factor::ALL.len());
        for factor in Factor::ALL {
            let rates = context.churn_breakdown(factor)?;
            breakdowns.push((factor, viz::render_breakdown_chart(factor, &rates)?));
        }

        Ok(Self {
            projection,
            importance,
            breakdowns,
        })
    }
}

/// Paths of everything written by [`write_dashboard`]
#[derive(Debug, Clone)]
pub struct DashboardFiles {
    pub html: PathBuf,
    pub summary: PathBuf,
    pub charts: Vec<PathBuf>,
}

/// Render charts, HTML page, and JSON summary into `output_dir`
pub fn write_dashboard(
    context: &DashboardContext,
    report: &DashboardReport,
    output_dir: &Path,
    logo_source: Option<&Path>,
) -> crate::Result<DashboardFiles> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let charts = ChartSet::render(context, report)?;
    let mut chart_paths = Vec::new();

    let projection_path = output_dir.join("projection.svg");
    viz::save_svg(&projection_path, &charts.projection)?;
    chart_paths.push(projection_path);

    if let Some(svg) = &charts.importance {
        let path = output_dir.join("feature_importance.svg");
        viz::save_svg(&path, svg)?;
        chart_paths.push(path);
    }

    for (factor, svg) in &charts.breakdowns {
        let path = output_dir.join(format!("churn_by_{}.svg", factor.column()));
        viz::save_svg(&path, svg)?;
        chart_paths.push(path);
    }

    let logo = Logo::install(logo_source, output_dir);
    let html_path = output_dir.join("dashboard.html");
    fs::write(&html_path, render_html(report, &charts, &logo))
        .with_context(|| format!("Failed to write {}", html_path.display()))?;
    log::info!("Dashboard page saved to: {}", html_path.display());

    let summary_path = output_dir.join("dashboard.json");
    let summary = serde_json::to_string_pretty(report)?;
    fs::write(&summary_path, summary)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    log::info!("Summary saved to: {}", summary_path.display());

    Ok(DashboardFiles {
        html: html_path,
        summary: summary_path,
        charts: chart_paths,
    })
}

/// Self-contained HTML page with a sidebar, three tabs, and a factor dropdown
pub fn render_html(report: &DashboardReport, charts: &ChartSet, logo: &Logo) -> String {
    let revenue = &report.revenue;
    let currency = &report.currency;
    let mut html = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ margin: 0; font-family: sans-serif; display: flex; }}
aside {{ width: 260px; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; }}
main {{ flex: 1; padding: 1.5rem 2rem; }}
.tabs button {{ padding: 0.5rem 1rem; border: none; background: none; cursor: pointer; }}
.tabs button.active {{ border-bottom: 2px solid #1f77b4; }}
.tab {{ display: none; }}
.tab.active {{ display: block; }}
.metrics {{ display: flex; gap: 2rem; }}
.metric .value {{ font-size: 1.8rem; }}
.metric .delta {{ color: #d62728; }}
.factor-chart {{ display: none; }}
.factor-chart.active {{ display: block; }}
</style>
</head>
<body>
<aside>
{logo}
<h2>{header}</h2>
<hr>
<p>{description}</p>
<p><small>Generated {generated}</small></p>
</aside>
<main>
<h1>{title}</h1>
<div class="tabs">
<button class="active" data-tab="financial">{financial_title}</button>
<button data-tab="factors">{factors_title}</button>
<button data-tab="actions">{actions_title}</button>
</div>
"#,
        title = escape_html(PAGE_TITLE),
        logo = render_logo(logo),
        header = escape_html(SIDEBAR_HEADER),
        description = escape_html(SIDEBAR_DESCRIPTION),
        generated = escape_html(&report.generated_at),
        financial_title = escape_html(View::Financial.title()),
        factors_title = escape_html(View::Factors.title()),
        actions_title = escape_html(View::Actions.title()),
    );

    let _ = write!(
        html,
        r#"<section class="tab active" id="financial">
<h2>Revenue Forecast and Churn Impact</h2>
<div class="metrics">
<div class="metric"><div>Current Monthly Revenue</div><div class="value">{total}</div></div>
<div class="metric"><div>Estimated Monthly Loss</div><div class="value">{lost}</div><div class="delta">{rate}</div></div>
<div class="metric"><div>Projected Revenue ({months} months)</div><div class="value">{final_revenue}</div></div>
</div>
{projection}
</section>
"#,
        total = escape_html(&format_currency(revenue.total_revenue, currency)),
        lost = escape_html(&format_currency(revenue.lost_revenue, currency)),
        rate = escape_html(&format_percent(revenue.monthly_loss_rate)),
        months = PROJECTION_MONTHS,
        final_revenue = escape_html(&format_currency(revenue.final_revenue(), currency)),
        projection = charts.projection,
    );

    html.push_str("<section class=\"tab\" id=\"factors\">\n<h2>Diagnostics: Why Do Customers Leave?</h2>\n");
    match &charts.importance {
        Some(svg) => html.push_str(svg),
        None => html.push_str("<p>Feature importance is unavailable for this model.</p>"),
    }
    html.push_str("\n<h3>Detailed Analysis by Factor</h3>\n<label for=\"factor\">Select a factor to analyse:</label>\n<select id=\"factor\">\n");
    for factor in Factor::ALL {
        let selected = if factor == report.selected_factor { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{value}\"{selected}>{value}</option>",
            value = factor.column(),
            selected = selected
        );
    }
    html.push_str("</select>\n");
    for (factor, svg) in &charts.breakdowns {
        let active = if *factor == report.selected_factor { " active" } else { "" };
        let _ = writeln!(
            html,
            "<div class=\"factor-chart{active}\" data-factor=\"{value}\">{svg}</div>",
            active = active,
            value = factor.column(),
            svg = svg
        );
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"tab\" id=\"actions\">\n<h2>Action Plan and Strategic Recommendations</h2>\n");
    for recommendation in &report.recommendations {
        let _ = write!(
            html,
            "<h3>{}</h3>\n<ul>\n<li><strong>Insight:</strong> {}</li>\n<li><strong>Suggested action:</strong> {}</li>\n</ul>\n",
            escape_html(recommendation.title),
            escape_html(recommendation.insight),
            escape_html(recommendation.action)
        );
    }
    html.push_str("</section>\n</main>\n");

    html.push_str(
        r#"<script>
document.querySelectorAll('.tabs button').forEach(function (button) {
  button.addEventListener('click', function () {
    document.querySelectorAll('.tabs button').forEach(function (b) { b.classList.remove('active'); });
    document.querySelectorAll('.tab').forEach(function (t) { t.classList.remove('active'); });
    button.classList.add('active');
    document.getElementById(button.dataset.tab).classList.add('active');
  });
});
document.getElementById('factor').addEventListener('change', function (event) {
  document.querySelectorAll('.factor-chart').forEach(function (chart) {
    chart.classList.toggle('active', chart.dataset.factor === event.target.value);
  });
});
</script>
</body>
</html>
"#,
    );

    html
}

fn render_logo(logo: &Logo) -> String {
    match logo {
        Logo::Image(file) => format!(
            "<img src=\"{}\" alt=\"Logo\" width=\"150\">",
            escape_html(file)
        ),
        Logo::Text(label) => format!("<h1>{}</h1>", escape_html(label)),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn report() -> DashboardReport {
        DashboardReport {
            generated_at: "2024-01-01 00:00:00".to_string(),
            customers: 4,
            predicted_churners: 1,
            currency: "R$".to_string(),
            revenue: RevenueImpact::from_totals(10_000.0, 1_000.0),
            feature_importance: Some(vec![FeatureImportance {
                feature: "tenure".to_string(),
                importance: 1.25,
            }]),
            selected_factor: Factor::Tenure,
            breakdown: vec![SegmentChurnRate {
                label: "0-1 year".to_string(),
                customers: 4,
                churned: 1,
                churn_pct: 25.0,
                retained_pct: 75.0,
            }],
            recommendations: RECOMMENDATIONS.to_vec(),
        }
    }

    fn charts() -> ChartSet {
        ChartSet {
            projection: "<svg id=\"projection\"></svg>".to_string(),
            importance: None,
            breakdowns: Factor::ALL
                .iter()
                .map(|&f| (f, format!("<svg id=\"{}\"></svg>", f.column())))
                .collect(),
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0, "R$"), "R$ 0.00");
        assert_eq!(format_currency(999.5, "R$"), "R$ 999.50");
        assert_eq!(format_currency(1234.567, "$"), "$ 1,234.57");
        assert_eq!(format_currency(456_116.1, "R$"), "R$ 456,116.10");
        assert_eq!(format_currency(-1_000_000.0, "R$"), "R$ -1,000,000.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.1), "10.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_view_includes() {
        assert!(View::All.includes(View::Factors));
        assert!(View::Financial.includes(View::Financial));
        assert!(!View::Financial.includes(View::Actions));
    }

    #[test]
    fn test_write_console_all_views() {
        let mut out = Vec::new();
        write_console(&mut out, &report(), View::All).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Current Monthly Revenue:      R$ 10,000.00"));
        assert!(text.contains("R$ 1,000.00 (10.00%)"));
        assert!(text.contains("R$ 5,314.41"));
        assert!(text.contains("tenure"));
        assert!(text.contains("0-1 year"));
        assert!(text.contains("Focus on Short-Term Contracts"));
    }

    #[test]
    fn test_write_console_single_view() {
        let mut out = Vec::new();
        write_console(&mut out, &report(), View::Actions).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(View::Actions.title()));
        assert!(!text.contains("Current Monthly Revenue"));
        assert!(!text.contains("Churn rate by"));
    }

    #[test]
    fn test_render_html() {
        let html = render_html(&report(), &charts(), &Logo::Text("Logo".to_string()));

        assert!(html.contains("<h1>Logo</h1>"));
        assert!(html.contains("Telecom Churn Analysis"));
        assert!(html.contains("R$ 10,000.00"));
        assert!(html.contains("10.00%"));
        assert!(html.contains("<option value=\"tenure\" selected>tenure</option>"));
        assert!(html.contains("<option value=\"Contract\">Contract</option>"));
        assert!(html.contains("class=\"factor-chart active\" data-factor=\"tenure\""));
        assert!(html.contains("Feature importance is unavailable"));
        assert!(html.contains("Overview &amp; Financial Impact"));
    }

    #[test]
    fn test_logo_falls_back_to_text() {
        let dir = tempdir().unwrap();

        let missing = Logo::install(Some(Path::new("no/such/logo.jpg")), dir.path());
        assert_eq!(missing, Logo::Text("Logo".to_string()));

        assert_eq!(
            Logo::install(None, dir.path()),
            Logo::Text("Logo".to_string())
        );
    }

    #[test]
    fn test_logo_is_copied() {
        let source_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let source = source_dir.path().join("telecom_logo.jpg");
        fs::write(&source, b"not really a jpeg").unwrap();

        let logo = Logo::install(Some(&source), output_dir.path());
        assert_eq!(logo, Logo::Image("telecom_logo.jpg".to_string()));
        assert!(output_dir.path().join("telecom_logo.jpg").exists());
        assert!(render_logo(&logo).contains("src=\"telecom_logo.jpg\""));
    }

    #[test]
    fn test_logo_already_in_output_dir_is_kept() {
        let output_dir = tempdir().unwrap();
        let source = output_dir.path().join("logo.jpg");
        fs::write(&source, b"0123456789").unwrap();

        let logo = Logo::install(Some(&source), output_dir.path());
        assert_eq!(logo, Logo::Image("logo.jpg".to_string()));
        assert_eq!(fs::read(&source).unwrap(), b"0123456789");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("> 5 years & <b>"), "&gt; 5 years &amp; &lt;b&gt;");
    }
}
