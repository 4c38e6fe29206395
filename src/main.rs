//! ChurnForge: churn dashboard CLI
//!
//! This is the main entrypoint that loads the data and model artifacts once,
//! prints the requested views, and writes the dashboard bundle.

use anyhow::Result;
use churnforge::{report, Args, DashboardContext, DashboardReport};
use clap::Parser;
use std::io;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(&args);

    let start_time = Instant::now();

    // Step 1: Load datasets and artifacts, run inference
    let context = DashboardContext::load(&args.data_paths())?;
    log::info!(
        "Loaded {} customers with {} features",
        context.customers.len(),
        context.feature_names.len()
    );

    // Step 2: Aggregate everything the views display
    let report = DashboardReport::build(&context, &args.report_options())?;

    // Step 3: Console render
    let stdout = io::stdout();
    report::write_console(&mut stdout.lock(), &report, args.view)?;

    // Step 4: Charts, HTML page, JSON summary
    let render_start = Instant::now();
    let files = report::write_dashboard(&context, &report, &args.output_dir, Some(&args.logo))?;
    log::debug!(
        "Rendered {} charts in {:.2}s",
        files.charts.len(),
        render_start.elapsed().as_secs_f64()
    );

    println!("\nDashboard saved to: {}", files.html.display());
    println!("Summary saved to: {}", files.summary.display());
    log::info!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(args.log_level());
    // RUST_LOG overrides the command-line default
    builder.parse_default_env();
    builder.init();
}
