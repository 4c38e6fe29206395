//! Command-line interface definitions and argument parsing

use crate::data::DataPaths;
use crate::factors::{Factor, DEFAULT_TOP_FEATURES};
use crate::report::{ReportOptions, View};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Churn dashboard: revenue impact projection and churn factor diagnostics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Processed (model-ready) CSV dataset including the label column
    #[arg(long, default_value = "data/processed.csv")]
    pub processed: PathBuf,

    /// Original CSV dataset with the same rows in the same order
    #[arg(long, default_value = "data/original.csv")]
    pub original: PathBuf,

    /// Classifier artifact (JSON)
    #[arg(short, long, default_value = "models/churn_model.json")]
    pub model: PathBuf,

    /// Scaler artifact (JSON)
    #[arg(short, long, default_value = "models/scaler.json")]
    pub scaler: PathBuf,

    /// Sidebar logo image; a text label is shown when it cannot be loaded
    #[arg(long, default_value = "assets/telecom_logo.jpg")]
    pub logo: PathBuf,

    /// Label column excluded from the classifier features
    #[arg(long, default_value = "Churn")]
    pub label_column: String,

    /// Directory for the generated charts, HTML page, and JSON summary
    #[arg(short, long, default_value = "dashboard")]
    pub output_dir: PathBuf,

    /// Which view to print to the console
    #[arg(long, value_enum, default_value_t = View::All)]
    pub view: View,

    /// Factor for the detailed churn breakdown
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Factor::Contract)]
    pub factor: Factor,

    /// Currency symbol for monetary metrics
    #[arg(long, default_value = "R$")]
    pub currency: String,

    /// Number of features in the importance ranking
    #[arg(long, default_value_t = DEFAULT_TOP_FEATURES as u16, value_parser = clap::value_parser!(u16).range(1..))]
    pub top_features: u16,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            processed: self.processed.clone(),
            original: self.original.clone(),
            model: self.model.clone(),
            scaler: self.scaler.clone(),
            label_column: self.label_column.clone(),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            factor: self.factor,
            top_features: usize::from(self.top_features),
            currency: self.currency.clone(),
        }
    }

    /// Default log level; `RUST_LOG` still takes precedence
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
