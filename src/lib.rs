//! ChurnForge: customer churn dashboard built on a pre-trained linear classifier
//!
//! This library loads a processed and an original customer dataset together
//! with fitted scaler and classifier artifacts, predicts churn, projects the
//! revenue impact, and diagnoses which factors drive churn.

pub mod cli;
pub mod context;
pub mod data;
pub mod error;
pub mod factors;
pub mod finance;
pub mod model;
pub mod recommendations;
pub mod report;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use context::DashboardContext;
pub use data::{load_customers, load_processed_data, CustomerRecord, DataPaths, ProcessedData};
pub use error::DashboardError;
pub use factors::{churn_rate_by_factor, rank_feature_importance, Factor};
pub use finance::{monthly_loss_rate, project_revenue, RevenueImpact};
pub use model::{Classifier, LogisticRegression, Scaler, StandardScaler};
pub use report::{write_dashboard, DashboardReport, ReportOptions, View};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
