//! Domain errors raised while loading datasets and model artifacts

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Null value in column '{column}' at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Invalid value {value} in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
        reason: &'static str,
    },

    #[error("Unrecognised churn label '{label}' at row {row}")]
    UnknownChurnLabel { label: String, row: usize },

    #[error("Processed dataset has {processed} rows but original dataset has {original}")]
    RowCountMismatch { processed: usize, original: usize },

    #[error("{artifact} expects {expected} features, dataset provides {actual}")]
    FeatureCountMismatch {
        artifact: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{artifact} feature order does not match dataset at position {position}: expected '{expected}', found '{found}'")]
    FeatureOrderMismatch {
        artifact: &'static str,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}
