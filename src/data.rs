//! Dataset loading using Polars
//!
//! Two CSV files describe the same customers in the same row order: the
//! processed file feeds the classifier, the original file carries the
//! human-readable attributes shown on the dashboard.

use crate::error::DashboardError;
use anyhow::Context;
use ndarray::Array2;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const TENURE_COLUMN: &str = "tenure";
pub const MONTHLY_CHARGES_COLUMN: &str = "MonthlyCharges";
pub const CHURN_COLUMN: &str = "Churn";
pub const CONTRACT_COLUMN: &str = "Contract";
pub const INTERNET_SERVICE_COLUMN: &str = "InternetService";
pub const PAYMENT_METHOD_COLUMN: &str = "PaymentMethod";
pub const CUSTOMER_ID_COLUMN: &str = "customerID";

/// Locations of every input the dashboard reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Processed (numeric, model-ready) dataset
    pub processed: PathBuf,
    /// Original (human-readable) dataset, same rows in the same order
    pub original: PathBuf,
    /// Serialized classifier artifact
    pub model: PathBuf,
    /// Serialized scaler artifact
    pub scaler: PathBuf,
    /// Label column dropped from the processed dataset
    pub label_column: String,
}

/// Classifier input: feature matrix plus its column names
#[derive(Debug, Clone)]
pub struct ProcessedData {
    /// Feature columns in file order, label column excluded
    pub feature_names: Vec<String>,
    /// Raw (unscaled) feature matrix (n_customers, n_features)
    pub features: Array2<f64>,
}

impl ProcessedData {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }
}

/// One customer from the original dataset
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: Option<String>,
    /// Months as a customer
    pub tenure: u32,
    pub monthly_charges: f64,
    /// Ground-truth churn label
    pub churned: bool,
    pub contract: String,
    pub internet_service: String,
    pub payment_method: String,
    /// Set once after inference; false until then
    pub predicted_churn: bool,
}

/// Load the processed dataset, dropping `label_column` from the features
///
/// # Arguments
/// * `path` - Path to the processed CSV file
/// * `label_column` - Ground-truth column that must exist and is excluded from the features
///
/// # Returns
/// * `ProcessedData` with the feature names in column order and the feature matrix
pub fn load_processed_data(path: &Path, label_column: &str) -> crate::Result<ProcessedData> {
    let df = read_csv(path)?;
    let source_name = path.display().to_string();

    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    if !columns.iter().any(|name| name == label_column) {
        return Err(DashboardError::MissingColumn {
            column: label_column.to_string(),
            source_name,
        }
        .into());
    }

    let feature_names: Vec<String> = columns
        .into_iter()
        .filter(|name| name != label_column)
        .collect();

    let n_rows = df.height();
    let mut feature_columns = Vec::with_capacity(feature_names.len());
    for name in &feature_names {
        feature_columns.push(f64_column(&df, name, &source_name)?);
    }

    let features = Array2::from_shape_fn((n_rows, feature_names.len()), |(row, col)| {
        feature_columns[col][row]
    });

    Ok(ProcessedData {
        feature_names,
        features,
    })
}

/// Load the original, human-readable customer dataset
///
/// # Arguments
/// * `path` - Path to the original CSV file
///
/// # Returns
/// * One `CustomerRecord` per row, in file order, with `predicted_churn` unset
pub fn load_customers(path: &Path) -> crate::Result<Vec<CustomerRecord>> {
    let df = read_csv(path)?;
    let source_name = path.display().to_string();

    let tenure = f64_column(&df, TENURE_COLUMN, &source_name)?;
    let charges = f64_column(&df, MONTHLY_CHARGES_COLUMN, &source_name)?;
    let churn = string_column(&df, CHURN_COLUMN, &source_name)?;
    let contract = string_column(&df, CONTRACT_COLUMN, &source_name)?;
    let internet = string_column(&df, INTERNET_SERVICE_COLUMN, &source_name)?;
    let payment = string_column(&df, PAYMENT_METHOD_COLUMN, &source_name)?;
    let customer_ids = if df.column(CUSTOMER_ID_COLUMN).is_ok() {
        Some(string_column(&df, CUSTOMER_ID_COLUMN, &source_name)?)
    } else {
        None
    };

    let mut customers = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        customers.push(CustomerRecord {
            customer_id: customer_ids.as_ref().map(|ids| ids[row].clone()),
            tenure: parse_tenure(tenure[row], row)?,
            monthly_charges: parse_charge(charges[row], row)?,
            churned: parse_churn_label(&churn[row], row)?,
            contract: contract[row].clone(),
            internet_service: internet[row].clone(),
            payment_method: payment[row].clone(),
            predicted_churn: false,
        });
    }

    Ok(customers)
}

/// Interpret a ground-truth churn label
pub fn parse_churn_label(label: &str, row: usize) -> crate::Result<bool> {
    match label.trim().to_ascii_lowercase().as_str() {
        "yes" | "1" | "true" => Ok(true),
        "no" | "0" | "false" => Ok(false),
        _ => Err(DashboardError::UnknownChurnLabel {
            label: label.to_string(),
            row,
        }
        .into()),
    }
}

fn read_csv(path: &Path) -> crate::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV file {}", path.display()))?;

    log::debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn column<'a>(df: &'a DataFrame, name: &str, source_name: &str) -> crate::Result<&'a Series> {
    df.column(name).map_err(|_| -> anyhow::Error {
        DashboardError::MissingColumn {
            column: name.to_string(),
            source_name: source_name.to_string(),
        }
        .into()
    })
}

fn f64_column(df: &DataFrame, name: &str, source_name: &str) -> crate::Result<Vec<f64>> {
    let series = column(df, name, source_name)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;

    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| -> crate::Result<f64> {
            match value {
                Some(v) if v.is_finite() => Ok(v),
                Some(v) => Err(DashboardError::InvalidValue {
                    column: name.to_string(),
                    row,
                    value: v.to_string(),
                    reason: "value is not finite",
                }
                .into()),
                None => Err(DashboardError::NullValue {
                    column: name.to_string(),
                    row,
                }
                .into()),
            }
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str, source_name: &str) -> crate::Result<Vec<String>> {
    let series = column(df, name, source_name)?.cast(&DataType::String)?;

    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| -> crate::Result<String> {
            value.map(str::to_string).ok_or_else(|| {
                DashboardError::NullValue {
                    column: name.to_string(),
                    row,
                }
                .into()
            })
        })
        .collect()
}

fn parse_tenure(value: f64, row: usize) -> crate::Result<u32> {
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(DashboardError::InvalidValue {
            column: TENURE_COLUMN.to_string(),
            row,
            value: value.to_string(),
            reason: "tenure must be a non-negative whole number of months",
        }
        .into());
    }
    Ok(value as u32)
}

fn parse_charge(value: f64, row: usize) -> crate::Result<f64> {
    if value < 0.0 {
        return Err(DashboardError::InvalidValue {
            column: MONTHLY_CHARGES_COLUMN.to_string(),
            row,
            value: value.to_string(),
            reason: "monthly charge must be non-negative",
        }
        .into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_processed_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tenure,MonthlyCharges,Churn,Contract_Month-to-month").unwrap();
        writeln!(file, "1,70.5,1,1").unwrap();
        writeln!(file, "30,50.0,0,0").unwrap();
        writeln!(file, "70,20.25,0,0").unwrap();
        file
    }

    fn create_original_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "customerID,tenure,Contract,InternetService,PaymentMethod,MonthlyCharges,Churn"
        )
        .unwrap();
        writeln!(file, "0001-A,1,Month-to-month,Fiber optic,Electronic check,70.5,Yes").unwrap();
        writeln!(file, "0002-B,30,One year,DSL,Mailed check,50.0,No").unwrap();
        writeln!(file, "0003-C,70,Two year,No,Credit card (automatic),20.25,No").unwrap();
        file
    }

    #[test]
    fn test_load_processed_data_drops_label() {
        let file = create_processed_csv();
        let data = load_processed_data(file.path(), "Churn").unwrap();

        assert_eq!(
            data.feature_names,
            vec!["tenure", "MonthlyCharges", "Contract_Month-to-month"]
        );
        assert_eq!(data.features.shape(), &[3, 3]);
        assert_eq!(data.features[[0, 1]], 70.5);
        assert_eq!(data.features[[2, 0]], 70.0);
        assert_eq!(data.n_rows(), 3);
    }

    #[test]
    fn test_load_processed_data_requires_label() {
        let file = create_processed_csv();
        let err = load_processed_data(file.path(), "Exited").unwrap_err();
        assert!(err.to_string().contains("Exited"));
    }

    #[test]
    fn test_load_customers() {
        let file = create_original_csv();
        let customers = load_customers(file.path()).unwrap();

        assert_eq!(customers.len(), 3);
        assert_eq!(customers[0].customer_id.as_deref(), Some("0001-A"));
        assert_eq!(customers[0].tenure, 1);
        assert!(customers[0].churned);
        assert!(!customers[1].churned);
        assert_eq!(customers[2].payment_method, "Credit card (automatic)");
        assert_eq!(customers[2].monthly_charges, 20.25);
        assert!(customers.iter().all(|c| !c.predicted_churn));
    }

    #[test]
    fn test_load_customers_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tenure,MonthlyCharges,Churn").unwrap();
        writeln!(file, "1,70.5,Yes").unwrap();

        let err = load_customers(file.path()).unwrap_err();
        assert!(err.to_string().contains("Contract"));
    }

    #[test]
    fn test_load_customers_rejects_negative_charge() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "tenure,Contract,InternetService,PaymentMethod,MonthlyCharges,Churn"
        )
        .unwrap();
        writeln!(file, "3,Month-to-month,DSL,Mailed check,-5.0,No").unwrap();

        assert!(load_customers(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_customers(Path::new("does/not/exist.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_churn_label() {
        assert!(parse_churn_label("Yes", 0).unwrap());
        assert!(parse_churn_label(" yes ", 0).unwrap());
        assert!(parse_churn_label("1", 0).unwrap());
        assert!(!parse_churn_label("No", 0).unwrap());
        assert!(!parse_churn_label("false", 0).unwrap());
        assert!(parse_churn_label("maybe", 4).is_err());
    }
}
