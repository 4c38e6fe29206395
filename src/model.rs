//! Pre-trained scaler and classifier artifacts
//!
//! Training happens elsewhere; this module only consumes the fitted
//! parameters, serialized as JSON documents tagged by `"type"`.

use crate::error::DashboardError;
use anyhow::Context;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Maps raw feature vectors into the space the classifier was trained on
pub trait Scaler: fmt::Debug {
    /// Number of feature columns the scaler was fit on
    fn n_features(&self) -> usize;

    /// Column names seen at fit time, if the artifact recorded them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn transform(&self, raw: &Array2<f64>) -> crate::Result<Array2<f64>>;
}

/// Binary churn classifier
pub trait Classifier: fmt::Debug {
    fn n_features(&self) -> usize;

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict one label per row; `true` means the customer is expected to churn
    fn predict(&self, features: &Array2<f64>) -> crate::Result<Vec<bool>>;

    /// Linear coefficients aligned with the feature columns. Models without
    /// a linear decision function return `None`.
    fn coefficients(&self) -> Option<&[f64]> {
        None
    }
}

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform(&self, raw: &Array2<f64>) -> crate::Result<Array2<f64>> {
        check_width("Scaler", self.n_features(), raw.ncols())?;

        let mean = Array1::from(self.mean.clone());
        // Constant columns were fit with a zero scale; leave them centred only
        let scale = Array1::from_iter(
            self.scale
                .iter()
                .map(|&s| if s == 0.0 { 1.0 } else { s }),
        );

        Ok((raw - &mean) / &scale)
    }
}

/// Min-max scaling: `x * scale + min`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform(&self, raw: &Array2<f64>) -> crate::Result<Array2<f64>> {
        check_width("Scaler", self.n_features(), raw.ncols())?;

        let min = Array1::from(self.min.clone());
        let scale = Array1::from(self.scale.clone());

        Ok(raw * &scale + &min)
    }
}

/// Logistic regression decision function: positive when `coef . x + intercept > 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    /// Raw decision scores, one per row
    pub fn decision_function(&self, features: &Array2<f64>) -> crate::Result<Array1<f64>> {
        check_width("Classifier", self.n_features(), features.ncols())?;
        let coef = Array1::from(self.coef.clone());
        Ok(features.dot(&coef) + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &Array2<f64>) -> crate::Result<Vec<bool>> {
        Ok(self
            .decision_function(features)?
            .iter()
            .map(|&score| score > 0.0)
            .collect())
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(self.coef.as_slice())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScalerArtifact {
    StandardScaler(StandardScaler),
    MinMaxScaler(MinMaxScaler),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClassifierArtifact {
    LogisticRegression(LogisticRegression),
}

/// Load a scaler artifact from a JSON file
pub fn load_scaler(path: &Path) -> crate::Result<Box<dyn Scaler>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scaler artifact {}", path.display()))?;
    parse_scaler(&content)
        .with_context(|| format!("Failed to load scaler artifact {}", path.display()))
}

/// Load a classifier artifact from a JSON file
pub fn load_classifier(path: &Path) -> crate::Result<Box<dyn Classifier>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
    parse_classifier(&content)
        .with_context(|| format!("Failed to load model artifact {}", path.display()))
}

pub fn parse_scaler(json: &str) -> crate::Result<Box<dyn Scaler>> {
    let scaler: Box<dyn Scaler> = match serde_json::from_str::<ScalerArtifact>(json)? {
        ScalerArtifact::StandardScaler(s) => {
            check_lengths("standard_scaler", s.mean.len(), s.scale.len())?;
            check_names("standard_scaler", s.mean.len(), s.feature_names.as_deref())?;
            Box::new(s)
        }
        ScalerArtifact::MinMaxScaler(s) => {
            check_lengths("min_max_scaler", s.min.len(), s.scale.len())?;
            check_names("min_max_scaler", s.min.len(), s.feature_names.as_deref())?;
            Box::new(s)
        }
    };
    Ok(scaler)
}

pub fn parse_classifier(json: &str) -> crate::Result<Box<dyn Classifier>> {
    let classifier: Box<dyn Classifier> = match serde_json::from_str::<ClassifierArtifact>(json)? {
        ClassifierArtifact::LogisticRegression(model) => {
            if model.coef.is_empty() {
                return Err(DashboardError::InvalidArtifact(
                    "logistic_regression has no coefficients".to_string(),
                )
                .into());
            }
            check_names("logistic_regression", model.coef.len(), model.feature_names.as_deref())?;
            Box::new(model)
        }
    };
    Ok(classifier)
}

fn check_width(artifact: &'static str, expected: usize, actual: usize) -> crate::Result<()> {
    if expected != actual {
        return Err(DashboardError::FeatureCountMismatch {
            artifact,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

fn check_lengths(kind: &str, left: usize, right: usize) -> crate::Result<()> {
    if left != right {
        return Err(DashboardError::InvalidArtifact(format!(
            "{} parameter vectors differ in length ({} vs {})",
            kind, left, right
        ))
        .into());
    }
    Ok(())
}

fn check_names(kind: &str, n_features: usize, names: Option<&[String]>) -> crate::Result<()> {
    match names {
        Some(names) if names.len() != n_features => Err(DashboardError::InvalidArtifact(format!(
            "{} lists {} feature names for {} parameters",
            kind,
            names.len(),
            n_features
        ))
        .into()),
        _ => Ok(()),
    }
}
