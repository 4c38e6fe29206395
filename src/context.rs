//! One-time load of datasets and artifacts into an immutable dashboard context

use crate::data::{self, CustomerRecord, DataPaths, ProcessedData};
use crate::error::DashboardError;
use crate::factors::{self, Factor, FeatureImportance, SegmentChurnRate};
use crate::finance::RevenueImpact;
use crate::model::{self, Classifier, Scaler};
use std::time::Instant;

/// Everything the dashboard views read. Built once per process and only borrowed afterwards.
#[derive(Debug)]
pub struct DashboardContext {
    /// Original customers, each annotated with its churn prediction
    pub customers: Vec<CustomerRecord>,
    /// Feature columns, index-aligned with the classifier coefficients
    pub feature_names: Vec<String>,
    classifier: Box<dyn Classifier>,
}

impl DashboardContext {
    /// Read both datasets and both artifacts, then run inference
    ///
    /// # Arguments
    /// * `paths` - Dataset and artifact locations plus the label column name
    ///
    /// # Returns
    /// * `DashboardContext` with a prediction attached to every customer
    pub fn load(paths: &DataPaths) -> crate::Result<Self> {
        let start = Instant::now();

        log::info!("Loading processed dataset from {}", paths.processed.display());
        let processed = data::load_processed_data(&paths.processed, &paths.label_column)?;
        log::debug!(
            "Processed features shape: {:?}",
            processed.features.shape()
        );

        log::info!("Loading original dataset from {}", paths.original.display());
        let customers = data::load_customers(&paths.original)?;

        log::info!("Loading scaler from {}", paths.scaler.display());
        let scaler = model::load_scaler(&paths.scaler)?;
        log::info!("Loading classifier from {}", paths.model.display());
        let classifier = model::load_classifier(&paths.model)?;

        let context = Self::from_parts(processed, customers, scaler.as_ref(), classifier)?;
        log::debug!("Context ready in {:.2}s", start.elapsed().as_secs_f64());
        Ok(context)
    }

    /// Validate alignment, scale, predict, and attach predictions to customers by row position
    pub fn from_parts(
        processed: ProcessedData,
        mut customers: Vec<CustomerRecord>,
        scaler: &dyn Scaler,
        classifier: Box<dyn Classifier>,
    ) -> crate::Result<Self> {
        if processed.n_rows() != customers.len() {
            return Err(DashboardError::RowCountMismatch {
                processed: processed.n_rows(),
                original: customers.len(),
            }
            .into());
        }

        check_features("Scaler", scaler.n_features(), scaler.feature_names(), &processed.feature_names)?;
        check_features(
            "Classifier",
            classifier.n_features(),
            classifier.feature_names(),
            &processed.feature_names,
        )?;

        let scaled = scaler.transform(&processed.features)?;
        let predictions = classifier.predict(&scaled)?;

        for (customer, predicted) in customers.iter_mut().zip(predictions) {
            customer.predicted_churn = predicted;
        }

        let predicted_churners = customers.iter().filter(|c| c.predicted_churn).count();
        log::info!(
            "Predicted {} of {} customers to churn",
            predicted_churners,
            customers.len()
        );

        Ok(Self {
            customers,
            feature_names: processed.feature_names,
            classifier,
        })
    }

    pub fn predicted_churners(&self) -> usize {
        self.customers.iter().filter(|c| c.predicted_churn).count()
    }

    pub fn revenue_impact(&self) -> RevenueImpact {
        RevenueImpact::from_customers(&self.customers)
    }

    /// Top features by coefficient magnitude, or `None` when the classifier is not linear
    pub fn feature_importance(&self, top_n: usize) -> Option<Vec<FeatureImportance>> {
        self.classifier
            .coefficients()
            .map(|coef| factors::rank_feature_importance(&self.feature_names, coef, top_n))
    }

    pub fn churn_breakdown(&self, factor: Factor) -> crate::Result<Vec<SegmentChurnRate>> {
        factors::churn_rate_by_factor(&self.customers, factor)
    }
}

fn check_features(
    artifact: &'static str,
    expected: usize,
    artifact_names: Option<&[String]>,
    dataset_names: &[String],
) -> crate::Result<()> {
    if expected != dataset_names.len() {
        return Err(DashboardError::FeatureCountMismatch {
            artifact,
            expected,
            actual: dataset_names.len(),
        }
        .into());
    }

    if let Some(names) = artifact_names {
        if let Some((position, (wanted, found))) = names
            .iter()
            .zip(dataset_names)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(DashboardError::FeatureOrderMismatch {
                artifact,
                position,
                expected: wanted.clone(),
                found: found.clone(),
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogisticRegression, StandardScaler};
    use ndarray::{array, Array2};

    #[derive(Debug)]
    struct AlwaysChurn;

    impl Classifier for AlwaysChurn {
        fn n_features(&self) -> usize {
            2
        }

        fn predict(&self, features: &Array2<f64>) -> crate::Result<Vec<bool>> {
            Ok(vec![true; features.nrows()])
        }
    }

    fn processed() -> ProcessedData {
        ProcessedData {
            feature_names: vec!["tenure".to_string(), "MonthlyCharges".to_string()],
            features: array![[2.0, 90.0], [48.0, 30.0], [10.0, 70.0]],
        }
    }

    fn customers(n: usize) -> Vec<CustomerRecord> {
        (0..n)
            .map(|i| CustomerRecord {
                customer_id: Some(format!("C{}", i)),
                tenure: [2, 48, 10][i % 3],
                monthly_charges: [90.0, 30.0, 70.0][i % 3],
                churned: i % 3 != 1,
                contract: "Month-to-month".to_string(),
                internet_service: "Fiber optic".to_string(),
                payment_method: "Electronic check".to_string(),
                predicted_churn: false,
            })
            .collect()
    }

    fn scaler(names: Option<Vec<String>>) -> StandardScaler {
        StandardScaler {
            mean: vec![20.0, 60.0],
            scale: vec![10.0, 20.0],
            feature_names: names,
        }
    }

    fn classifier() -> Box<dyn Classifier> {
        Box::new(LogisticRegression {
            coef: vec![-1.0, 2.0],
            intercept: 0.0,
            feature_names: None,
        })
    }

    #[test]
    fn test_predictions_join_by_position() {
        let context =
            DashboardContext::from_parts(processed(), customers(3), &scaler(None), classifier())
                .unwrap();

        // scaled rows: [-1.8, 1.5], [2.8, -1.5], [-1.0, 0.5]
        let predicted: Vec<bool> = context.customers.iter().map(|c| c.predicted_churn).collect();
        assert_eq!(predicted, vec![true, false, true]);
        assert_eq!(context.predicted_churners(), 2);

        let impact = context.revenue_impact();
        assert_eq!(impact.total_revenue, 190.0);
        assert_eq!(impact.lost_revenue, 160.0);
    }

    #[test]
    fn test_row_count_mismatch_is_fatal() {
        let result =
            DashboardContext::from_parts(processed(), customers(2), &scaler(None), classifier());
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_order_mismatch_is_fatal() {
        let swapped = Some(vec!["MonthlyCharges".to_string(), "tenure".to_string()]);
        let err = DashboardContext::from_parts(processed(), customers(3), &scaler(swapped), classifier())
            .unwrap_err();
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn test_feature_count_mismatch_is_fatal() {
        let wide = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
            feature_names: None,
        };
        assert!(DashboardContext::from_parts(processed(), customers(3), &wide, classifier()).is_err());
    }

    #[test]
    fn test_feature_importance_requires_coefficients() {
        let linear =
            DashboardContext::from_parts(processed(), customers(3), &scaler(None), classifier())
                .unwrap();
        let ranking = linear.feature_importance(10).unwrap();
        assert_eq!(ranking[0].feature, "MonthlyCharges");
        assert_eq!(ranking[1].feature, "tenure");

        let opaque =
            DashboardContext::from_parts(processed(), customers(3), &scaler(None), Box::new(AlwaysChurn))
                .unwrap();
        assert!(opaque.feature_importance(10).is_none());
        assert_eq!(opaque.revenue_impact().monthly_loss_rate, 1.0);
    }

    #[test]
    fn test_churn_breakdown_uses_ground_truth() {
        let context =
            DashboardContext::from_parts(processed(), customers(3), &scaler(None), Box::new(AlwaysChurn))
                .unwrap();
        let rates = context.churn_breakdown(Factor::Tenure).unwrap();
        let labels: Vec<&str> = rates.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["0-1 year", "4-5 years"]);
        assert_eq!(rates[0].churn_pct, 100.0);
        assert_eq!(rates[1].churn_pct, 0.0);
    }
}
