//! Churn factor diagnostics: coefficient ranking and churn rate per segment

use crate::data::{self, CustomerRecord};
use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Default number of features shown in the importance ranking
pub const DEFAULT_TOP_FEATURES: usize = 10;

/// Tenure buckets in months: lower bound inclusive, upper bound exclusive
pub const TENURE_BUCKETS: [TenureBucket; 5] = [
    TenureBucket { lower: 0, upper: 12, label: "0-1 year" },
    TenureBucket { lower: 12, upper: 24, label: "1-2 years" },
    TenureBucket { lower: 24, upper: 48, label: "2-4 years" },
    TenureBucket { lower: 48, upper: 60, label: "4-5 years" },
    TenureBucket { lower: 60, upper: 100, label: "> 5 years" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenureBucket {
    pub lower: u32,
    pub upper: u32,
    pub label: &'static str,
}

impl TenureBucket {
    pub fn contains(&self, tenure: u32) -> bool {
        (self.lower..self.upper).contains(&tenure)
    }
}

/// Index into [`TENURE_BUCKETS`]; tenures of 100 months or more fall outside every bucket
pub fn tenure_bucket(tenure: u32) -> Option<usize> {
    TENURE_BUCKETS.iter().position(|bucket| bucket.contains(tenure))
}

/// The customer attributes a churn breakdown can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Factor {
    #[value(name = "Contract")]
    #[serde(rename = "Contract")]
    Contract,
    #[value(name = "InternetService")]
    #[serde(rename = "InternetService")]
    InternetService,
    #[value(name = "tenure")]
    #[serde(rename = "tenure")]
    Tenure,
    #[value(name = "PaymentMethod")]
    #[serde(rename = "PaymentMethod")]
    PaymentMethod,
}

impl Factor {
    pub const ALL: [Factor; 4] = [
        Factor::Contract,
        Factor::InternetService,
        Factor::Tenure,
        Factor::PaymentMethod,
    ];

    /// Column name in the original dataset
    pub fn column(self) -> &'static str {
        match self {
            Factor::Contract => data::CONTRACT_COLUMN,
            Factor::InternetService => data::INTERNET_SERVICE_COLUMN,
            Factor::Tenure => data::TENURE_COLUMN,
            Factor::PaymentMethod => data::PAYMENT_METHOD_COLUMN,
        }
    }

    /// Axis / chart title for this factor
    pub fn title(self) -> &'static str {
        match self {
            Factor::Contract => "Contract",
            Factor::InternetService => "Internet Service",
            Factor::Tenure => "Tenure",
            Factor::PaymentMethod => "Payment Method",
        }
    }

    /// Group key for a customer: (sort rank, label). Categorical factors
    /// share rank 0 so groups sort by label; tenure sorts by bucket order.
    fn group_key(self, customer: &CustomerRecord) -> Option<(usize, String)> {
        match self {
            Factor::Contract => Some((0, customer.contract.clone())),
            Factor::InternetService => Some((0, customer.internet_service.clone())),
            Factor::PaymentMethod => Some((0, customer.payment_method.clone())),
            Factor::Tenure => tenure_bucket(customer.tenure)
                .map(|idx| (idx, TENURE_BUCKETS[idx].label.to_string())),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A feature paired with the magnitude of its coefficient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Rank features by absolute coefficient, largest first, keeping the `top_n` strongest.
/// Ties keep the original feature order.
pub fn rank_feature_importance(
    feature_names: &[String],
    coefficients: &[f64],
    top_n: usize,
) -> Vec<FeatureImportance> {
    let mut ranking: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(coefficients)
        .map(|(feature, coef)| FeatureImportance {
            feature: feature.clone(),
            importance: coef.abs(),
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
    });
    ranking.truncate(top_n);
    ranking
}

/// Churn statistics for one segment of customers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentChurnRate {
    pub label: String,
    pub customers: usize,
    pub churned: usize,
    /// Percentage of the segment whose ground-truth label is churn
    pub churn_pct: f64,
    /// Percentage of the segment that stayed
    pub retained_pct: f64,
}

/// Churn percentage per group of the selected factor
///
/// # Arguments
/// * `customers` - Customer records carrying the ground-truth churn label
/// * `factor` - Attribute to group by
///
/// # Returns
/// * One `SegmentChurnRate` per non-empty group; categorical groups sorted by
///   label, tenure groups in bucket order
pub fn churn_rate_by_factor(
    customers: &[CustomerRecord],
    factor: Factor,
) -> crate::Result<Vec<SegmentChurnRate>> {
    let mut ranks: Vec<u32> = Vec::with_capacity(customers.len());
    let mut labels: Vec<String> = Vec::with_capacity(customers.len());
    let mut churned: Vec<u32> = Vec::with_capacity(customers.len());

    for customer in customers {
        if let Some((rank, label)) = factor.group_key(customer) {
            ranks.push(rank as u32);
            labels.push(label);
            churned.push(u32::from(customer.churned));
        }
    }

    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let segments = df!(
        "rank" => ranks,
        "label" => labels,
        "churned" => churned
    )?
    .lazy()
    .group_by([col("rank"), col("label")])
    .agg([
        col("churned").count().cast(DataType::UInt64).alias("customers"),
        col("churned").sum().cast(DataType::UInt64).alias("churned"),
    ])
    .sort_by_exprs([col("rank"), col("label")], SortMultipleOptions::default())
    .collect()?;

    let labels = segments.column("label")?.str()?;
    let totals = segments.column("customers")?.u64()?;
    let churned = segments.column("churned")?.u64()?;

    let rates = labels
        .into_iter()
        .zip(totals.into_iter())
        .zip(churned.into_iter())
        .filter_map(|((label, total), churned)| {
            let label = label?;
            let total = total? as usize;
            let churned = churned.unwrap_or(0) as usize;
            Some(SegmentChurnRate {
                label: label.to_string(),
                customers: total,
                churned,
                churn_pct: 100.0 * churned as f64 / total as f64,
                retained_pct: 100.0 * (total - churned) as f64 / total as f64,
            })
        })
        .collect();

    Ok(rates)
}
