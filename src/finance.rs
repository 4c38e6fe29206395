//! Revenue impact of predicted churn and the fixed-rate decay projection

use crate::data::CustomerRecord;
use serde::Serialize;

/// Number of future months projected
pub const PROJECTION_MONTHS: usize = 6;

/// Current revenue, revenue at risk, and the projected decay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueImpact {
    /// Sum of monthly charges over all customers
    pub total_revenue: f64,
    /// Sum of monthly charges over customers predicted to churn
    pub lost_revenue: f64,
    /// `lost_revenue / total_revenue`, 0 when there is no revenue
    pub monthly_loss_rate: f64,
    /// Revenue at the end of each future month
    pub projection: Vec<f64>,
}

impl RevenueImpact {
    pub fn from_customers(customers: &[CustomerRecord]) -> Self {
        let total_revenue: f64 = customers.iter().map(|c| c.monthly_charges).sum();
        let lost_revenue: f64 = customers
            .iter()
            .filter(|c| c.predicted_churn)
            .map(|c| c.monthly_charges)
            .sum();

        Self::from_totals(total_revenue, lost_revenue)
    }

    pub fn from_totals(total_revenue: f64, lost_revenue: f64) -> Self {
        let monthly_loss_rate = monthly_loss_rate(lost_revenue, total_revenue);
        let projection = project_revenue(total_revenue, monthly_loss_rate, PROJECTION_MONTHS);

        Self {
            total_revenue,
            lost_revenue,
            monthly_loss_rate,
            projection,
        }
    }

    /// Loss rate as a percentage
    pub fn loss_percentage(&self) -> f64 {
        self.monthly_loss_rate * 100.0
    }

    /// Revenue at the end of the projection horizon
    pub fn final_revenue(&self) -> f64 {
        self.projection.last().copied().unwrap_or(self.total_revenue)
    }

    /// (month, revenue) pairs starting at month 1
    pub fn projection_points(&self) -> Vec<(u32, f64)> {
        self.projection
            .iter()
            .enumerate()
            .map(|(i, &revenue)| (i as u32 + 1, revenue))
            .collect()
    }
}

/// Share of revenue lost to churners each month
pub fn monthly_loss_rate(lost_revenue: f64, total_revenue: f64) -> f64 {
    if total_revenue > 0.0 {
        lost_revenue / total_revenue
    } else {
        0.0
    }
}

/// Apply the same loss rate for `months` periods, recording revenue after each
pub fn project_revenue(start_revenue: f64, loss_rate: f64, months: usize) -> Vec<f64> {
    let mut projection = Vec::with_capacity(months);
    let mut revenue = start_revenue;

    for _ in 0..months {
        let monthly_loss = revenue * loss_rate;
        revenue -= monthly_loss;
        projection.push(revenue);
    }

    projection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(charges: f64, predicted_churn: bool) -> CustomerRecord {
        CustomerRecord {
            customer_id: None,
            tenure: 12,
            monthly_charges: charges,
            churned: predicted_churn,
            contract: "Month-to-month".to_string(),
            internet_service: "DSL".to_string(),
            payment_method: "Mailed check".to_string(),
            predicted_churn,
        }
    }

    #[test]
    fn test_loss_rate_and_projection() {
        let impact = RevenueImpact::from_totals(10_000.0, 1_000.0);

        assert!((impact.monthly_loss_rate - 0.10).abs() < 1e-12);
        assert!((impact.loss_percentage() - 10.0).abs() < 1e-9);
        assert_eq!(impact.projection.len(), PROJECTION_MONTHS);
        assert!((impact.projection[0] - 9_000.0).abs() < 1e-9);
        assert!((impact.final_revenue() - 5_314.41).abs() < 1e-6);
    }

    #[test]
    fn test_zero_revenue_has_no_loss() {
        assert_eq!(monthly_loss_rate(0.0, 0.0), 0.0);
        assert_eq!(monthly_loss_rate(50.0, 0.0), 0.0);

        let impact = RevenueImpact::from_customers(&[]);
        assert_eq!(impact.total_revenue, 0.0);
        assert_eq!(impact.monthly_loss_rate, 0.0);
        assert_eq!(impact.projection, vec![0.0; PROJECTION_MONTHS]);
    }

    #[test]
    fn test_no_churners_projection_is_flat() {
        let customers = vec![customer(40.0, false), customer(60.0, false)];
        let impact = RevenueImpact::from_customers(&customers);

        assert_eq!(impact.total_revenue, 100.0);
        assert_eq!(impact.lost_revenue, 0.0);
        assert!(impact.projection.iter().all(|&r| r == 100.0));
    }

    #[test]
    fn test_projection_is_non_increasing() {
        let customers = vec![
            customer(29.85, true),
            customer(56.95, false),
            customer(53.85, true),
            customer(42.30, false),
        ];
        let impact = RevenueImpact::from_customers(&customers);

        assert!((impact.lost_revenue - 83.70).abs() < 1e-9);
        assert!(impact.monthly_loss_rate > 0.0 && impact.monthly_loss_rate <= 1.0);
        assert!(impact.projection[0] < impact.total_revenue);
        for pair in impact.projection.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_everyone_churns() {
        let impact = RevenueImpact::from_customers(&[customer(80.0, true)]);
        assert_eq!(impact.monthly_loss_rate, 1.0);
        assert_eq!(impact.projection, vec![0.0; PROJECTION_MONTHS]);
    }

    #[test]
    fn test_projection_points_start_at_month_one() {
        let points = RevenueImpact::from_totals(200.0, 20.0).projection_points();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].0, 1);
        assert_eq!(points[5].0, 6);
    }
}
