//! Static retention recommendations shown on the action plan view

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub insight: &'static str,
    pub action: &'static str,
}

pub const RECOMMENDATIONS: [Recommendation; 3] = [
    Recommendation {
        title: "Focus on Short-Term Contracts",
        insight: "Customers on month-to-month contracts (`Month-to-month`) show the highest churn rate.",
        action: "Run marketing campaigns that encourage migration to one- or two-year plans, \
                 offering progressive discounts or exclusive benefits (e.g. a free streaming service).",
    },
    Recommendation {
        title: "Strengthen Support and Security Services",
        insight: "Lacking services such as Tech Support (`TechSupport`) and Online Security \
                  (`OnlineSecurity`) is a strong churn indicator.",
        action: "Build a \"value bundle\" with these services and offer it proactively to customers \
                 who do not have them, possibly with a free trial period to demonstrate its value.",
    },
    Recommendation {
        title: "Onboarding Program for New Customers",
        insight: "Churn is significantly higher during the first 12 months of the contract.",
        action: "Run a robust onboarding program over the first 3 months: proactive contact from \
                 the customer success team, tutorials on using the services, and personalised \
                 offers that raise early engagement.",
    },
];
