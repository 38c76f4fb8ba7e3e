use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One company's reported (or expected) earnings for a given date.
///
/// Numeric fields are `None` when the company has not reported yet or
/// the provider lacks the figure; they are never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub symbol: String,
    pub company_name: String,
    pub report_date: NaiveDate,
    /// Quarter + year label, e.g. "Q4 2025".
    pub fiscal_period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_actual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_prior_year: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_actual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_prior_year: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub takeaways: Option<Vec<String>>,
}
