use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::EarningsRecord;

use super::{EarningsClient, FetchError};

/// One entry of the provider's earnings-calendar payload. Field names
/// follow the provider's camelCase wire format; everything beyond the
/// symbol and date may be absent.
#[derive(Debug, Deserialize)]
struct ApiEarning {
    symbol: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, alias = "name", alias = "companyName")]
    company_name: Option<String>,
    #[serde(default, alias = "epsActual")]
    eps_actual: Option<f64>,
    #[serde(default, alias = "epsEstimated", alias = "epsEstimate")]
    eps_estimate: Option<f64>,
    #[serde(default, alias = "revenueActual")]
    revenue_actual: Option<f64>,
    #[serde(default, alias = "revenueEstimated", alias = "revenueEstimate")]
    revenue_estimate: Option<f64>,
    #[serde(default, alias = "revenuePriorYear", alias = "priorYearRevenue")]
    revenue_prior_year: Option<f64>,
    #[serde(default, alias = "epsPriorYear", alias = "priorYearEps")]
    eps_prior_year: Option<f64>,
}

impl EarningsClient {
    /// Fetch all companies reporting earnings on `date`.
    ///
    /// One outbound request per invocation; the whole day's calendar is
    /// batched into a single response. Failures are not retried.
    pub async fn fetch_calendar(&self, date: NaiveDate) -> Result<Vec<EarningsRecord>, FetchError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        info!("Fetching earnings calendar for {}", date_str);

        let resp = self
            .http
            .get(format!("{}/earnings-calendar", self.base_url))
            .query(&[
                ("from", date_str.as_str()),
                ("to", date_str.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Earnings calendar request failed: {}", e);
                FetchError::Network(e)
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!("Earnings API rejected the credential with status {}", status);
            return Err(FetchError::Unauthorized(status));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Earnings API rate limit hit");
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unable to read body".to_string());
            warn!("Earnings API returned error status {}: {}", status, body);
            return Err(FetchError::Status { status, body });
        }

        let raw = resp.bytes().await.map_err(|e| {
            warn!("Failed to read earnings calendar body: {}", e);
            FetchError::Network(e)
        })?;

        let entries: Vec<ApiEarning> = serde_json::from_slice(&raw).map_err(|e| {
            let preview = String::from_utf8_lossy(&raw[..raw.len().min(500)]);
            warn!(
                "Failed to parse earnings calendar: {}; body preview: {}",
                e, preview
            );
            FetchError::Malformed(e.to_string())
        })?;

        let records: Vec<EarningsRecord> = entries
            .into_iter()
            .map(|entry| normalize(entry, date))
            .collect();

        info!("Fetched {} earnings reports for {}", records.len(), date_str);
        Ok(records)
    }
}

fn normalize(entry: ApiEarning, fallback_date: NaiveDate) -> EarningsRecord {
    let report_date = entry
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or(fallback_date);

    let symbol = entry.symbol.to_uppercase();
    let company_name = entry
        .company_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| symbol.clone());

    EarningsRecord {
        fiscal_period: fiscal_period_for(report_date),
        symbol,
        company_name,
        report_date,
        revenue_actual: entry.revenue_actual,
        revenue_estimate: entry.revenue_estimate,
        revenue_prior_year: entry.revenue_prior_year,
        eps_actual: entry.eps_actual,
        eps_estimate: entry.eps_estimate,
        eps_prior_year: entry.eps_prior_year,
        guidance: None,
        takeaways: None,
    }
}

/// Fiscal quarter covered by a report announced on `date`.
///
/// Announcements run roughly one quarter behind the period they cover:
/// January–February announcements report Q4 of the prior year, March–May
/// report Q1, June–August Q2, September–November Q3, December Q4.
pub fn fiscal_quarter_for(date: NaiveDate) -> (u32, i32) {
    match date.month() {
        1..=2 => (4, date.year() - 1),
        3..=5 => (1, date.year()),
        6..=8 => (2, date.year()),
        9..=11 => (3, date.year()),
        _ => (4, date.year()),
    }
}

pub fn fiscal_period_for(date: NaiveDate) -> String {
    let (quarter, year) = fiscal_quarter_for(date);
    format!("Q{} {}", quarter, year)
}
