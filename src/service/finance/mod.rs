use reqwest::StatusCode;

use crate::config::Config;

pub mod earnings;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("earnings request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("earnings api rejected the credential (status {0})")]
    Unauthorized(StatusCode),
    #[error("earnings api rate limit exceeded")]
    RateLimited,
    #[error("earnings api status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("earnings response parse failed: {0}")]
    Malformed(String),
}

/// Client for the earnings-calendar endpoint of the data provider.
pub struct EarningsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EarningsClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.earnings_api_url.trim_end_matches('/').to_string(),
            api_key: config.fmp_api_key.clone(),
        })
    }
}
