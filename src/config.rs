use std::env;
use std::time::Duration;

use chrono_tz::Tz;

/// Built-in watchlist, used when `WATCHLIST` is not set.
pub const DEFAULT_WATCHLIST: &[&str] = &[
    // SaaS & Cloud
    "ASAN", "DOCN", "DOCS", "HUBS", "MNDY", "CRWD", "DDOG", "NET", "S",
    // E-commerce & Marketplaces
    "MELI", "SHOP", "SE", "CPNG", "GRAB", "FVRR", "ABNB", "AMZN",
    // Fintech & Payments
    "OTCM", "DLO", "STNE", "NU", "ADYEY", "FOUR", "LMND", "NDAQ",
    // Advertising & Media
    "PUBM", "TTD", "PERI", "ROKU", "META", "GOOG",
    // Consumer & Lifestyle
    "DUOL", "DCBO", "HIMS", "LULU", "DECK",
    // Global & Emerging
    "GLBE", "BOC", "HESAF", "ESLOY", "BYDDY",
    // Tech & Hardware
    "KNSL", "TSLA", "ASML", "MU", "ENPH",
    // Healthcare & Specialty
    "MEDP", "TMDX", "RACE",
];

const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_EARNINGS_API_URL: &str = "https://financialmodelingprep.com/stable";
const DEFAULT_PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RUN_DEADLINE_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),
    #[error("DISCORD_WEBHOOK_URL environment variable not set")]
    MissingWebhookUrl,
    #[error("watchlist is empty")]
    EmptyWatchlist,
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),
    #[error("invalid value for {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Process-wide configuration, loaded once at startup and passed by
/// reference into each component. Values are never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered set of upper-cased ticker symbols to report on.
    pub watchlist: Vec<String>,
    /// Timezone used to resolve "today" in normal mode.
    pub timezone: Tz,
    pub fmp_api_key: String,
    pub earnings_api_url: String,
    /// Absent only in dry-run invocations.
    pub webhook_url: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub perplexity_api_url: String,
    /// Per-request timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
    /// Elapsed-time budget for the whole run; deliveries still pending
    /// when it expires are skipped and reported.
    pub run_deadline: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let fmp_api_key = require_var("FMP_API_KEY")?;

        let watchlist = match non_empty_var("WATCHLIST") {
            Some(raw) => parse_watchlist(&raw),
            None => DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
        };
        if watchlist.is_empty() {
            return Err(ConfigError::EmptyWatchlist);
        }

        let tz_name = non_empty_var("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(tz_name))?;

        let http_timeout = Duration::from_secs(secs_var(
            "HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let run_deadline = Duration::from_secs(secs_var(
            "RUN_DEADLINE_SECS",
            DEFAULT_RUN_DEADLINE_SECS,
        )?);

        Ok(Self {
            watchlist,
            timezone,
            fmp_api_key,
            earnings_api_url: non_empty_var("EARNINGS_API_URL")
                .unwrap_or_else(|| DEFAULT_EARNINGS_API_URL.to_string()),
            webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
            perplexity_api_key: non_empty_var("PERPLEXITY_API_KEY"),
            perplexity_api_url: non_empty_var("PERPLEXITY_API_URL")
                .unwrap_or_else(|| DEFAULT_PERPLEXITY_API_URL.to_string()),
            http_timeout,
            run_deadline,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    non_empty_var(name).ok_or(ConfigError::MissingVar(name))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
            var: name,
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchlist_parsing_uppercases_and_drops_blanks() {
        let parsed = parse_watchlist("aapl, msft,,  nflx ,");
        assert_eq!(parsed, vec!["AAPL", "MSFT", "NFLX"]);
    }

    #[test]
    fn default_watchlist_is_already_normalized() {
        for symbol in DEFAULT_WATCHLIST {
            assert_eq!(symbol.to_uppercase(), *symbol);
            assert!(!symbol.is_empty());
        }
    }
}
