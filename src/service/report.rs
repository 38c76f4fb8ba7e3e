use std::collections::HashSet;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::models::EarningsRecord;
use crate::service::discord::{self, Embed, Surprise, WebhookClient};
use crate::service::finance::earnings::{fiscal_period_for, fiscal_quarter_for};
use crate::service::finance::{EarningsClient, FetchError};
use crate::service::guidance::GuidanceClient;

/// How a single invocation resolves its target date and whether it
/// delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Today's calendar in the configured timezone.
    Normal,
    /// Fetch and format, but do not deliver.
    DryRun(Option<NaiveDate>),
    /// Synthetic fixture records, delivered.
    Test,
    /// Caller-supplied calendar date.
    Explicit(NaiveDate),
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("webhook client setup failed: {0}")]
    Delivery(#[from] discord::DeliveryError),
}

/// Outcome of one invocation. Delivery failures are aggregated here
/// rather than aborting the run; the caller decides the exit status.
#[derive(Debug)]
pub struct RunReport {
    pub target_date: NaiveDate,
    /// Watched companies that reported on the target date.
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Deliveries skipped because the run deadline expired.
    pub cut_short: usize,
}

impl RunReport {
    pub fn all_delivered(&self) -> bool {
        self.failed == 0 && self.cut_short == 0
    }
}

/// Keep only records whose symbol is on the watchlist, preserving fetch
/// order. Pure; empty records or an empty watchlist yield an empty
/// result.
pub fn filter_watched(records: Vec<EarningsRecord>, watchlist: &[String]) -> Vec<EarningsRecord> {
    let watched: HashSet<&str> = watchlist.iter().map(String::as_str).collect();
    records
        .into_iter()
        .filter(|r| watched.contains(r.symbol.to_uppercase().as_str()))
        .collect()
}

/// Run one fetch → filter → format → deliver pass.
///
/// A fetch failure aborts the run; a delivery failure is counted and
/// the remaining messages are still attempted.
pub async fn run(config: &Config, mode: Mode) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let dry_run = matches!(mode, Mode::DryRun(_));

    // Validate the delivery target before any network call.
    let webhook = if dry_run {
        None
    } else {
        let url = config
            .webhook_url
            .as_deref()
            .ok_or(ConfigError::MissingWebhookUrl)?;
        Some(WebhookClient::new(url, config.http_timeout)?)
    };

    let target_date = resolve_date(config, mode);
    info!("Checking earnings for {}", target_date);

    let records = if mode == Mode::Test {
        test_fixture(target_date)
    } else {
        let client = EarningsClient::new(config)?;
        client.fetch_calendar(target_date).await?
    };
    info!("Found {} total earnings reports", records.len());

    // The fixture is posted as-is; it exercises formatting and delivery
    // regardless of the configured watchlist.
    let mut watched = if mode == Mode::Test {
        records
    } else {
        filter_watched(records, &config.watchlist)
    };
    info!("Found {} watched companies", watched.len());

    if mode != Mode::Test {
        if let Some(guidance) = GuidanceClient::from_config(config) {
            enrich_with_guidance(&guidance, &mut watched).await;
        }
    }

    let embeds = build_embeds(&watched, target_date);

    let mut report = RunReport {
        target_date,
        matched: watched.len(),
        delivered: 0,
        failed: 0,
        cut_short: 0,
    };

    let Some(webhook) = webhook else {
        for embed in &embeds {
            info!("[dry-run] would deliver '{}'", embed.title);
        }
        return Ok(report);
    };

    for embed in &embeds {
        if started.elapsed() >= config.run_deadline {
            report.cut_short = embeds.len() - report.delivered - report.failed;
            warn!(
                "Run deadline exceeded; skipping {} remaining deliveries",
                report.cut_short
            );
            break;
        }
        match webhook.deliver(embed).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("Delivery failed for '{}': {}", embed.title, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Run finished: {} delivered, {} failed, {} skipped",
        report.delivered, report.failed, report.cut_short
    );
    Ok(report)
}

/// Target-date priority: explicit override, then the fixture date, then
/// today in the configured timezone.
fn resolve_date(config: &Config, mode: Mode) -> NaiveDate {
    match mode {
        Mode::Explicit(date) | Mode::DryRun(Some(date)) => date,
        Mode::Normal | Mode::DryRun(None) | Mode::Test => {
            Utc::now().with_timezone(&config.timezone).date_naive()
        }
    }
}

async fn enrich_with_guidance(client: &GuidanceClient, records: &mut [EarningsRecord]) {
    for record in records.iter_mut() {
        let (quarter, year) = fiscal_quarter_for(record.report_date);
        record.guidance = client.fetch_guidance(&record.symbol, quarter, year).await;
        record.takeaways = client.fetch_takeaways(&record.symbol, quarter, year).await;
    }
}

/// One embed per record, a summary header when more than one company
/// reported, or the single informational embed when nothing matched.
fn build_embeds(watched: &[EarningsRecord], date: NaiveDate) -> Vec<Embed> {
    if watched.is_empty() {
        return vec![discord::no_earnings_embed(date)];
    }

    let mut embeds: Vec<Embed> = watched.iter().map(discord::earnings_embed).collect();

    if embeds.len() > 1 {
        let beats = watched
            .iter()
            .filter(|r| Surprise::classify(r.eps_actual, r.eps_estimate) == Surprise::Beat)
            .count();
        let misses = watched
            .iter()
            .filter(|r| Surprise::classify(r.eps_actual, r.eps_estimate) == Surprise::Miss)
            .count();
        embeds.insert(0, discord::summary_embed(watched.len(), beats, misses));
    }

    embeds
}

/// Synthetic records mirroring well-known prints, used to exercise
/// formatting and delivery without touching the data provider.
fn test_fixture(date: NaiveDate) -> Vec<EarningsRecord> {
    let period = fiscal_period_for(date);
    vec![
        EarningsRecord {
            symbol: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            report_date: date,
            fiscal_period: period.clone(),
            revenue_actual: Some(94_930_000_000.0),
            revenue_estimate: Some(94_500_000_000.0),
            revenue_prior_year: Some(89_500_000_000.0),
            eps_actual: Some(1.64),
            eps_estimate: Some(1.60),
            eps_prior_year: Some(1.46),
            guidance: Some("Q1 2026 revenue expected between $118B-$122B".to_string()),
            takeaways: None,
        },
        EarningsRecord {
            symbol: "MSFT".to_string(),
            company_name: "Microsoft Corporation".to_string(),
            report_date: date,
            fiscal_period: period.clone(),
            revenue_actual: Some(62_020_000_000.0),
            revenue_estimate: Some(61_500_000_000.0),
            revenue_prior_year: Some(56_200_000_000.0),
            eps_actual: Some(2.93),
            eps_estimate: Some(2.89),
            eps_prior_year: Some(2.69),
            guidance: None,
            takeaways: None,
        },
        EarningsRecord {
            symbol: "NFLX".to_string(),
            company_name: "Netflix, Inc.".to_string(),
            report_date: date,
            fiscal_period: period,
            revenue_actual: Some(9_370_000_000.0),
            revenue_estimate: Some(9_500_000_000.0),
            revenue_prior_year: Some(8_830_000_000.0),
            eps_actual: Some(4.11),
            eps_estimate: Some(4.45),
            eps_prior_year: Some(3.89),
            guidance: Some("Q1 2026 subscriber growth to slow".to_string()),
            takeaways: None,
        },
    ]
}
