use chrono::NaiveDate;
use serde::Serialize;

use crate::models::EarningsRecord;

const COLOR_GREEN: u32 = 0x00FF00;
const COLOR_RED: u32 = 0xFF0000;
const COLOR_GRAY: u32 = 0x808080;
const COLOR_BLURPLE: u32 = 0x5865F2;

const FOOTER_TEXT: &str = "EarningsBot • Data from Financial Modeling Prep";

/// A rendered notification body, serialized the way the Discord
/// webhook API expects. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Actual-vs-estimate classification for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surprise {
    Beat,
    Met,
    Miss,
    /// Either operand is absent; no comparison is possible.
    Unknown,
}

impl Surprise {
    pub fn classify(actual: Option<f64>, estimate: Option<f64>) -> Self {
        match (actual, estimate) {
            (Some(a), Some(e)) if a > e => Self::Beat,
            (Some(a), Some(e)) if a < e => Self::Miss,
            (Some(_), Some(_)) => Self::Met,
            _ => Self::Unknown,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Beat => "✅",
            Self::Miss => "❌",
            Self::Met | Self::Unknown => "➖",
        }
    }
}

/// Year-over-year percentage change, `None` when either operand is
/// absent or the prior-year figure is zero.
pub fn yoy_change(actual: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (actual, prior) = (actual?, prior?);
    if prior == 0.0 {
        return None;
    }
    Some((actual - prior) / prior.abs() * 100.0)
}

fn yoy_suffix(actual: Option<f64>, prior: Option<f64>) -> String {
    match yoy_change(actual, prior) {
        Some(change) => {
            let arrow = if change > 0.0 {
                "📈"
            } else if change < 0.0 {
                "📉"
            } else {
                "➡️"
            };
            format!(" {} {:+.1}% YoY", arrow, change)
        }
        None => String::new(),
    }
}

/// Format a dollar amount with a magnitude suffix (K/M/B) at two
/// decimals, sign and currency symbol prefixed.
pub fn format_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{sign}${:.2}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.2}K", abs / 1_000.0)
    } else {
        format!("{sign}${:.2}", abs)
    }
}

fn format_eps(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn format_money_opt(value: Option<f64>) -> String {
    value.map(format_money).unwrap_or_else(|| "N/A".to_string())
}

fn format_eps_opt(value: Option<f64>) -> String {
    value.map(format_eps).unwrap_or_else(|| "N/A".to_string())
}

/// Build the notification embed for one earnings record.
///
/// Revenue and EPS lines always render, with absent actuals shown as
/// N/A; the guidance and takeaways fields are omitted entirely when
/// there is nothing to show.
pub fn earnings_embed(record: &EarningsRecord) -> Embed {
    let revenue = Surprise::classify(record.revenue_actual, record.revenue_estimate);
    let eps = Surprise::classify(record.eps_actual, record.eps_estimate);

    let beats = [revenue, eps]
        .iter()
        .filter(|s| **s == Surprise::Beat)
        .count();
    let misses = [revenue, eps]
        .iter()
        .filter(|s| **s == Surprise::Miss)
        .count();
    let color = if beats > misses {
        COLOR_GREEN
    } else if misses > beats {
        COLOR_RED
    } else {
        COLOR_GRAY
    };

    let mut fields = Vec::new();

    let revenue_est = record
        .revenue_estimate
        .map(|v| format!(" (Est: {})", format_money(v)))
        .unwrap_or_default();
    fields.push(EmbedField {
        name: "💰 Revenue".to_string(),
        value: format!(
            "{}{} {}{}",
            format_money_opt(record.revenue_actual),
            revenue_est,
            revenue.emoji(),
            yoy_suffix(record.revenue_actual, record.revenue_prior_year),
        ),
        inline: true,
    });

    let eps_est = record
        .eps_estimate
        .map(|v| format!(" (Est: {})", format_eps(v)))
        .unwrap_or_default();
    fields.push(EmbedField {
        name: "📊 EPS".to_string(),
        value: format!(
            "{}{} {}{}",
            format_eps_opt(record.eps_actual),
            eps_est,
            eps.emoji(),
            yoy_suffix(record.eps_actual, record.eps_prior_year),
        ),
        inline: true,
    });

    if let Some(guidance) = record.guidance.as_deref().filter(|g| !g.trim().is_empty()) {
        fields.push(EmbedField {
            name: "🔮 Guidance".to_string(),
            value: guidance.to_string(),
            inline: false,
        });
    }

    if let Some(takeaways) = record.takeaways.as_deref().filter(|t| !t.is_empty()) {
        let text = takeaways
            .iter()
            .map(|t| format!("• {t}"))
            .collect::<Vec<_>>()
            .join("\n");
        fields.push(EmbedField {
            name: "📌 Key Takeaways".to_string(),
            value: text,
            inline: false,
        });
    }

    Embed {
        title: format!("📈 {} {} Earnings", record.symbol, record.fiscal_period),
        description: format!("**{}**", record.company_name),
        color,
        fields,
        footer: Some(EmbedFooter {
            text: FOOTER_TEXT.to_string(),
        }),
    }
}

/// Digest header, prepended when more than one watched company reported.
pub fn summary_embed(total: usize, beats: usize, misses: usize) -> Embed {
    Embed {
        title: "📋 Daily Earnings Summary".to_string(),
        description: format!("**{}** companies in your watchlist reported earnings", total),
        color: COLOR_BLURPLE,
        fields: vec![
            EmbedField {
                name: "✅ Beats".to_string(),
                value: beats.to_string(),
                inline: true,
            },
            EmbedField {
                name: "❌ Misses".to_string(),
                value: misses.to_string(),
                inline: true,
            },
        ],
        footer: None,
    }
}

/// Informational embed for a date with zero watchlist matches. This is
/// an expected outcome, not an error.
pub fn no_earnings_embed(date: NaiveDate) -> Embed {
    Embed {
        title: "📋 Daily Earnings Update".to_string(),
        description: format!(
            "No companies in your watchlist reported earnings on {}.",
            date.format("%Y-%m-%d")
        ),
        color: COLOR_GRAY,
        fields: Vec::new(),
        footer: None,
    }
}
