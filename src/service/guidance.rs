use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;

/// Client for the Perplexity chat-completions API, used to summarize
/// forward guidance and key takeaways from recent coverage of a report.
///
/// Enrichment is best-effort: every failure degrades to `None`, since a
/// digest without guidance is still a valid digest.
pub struct GuidanceClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl GuidanceClient {
    /// Build a client when a Perplexity key is configured, `None`
    /// otherwise.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.perplexity_api_key.clone()?;
        let http = match reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!("guidance client setup failed: {}", e);
                return None;
            }
        };

        Some(Self {
            http,
            url: config.perplexity_api_url.clone(),
            api_key,
        })
    }

    /// One-to-two sentence forward guidance summary, or `None` when the
    /// report carried no guidance or the lookup failed.
    pub async fn fetch_guidance(&self, symbol: &str, quarter: u32, year: i32) -> Option<String> {
        info!("Fetching guidance for {}", symbol);
        let prompt = format!(
            "What is {symbol}'s forward guidance from their Q{quarter} {year} earnings report?\n\n\
             Focus on: revenue guidance, EPS guidance, growth expectations, or outlook for next quarter/year.\n\
             Return ONLY a concise 1-2 sentence summary of the guidance. No preamble or explanation.\n\
             If no specific guidance was provided, respond with exactly: NO_GUIDANCE"
        );

        let content = self.complete(symbol, &prompt, 150).await?;
        let guidance = strip_citations(&content);
        if guidance.is_empty() || guidance.to_uppercase().contains("NO_GUIDANCE") {
            return None;
        }
        Some(guidance)
    }

    /// Up to three one-sentence highlights from the report, or `None`.
    pub async fn fetch_takeaways(
        &self,
        symbol: &str,
        quarter: u32,
        year: i32,
    ) -> Option<Vec<String>> {
        info!("Fetching takeaways for {}", symbol);
        let prompt = format!(
            "What are the 3 most important takeaways from {symbol}'s Q{quarter} {year} earnings report?\n\n\
             Focus on: significant business developments, growth metrics, challenges, strategic initiatives, or notable commentary.\n\
             Return ONLY 3 bullet points, each 1 sentence. No preamble, numbering, or explanation.\n\
             Format exactly like:\n\
             • First takeaway\n\
             • Second takeaway\n\
             • Third takeaway"
        );

        let content = self.complete(symbol, &prompt, 250).await?;
        let takeaways = parse_takeaways(&content);
        if takeaways.is_empty() {
            None
        } else {
            Some(takeaways)
        }
    }

    async fn complete(&self, symbol: &str, prompt: &str, max_tokens: u32) -> Option<String> {
        let payload = json!({
            "model": "sonar",
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": max_tokens,
        });

        let resp = match self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("guidance request failed for {}: {}", symbol, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!("guidance api status {} for {}", resp.status(), symbol);
            return None;
        }

        let parsed: ChatResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("guidance response parse failed for {}: {}", symbol, e);
                return None;
            }
        };

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

fn parse_takeaways(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('•') || line.starts_with('-') || line.starts_with('*'))
        .map(|line| strip_citations(line.trim_start_matches(['•', '-', '*', ' '])))
        .filter(|t| !t.is_empty())
        .take(3)
        .collect()
}

/// Drop citation markers like `[1]` or `[2][3]` left by the search model.
fn strip_citations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '[' {
            let mut digits = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() {
                    digits.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if !digits.is_empty() && chars.peek() == Some(&']') {
                chars.next();
                continue;
            }
            out.push(ch);
            out.push_str(&digits);
        } else {
            out.push(ch);
        }
    }
    out.trim().to_string()
}
