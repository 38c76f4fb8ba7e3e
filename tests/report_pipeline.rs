use std::time::Duration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;

use earnings_bot::config::Config;
use earnings_bot::service::finance::FetchError;
use earnings_bot::service::report::{run, Mode, RunError};

const TARGET: &str = "2025-10-30";

fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 30).unwrap()
}

fn test_config(provider: &MockServer, webhook_url: Option<String>, watchlist: &[&str]) -> Config {
    Config {
        watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
        timezone: chrono_tz::America::New_York,
        fmp_api_key: "test-key".to_string(),
        earnings_api_url: provider.base_url(),
        webhook_url,
        perplexity_api_key: None,
        perplexity_api_url: "http://127.0.0.1:1/unused".to_string(),
        http_timeout: Duration::from_secs(5),
        run_deadline: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn watched_beat_is_delivered_once() {
    let provider = MockServer::start_async().await;
    let webhook = MockServer::start_async().await;

    let calendar = provider
        .mock_async(|when, then| {
            when.method(GET)
                .path("/earnings-calendar")
                .query_param("from", TARGET)
                .query_param("to", TARGET)
                .query_param("apikey", "test-key");
            then.status(200).json_body(json!([
                {
                    "symbol": "AAPL",
                    "date": TARGET,
                    "name": "Apple Inc.",
                    "epsActual": 1.64,
                    "epsEstimated": 1.60,
                    "revenueActual": 94_930_000_000.0,
                    "revenueEstimated": 94_500_000_000.0,
                    "priorYearRevenue": 89_500_000_000.0,
                    "priorYearEps": 1.46
                },
                {
                    "symbol": "ZZZZ",
                    "date": TARGET,
                    "epsActual": 0.10,
                    "epsEstimated": 0.20
                }
            ]));
        })
        .await;

    let post = webhook
        .mock_async(|when, then| {
            when.method(POST)
                .path("/hook")
                .body_includes("$94.93B")
                .body_includes("✅");
            then.status(204);
        })
        .await;

    let config = test_config(&provider, Some(webhook.url("/hook")), &["AAPL"]);
    let report = run(&config, Mode::Explicit(target_date())).await.unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
    assert!(report.all_delivered());
    calendar.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn empty_day_posts_one_informational_message() {
    let provider = MockServer::start_async().await;
    let webhook = MockServer::start_async().await;

    provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).json_body(json!([]));
        })
        .await;

    let post = webhook
        .mock_async(|when, then| {
            when.method(POST)
                .path("/hook")
                .body_includes("No companies in your watchlist")
                .body_includes(TARGET);
            then.status(204);
        })
        .await;

    let config = test_config(&provider, Some(webhook.url("/hook")), &["AAPL"]);
    let report = run(&config, Mode::Explicit(target_date())).await.unwrap();

    assert_eq!(report.matched, 0);
    assert_eq!(report.delivered, 1);
    assert!(report.all_delivered());
    post.assert_async().await;
}

#[tokio::test]
async fn auth_failure_aborts_before_any_delivery() {
    let provider = MockServer::start_async().await;
    let webhook = MockServer::start_async().await;

    provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(401).body("Invalid API key");
        })
        .await;

    let post = webhook
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(204);
        })
        .await;

    let config = test_config(&provider, Some(webhook.url("/hook")), &["AAPL"]);
    let err = run(&config, Mode::Explicit(target_date()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Fetch(FetchError::Unauthorized(_))
    ));
    post.assert_hits_async(0).await;
}

#[tokio::test]
async fn malformed_body_is_a_fetch_error() {
    let provider = MockServer::start_async().await;

    provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let config = test_config(&provider, Some("http://127.0.0.1:1/hook".to_string()), &["AAPL"]);
    let err = run(&config, Mode::Explicit(target_date()))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Fetch(FetchError::Malformed(_))));
}

#[tokio::test]
async fn failed_delivery_does_not_abort_the_rest() {
    let provider = MockServer::start_async().await;
    let webhook = MockServer::start_async().await;

    provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).json_body(json!([
                { "symbol": "AAPL", "date": TARGET, "epsActual": 1.64, "epsEstimated": 1.60 },
                { "symbol": "MSFT", "date": TARGET, "epsActual": 2.93, "epsEstimated": 2.89 }
            ]));
        })
        .await;

    let post = webhook
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(500).body("boom");
        })
        .await;

    let config = test_config(&provider, Some(webhook.url("/hook")), &["AAPL", "MSFT"]);
    let report = run(&config, Mode::Explicit(target_date())).await.unwrap();

    // Two records plus the summary header; every delivery is attempted
    // even though each one fails.
    assert_eq!(report.matched, 2);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 3);
    assert!(!report.all_delivered());
    post.assert_hits_async(3).await;
}

#[tokio::test]
async fn dry_run_never_touches_the_webhook() {
    let provider = MockServer::start_async().await;

    let calendar = provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).json_body(json!([
                { "symbol": "AAPL", "date": TARGET, "epsActual": 1.64, "epsEstimated": 1.60 }
            ]));
        })
        .await;

    // No webhook configured at all; a dry run must not need one.
    let config = test_config(&provider, None, &["AAPL"]);
    let report = run(&config, Mode::DryRun(Some(target_date())))
        .await
        .unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(report.delivered, 0);
    assert!(report.all_delivered());
    calendar.assert_async().await;
}

#[tokio::test]
async fn missing_webhook_fails_before_fetching() {
    let provider = MockServer::start_async().await;

    let calendar = provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).json_body(json!([]));
        })
        .await;

    let config = test_config(&provider, None, &["AAPL"]);
    let err = run(&config, Mode::Explicit(target_date()))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Config(_)));
    calendar.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_mode_delivers_the_fixture_without_the_provider() {
    let provider = MockServer::start_async().await;
    let webhook = MockServer::start_async().await;

    let calendar = provider
        .mock_async(|when, then| {
            when.method(GET).path("/earnings-calendar");
            then.status(200).json_body(json!([]));
        })
        .await;

    let post = webhook
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(204);
        })
        .await;

    let config = test_config(&provider, Some(webhook.url("/hook")), &["AAPL"]);
    let report = run(&config, Mode::Test).await.unwrap();

    // Three fixture records plus the summary header.
    assert_eq!(report.matched, 3);
    assert_eq!(report.delivered, 4);
    assert!(report.all_delivered());
    calendar.assert_hits_async(0).await;
    post.assert_hits_async(4).await;
}
