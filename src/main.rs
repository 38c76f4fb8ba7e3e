use std::env;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use dotenv::dotenv;
use tracing::info;

use earnings_bot::config::Config;
use earnings_bot::service::report::{self, Mode};

const USAGE: &str = "\
earnings-bot - daily Discord earnings digest

USAGE:
    earnings-bot [OPTIONS]

OPTIONS:
    --date YYYY-MM-DD   Report on a specific calendar date
    --dry-run           Fetch and format but do not deliver
    --test              Post synthetic sample data
    -h, --help          Print this help
";

fn parse_mode(args: &[String]) -> Result<Mode> {
    let mut date = None;
    let mut dry_run = false;
    let mut test = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--date" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--date requires a value (YYYY-MM-DD)"))?;
                let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("invalid --date '{}': {}", value, e))?;
                date = Some(parsed);
            }
            "--dry-run" => dry_run = true,
            "--test" => test = true,
            "--help" | "-h" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'\n\n{}", other, USAGE),
        }
    }

    if test && (dry_run || date.is_some()) {
        bail!("--test cannot be combined with --date or --dry-run");
    }

    Ok(if test {
        Mode::Test
    } else if dry_run {
        Mode::DryRun(date)
    } else if let Some(date) = date {
        Mode::Explicit(date)
    } else {
        Mode::Normal
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mode = parse_mode(&args)?;

    let config = Config::from_env()?;
    let report = report::run(&config, mode).await?;

    if report.matched == 0 {
        info!(
            "No watched companies reported earnings on {}",
            report.target_date
        );
    }

    if !report.all_delivered() {
        bail!(
            "{} of {} deliveries did not complete ({} failed, {} skipped)",
            report.failed + report.cut_short,
            report.delivered + report.failed + report.cut_short,
            report.failed,
            report.cut_short
        );
    }

    Ok(())
}
