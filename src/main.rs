//! # LA Times Scraper
//!
//! A workitem-driven scraper that searches the Los Angeles Times website,
//! collects the articles published within a number of recent months, saves
//! their images, and reports them as a CSV table.
//!
//! ## Features
//!
//! - Drives a real browser through a WebDriver server (chromedriver)
//! - Optional topic filter and newest-first ordering of the results
//! - Stops paginating at the first article older than the requested window
//! - Recovers from result lists that re-render while being read
//! - Counts search phrase occurrences and flags mentions of money
//!
//! ## Usage
//!
//! ```sh
//! chromedriver --port=9515 &
//! latimes_scraper -i work.json -o ./output
//! ```
//!
//! ## Architecture
//!
//! For each workitem payload, in order:
//! 1. **Validation**: malformed payloads become business failures
//! 2. **Scraping**: a fresh browser session runs the pagination state machine
//! 3. **Report**: one CSV per workitem plus the downloaded images
//! 4. **Outcome**: success or failure is recorded in `workitems_output.json`

use chrono::Utc;
use clap::Parser;
use serde_json::Value;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod download;
mod driver;
mod error;
mod models;
mod outputs;
mod report;
mod scrapers;
mod task;
mod utils;
mod workitems;

use cli::Cli;
use config::ScraperConfig;
use download::{HttpImageFetcher, RetryFetch};
use driver::webdriver::WebDriverSession;
use models::{FailureKind, WorkItemOutcome};
use outputs::json;
use task::{failure, scrape_in_session};
use utils::ensure_writable_dir;
use workitems::{load_payloads, validate_payload};

/// Browser-like user agent for image downloads.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("latimes_scraper starting up");

    let args = Cli::parse();
    debug!(?args.input, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let config = match &args.config {
        Some(path) => ScraperConfig::load(path).await?,
        None => {
            info!("No configuration file given; using defaults");
            ScraperConfig::default()
        }
    };

    let payloads = match load_payloads(&args.input).await {
        Ok(payloads) => payloads,
        Err(e) => {
            error!(path = %args.input.display(), error = %e, "Could not read workitems");
            return Err(e);
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Could not build the image HTTP client; using defaults");
            reqwest::Client::new()
        });
    let images = RetryFetch::new(
        HttpImageFetcher::new(client),
        config.download_retries,
        config.download_base_delay(),
    );

    let mut outcomes = Vec::with_capacity(payloads.len());
    for (order, payload) in payloads.iter().enumerate() {
        let outcome = process_workitem(&args, &config, &images, order, payload).await;
        outcomes.push(outcome);
    }

    let succeeded = outcomes
        .iter()
        .filter(|o| matches!(o, WorkItemOutcome::Success { .. }))
        .count();
    let path = json::write_outcomes(&outcomes, &args.output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        total = outcomes.len(),
        succeeded,
        failed = outcomes.len() - succeeded,
        outcomes = %path.display(),
        "Execution complete"
    );

    Ok(())
}

/// Validate one payload and scrape it in its own browser session.
///
/// Never fails: every problem becomes an error outcome so the remaining
/// workitems still run.
#[instrument(level = "info", skip(args, config, images, payload))]
async fn process_workitem(
    args: &Cli,
    config: &ScraperConfig,
    images: &RetryFetch<HttpImageFetcher>,
    order: usize,
    payload: &Value,
) -> WorkItemOutcome {
    let request = match validate_payload(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(%payload, "Invalid workitem payload");
            return failure(FailureKind::Business, e);
        }
    };

    let session = match WebDriverSession::connect(
        &args.webdriver_url,
        args.headless,
        config.poll_interval(),
    )
    .await
    {
        Ok(session) => session,
        Err(e) => return failure(FailureKind::Application, e),
    };

    scrape_in_session(
        session,
        images,
        config,
        &request,
        order,
        &args.output_dir,
        Utc::now().date_naive(),
    )
    .await
    .unwrap_or_else(|e| failure(FailureKind::Application, e))
}
