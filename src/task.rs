//! One workitem from search to report.

use crate::config::ScraperConfig;
use crate::download::ImageFetcher;
use crate::driver::BrowserDriver;
use crate::models::{FailureKind, SearchRequest, WorkItemOutcome};
use crate::outputs::table::write_report;
use crate::report::build_rows;
use crate::scrapers::pagination::PaginationController;
use crate::utils::minimum_publication_month;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Subdirectory of the output directory holding screenshots of bad results.
pub const EVIDENCE_DIR: &str = "evidence";

/// Path of the report for the workitem at zero-based `order`.
pub fn report_path(output_dir: &Path, order: usize) -> PathBuf {
    output_dir.join(format!("search_results_{order}.csv"))
}

/// Screenshot directory for the workitem at zero-based `order`.
pub fn evidence_dir(output_dir: &Path, order: usize) -> PathBuf {
    output_dir.join(EVIDENCE_DIR).join(format!("workitem_{order}"))
}

/// Failure outcome for a workitem, logged as it is built.
pub fn failure(kind: FailureKind, error: impl Display) -> WorkItemOutcome {
    let error = error.to_string();
    error!(?kind, %error, "Workitem failed");
    WorkItemOutcome::Error { kind, error }
}

/// Scrape the articles matching `request` and write their report.
///
/// Images are saved directly in `output_dir`, next to the report. `today`
/// anchors the recency cutoff.
///
/// # Errors
///
/// Any scrape failure (timeouts, a session error, a page that stays stale,
/// an aborting image download), an invalid report row, or an IO error
/// writing the report.
#[instrument(
    level = "info",
    skip(driver, images, config, request, output_dir),
    fields(query = %request.search_query, category = ?request.category, months = request.months)
)]
pub async fn scrape_to_report<D, F>(
    driver: &D,
    images: &F,
    config: &ScraperConfig,
    request: &SearchRequest,
    order: usize,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<WorkItemOutcome, Box<dyn Error>>
where
    D: BrowserDriver,
    F: ImageFetcher,
{
    let cutoff = minimum_publication_month(request.months, today);
    let evidence_dir = evidence_dir(output_dir, order);
    fs::create_dir_all(&evidence_dir).await?;

    let controller = PaginationController::new(
        driver,
        images,
        config,
        output_dir.to_path_buf(),
        evidence_dir,
        cutoff,
    );
    let (articles, _stats) = controller
        .run(&request.search_query, request.category.as_deref())
        .await?;

    let rows = build_rows(&articles, request)?;
    let path = report_path(output_dir, order);
    write_report(&path, &rows).await?;

    let image_files: Vec<String> = rows
        .iter()
        .filter_map(|row| row.picture_filename.clone())
        .collect();
    info!(rows = rows.len(), images = image_files.len(), report = %path.display(), "Workitem done");

    Ok(WorkItemOutcome::Success {
        report_path: path.display().to_string(),
        search_query: request.search_query.clone(),
        category: request.category.clone(),
        months: request.months,
        image_files,
    })
}

/// [`scrape_to_report`] in a session that is quit afterwards, whatever the outcome.
pub async fn scrape_in_session<D, F>(
    driver: D,
    images: &F,
    config: &ScraperConfig,
    request: &SearchRequest,
    order: usize,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<WorkItemOutcome, Box<dyn Error>>
where
    D: BrowserDriver,
    F: ImageFetcher,
{
    let result = scrape_to_report(&driver, images, config, request, order, output_dir, today).await;
    if let Err(e) = driver.quit().await {
        warn!(error = %e, "Failed to close the browser session");
    }
    result
}
