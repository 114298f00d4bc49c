//! Fetches the result items currently on screen.

use crate::config::ScraperConfig;
use crate::driver::BrowserDriver;
use crate::error::DriverError;
use tracing::{debug, instrument};

/// One look at the result list.
#[derive(Debug)]
pub enum Batch<E> {
    /// Every item was attached to the page when checked.
    Clean(Vec<E>),
    /// At least one item went stale before it could be parsed.
    Stale,
}

/// Wait for the result items and check that none of them is already stale.
///
/// A stale item means the list re-rendered under us, so the whole batch is
/// discarded and the caller should fetch again.
#[instrument(level = "debug", skip_all)]
pub async fn fetch_visible_articles<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
) -> Result<Batch<D::Element>, DriverError> {
    let elements = driver
        .wait_all_visible(&config.selectors.result_items, config.wait_timeout())
        .await?;

    for (index, element) in elements.iter().enumerate() {
        match driver.is_enabled(element).await {
            Ok(_) => {}
            Err(DriverError::Stale(_)) => {
                debug!(index, count = elements.len(), "Result item is stale");
                return Ok(Batch::Stale);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(count = elements.len(), "Fetched result items");
    Ok(Batch::Clean(elements))
}
