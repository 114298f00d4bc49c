//! Interactions with the Los Angeles Times search page.
//!
//! Each function performs one user-level step (search, filter, sort, next
//! page) through a [`BrowserDriver`], using the selectors from the
//! configuration. None of them keep state; the pagination controller
//! decides what happens next.

use crate::config::ScraperConfig;
use crate::driver::BrowserDriver;
use crate::error::DriverError;
use tracing::{info, instrument, warn};

/// Load the home page.
#[instrument(level = "info", skip_all, fields(url = %config.site_url))]
pub async fn open_homepage<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
) -> Result<(), DriverError> {
    driver.goto(&config.site_url).await
}

/// Type `query` into the search box, submit it and wait for the results.
#[instrument(level = "info", skip(driver, config))]
pub async fn search_for<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
    query: &str,
) -> Result<(), DriverError> {
    let s = &config.selectors;
    let timeout = config.wait_timeout();

    let icon = driver.wait_visible(&s.search_icon, timeout).await?;
    driver.click(&icon).await?;

    let input = driver.wait_visible(&s.search_input, timeout).await?;
    driver.click(&input).await?;
    driver.send_keys(&input, query).await?;
    driver.submit(&input).await?;

    driver.wait_visible(&s.results_menu, timeout).await?;
    info!("Search submitted");
    Ok(())
}

/// Tick the topic whose label matches `category`, ignoring case and padding.
///
/// Returns `false` when no topic matches; the results then stay unfiltered.
#[instrument(level = "info", skip(driver, config))]
pub async fn filter_by_category<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
    category: &str,
) -> Result<bool, DriverError> {
    let s = &config.selectors;
    let timeout = config.wait_timeout();
    let wanted = category.trim().to_lowercase();

    let see_all = driver.wait_visible(&s.see_all_categories, timeout).await?;
    driver.click(&see_all).await?;

    let labels = driver.wait_all_visible(&s.category_labels, timeout).await?;
    for label in &labels {
        let text = driver
            .property(label, "textContent")
            .await?
            .unwrap_or_default();
        if text.trim().to_lowercase() == wanted {
            driver.click(label).await?;
            driver.wait_visible(&s.filters_selected, timeout).await?;
            info!(topic = %text.trim(), "Category filter applied");
            return Ok(true);
        }
    }

    warn!(available = labels.len(), "No topic matches the category; results stay unfiltered");
    Ok(false)
}

/// Order the results newest first and wait for the old result list to go away.
#[instrument(level = "info", skip_all)]
pub async fn sort_by_newest<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
) -> Result<(), DriverError> {
    let s = &config.selectors;
    let timeout = config.wait_timeout();

    let results = driver.wait_visible(&s.results_menu, timeout).await?;
    let select = driver.wait_visible(&s.sort_select, timeout).await?;

    driver.select_by_text(&select, &s.sort_newest_text).await?;

    driver.wait_stale(&results, timeout).await?;
    info!("Results sorted by newest");
    Ok(())
}

/// Click the next-page control.
///
/// Returns `false` when there is no further page: the control is missing,
/// marked inactive, or covered by something that swallows the click.
#[instrument(level = "debug", skip_all)]
pub async fn advance_page<D: BrowserDriver>(
    driver: &D,
    config: &ScraperConfig,
) -> Result<bool, DriverError> {
    let s = &config.selectors;

    let buttons = driver.find_all(&s.next_page).await?;
    let Some(button) = buttons.first() else {
        info!("No next-page control; last page reached");
        return Ok(false);
    };
    if buttons.len() > 1 {
        warn!(count = buttons.len(), "Several next-page controls found; using the first");
    }

    let inactive = match driver.find_child(button, &s.next_page_icon).await {
        Ok(icon) => driver.attribute(&icon, "data-inactive").await?.is_some(),
        Err(DriverError::NotFound(_)) => false,
        Err(e) => return Err(e),
    };
    if inactive {
        info!("Next-page control is inactive; last page reached");
        return Ok(false);
    }

    match driver.click(button).await {
        Ok(()) => Ok(true),
        Err(DriverError::ClickIntercepted(reason)) => {
            warn!(%reason, "Next-page click was intercepted; stopping pagination");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
