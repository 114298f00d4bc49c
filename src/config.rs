//! Scraper configuration.
//!
//! Everything has a default matching the live site, so the YAML file is
//! optional and may override any subset of fields:
//!
//! ```yaml
//! wait_timeout_secs: 10
//! max_refetch_attempts: 3
//! undated: stop
//! selectors:
//!   next_page: ".pager-next"
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// What to do with a result whose publication timestamp is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPolicy {
    /// Drop the article and keep scanning.
    #[default]
    Skip,
    /// Treat the article as older than any cutoff and stop paginating.
    Stop,
    /// Admit the article; its report row has an empty date.
    Keep,
}

/// What to do when an article image cannot be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFailurePolicy {
    /// Skip that article and continue with the next result.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

/// CSS selectors for every element the scraper touches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub search_icon: String,
    pub search_input: String,
    pub see_all_categories: String,
    pub category_labels: String,
    pub filters_selected: String,
    pub results_menu: String,
    pub sort_select: String,
    /// Visible text of the sort option that orders results newest first.
    pub sort_newest_text: String,
    pub result_items: String,
    pub next_page: String,
    pub next_page_icon: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub image: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_icon: "svg[data-element='magnify-icon']".to_string(),
            search_input: "input[data-element='search-form-input']".to_string(),
            see_all_categories: ".see-all-button".to_string(),
            category_labels: ".search-filter-menu[data-name=Topics] > li .checkbox-input-label"
                .to_string(),
            filters_selected: ".search-results-module-filters-selected-reset".to_string(),
            results_menu: ".search-results-module-results-menu".to_string(),
            sort_select: ".search-results-module-sorts select".to_string(),
            sort_newest_text: "Newest".to_string(),
            result_items: ".search-results-module-results-menu > li".to_string(),
            next_page: ".search-results-module-next-page".to_string(),
            next_page_icon: "svg".to_string(),
            category: ".promo-category".to_string(),
            title: ".promo-title".to_string(),
            description: ".promo-description".to_string(),
            timestamp: ".promo-timestamp".to_string(),
            image: "img".to_string(),
        }
    }
}

/// Runtime settings for a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Home page the search starts from.
    pub site_url: String,
    /// Upper bound on every wait for an element or condition.
    pub wait_timeout_secs: u64,
    /// Delay between two polls of a wait condition.
    pub poll_interval_ms: u64,
    /// Re-fetches allowed for one page before giving up on staleness.
    pub max_refetch_attempts: usize,
    pub undated: UndatedPolicy,
    pub image_failure: ImageFailurePolicy,
    /// Retries after a failed image download.
    pub download_retries: usize,
    /// First backoff delay between download retries; doubles each attempt.
    pub download_base_delay_ms: u64,
    pub selectors: Selectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.latimes.com/".to_string(),
            wait_timeout_secs: 5,
            poll_interval_ms: 250,
            max_refetch_attempts: 5,
            undated: UndatedPolicy::default(),
            image_failure: ImageFailurePolicy::default(),
            download_retries: 2,
            download_base_delay_ms: 500,
            selectors: Selectors::default(),
        }
    }
}

impl ScraperConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn download_base_delay(&self) -> Duration {
        Duration::from_millis(self.download_base_delay_ms)
    }

    /// Parse a YAML document; absent fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load the configuration file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let yaml = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(
            site_url = %config.site_url,
            wait_timeout_secs = config.wait_timeout_secs,
            max_refetch_attempts = config.max_refetch_attempts,
            "Loaded scraper configuration"
        );
        Ok(config)
    }
}
