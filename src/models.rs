//! Data models for scraped articles, report rows and workitem outcomes.
//!
//! - [`Article`]: one search result as parsed from the results page
//! - [`ArticleKey`]: identity used to de-duplicate articles across pages
//! - [`OutputRow`]: one row of the tabular report
//! - [`SearchRequest`]: a validated workitem payload
//! - [`WorkItemOutcome`]: what is reported back for each workitem

use crate::error::ReportError;
use crate::utils::{contains_money_amount, count_occurrences};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// A search result as scraped from the results list.
///
/// Two articles are the same article when their title and publication
/// timestamp match, whatever their category or image. `published_at` is
/// `None` when the page did not expose a usable timestamp.
#[derive(Debug, Clone)]
pub struct Article {
    /// The headline.
    pub title: String,
    /// The teaser paragraph shown under the headline.
    pub description: String,
    /// Publication instant, in UTC.
    pub published_at: Option<DateTime<Utc>>,
    /// The section label shown above the headline, if any.
    pub category: Option<String>,
    /// The `src` of the promo image, if any.
    pub image_url: Option<String>,
    /// Where the promo image was saved locally.
    pub image_filepath: Option<PathBuf>,
}

/// Identity of an [`Article`]: its title and exact publication instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleKey {
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn key(&self) -> ArticleKey {
        ArticleKey {
            title: self.title.clone(),
            published_at: self.published_at,
        }
    }

    /// Calendar date of publication.
    pub fn publication_date(&self) -> Option<NaiveDate> {
        self.published_at.map(|ts| ts.date_naive())
    }

    /// First day of the publication month.
    pub fn publication_month(&self) -> Option<NaiveDate> {
        self.publication_date()
            .and_then(|d| NaiveDate::from_ymd_opt(d.year(), d.month(), 1))
    }

    /// Occurrences of the search phrase in title and description together.
    pub fn search_phrase_count(&self, query: &str) -> usize {
        count_occurrences(&self.title, query) + count_occurrences(&self.description, query)
    }

    /// Whether the title or the description mentions an amount of money.
    pub fn contains_money(&self) -> bool {
        contains_money_amount(&self.title) || contains_money_amount(&self.description)
    }
}

impl PartialEq for Article {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.published_at == other.published_at
    }
}

impl Eq for Article {}

impl Hash for Article {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.published_at.hash(state);
    }
}

/// One row of the report, in column order.
///
/// Built by [`crate::report::build_rows`] after scraping completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Picture filename")]
    pub picture_filename: Option<String>,
    #[serde(rename = "Search phrase count")]
    pub search_phrase_count: usize,
    #[serde(rename = "Contains money")]
    pub contains_money: bool,
    #[serde(rename = "Search query")]
    pub search_query: String,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Months")]
    pub months: u32,
}

impl OutputRow {
    /// Column headers of the report, in order.
    pub const COLUMNS: [&'static str; 9] = [
        "Title",
        "Date",
        "Description",
        "Picture filename",
        "Search phrase count",
        "Contains money",
        "Search query",
        "Category",
        "Months",
    ];

    /// Check the row invariants: required text is non-empty and `months >= 1`.
    pub fn validate(&self) -> Result<(), ReportError> {
        let required = [
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("search_query", self.search_query.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ReportError::EmptyField(name));
            }
        }
        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                return Err(ReportError::EmptyField("category"));
            }
        }
        if self.months < 1 {
            return Err(ReportError::InvalidMonths(self.months));
        }
        Ok(())
    }

    /// The row as strings, one per entry of [`Self::COLUMNS`].
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.date.map(|d| d.to_string()).unwrap_or_default(),
            self.description.clone(),
            self.picture_filename.clone().unwrap_or_default(),
            self.search_phrase_count.to_string(),
            self.contains_money.to_string(),
            self.search_query.clone(),
            self.category.clone().unwrap_or_default(),
            self.months.to_string(),
        ]
    }
}

/// A validated workitem payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_query: String,
    pub category: Option<String>,
    /// Number of months to cover, at least 1.
    pub months: u32,
}

/// How a failed workitem is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The payload itself was unusable.
    Business,
    /// The scrape or the report failed.
    Application,
}

/// Result reported for one workitem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkItemOutcome {
    Success {
        report_path: String,
        search_query: String,
        category: Option<String>,
        months: u32,
        image_files: Vec<String>,
    },
    Error {
        kind: FailureKind,
        error: String,
    },
}
