//! Error types shared by the driver, parser, downloader and pagination loop.
//!
//! Each layer has its own closed enum so call sites can match exhaustively
//! on the failures they are expected to recover from (a stale element, a
//! missing optional field) and propagate the rest with `?`.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`crate::driver::BrowserDriver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("timed out after {timeout:?} waiting for {condition}")]
    Timeout { condition: String, timeout: Duration },

    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("webdriver session error: {0}")]
    Session(String),
}

impl DriverError {
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::Stale(_))
    }
}

/// Failures while downloading an article image.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid image url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single result element could not become an [`crate::models::Article`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("article is missing its {0}")]
    MissingField(&'static str),

    #[error("image download failed: {0}")]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ParseError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ParseError::Driver(e) if e.is_stale())
    }
}

/// Failures that end a scrape run.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("page {page} stayed stale after {attempts} fetch attempts")]
    StaleRetriesExhausted { page: usize, attempts: usize },

    #[error("image download aborted the run: {0}")]
    ImageDownload(#[source] DownloadError),
}

/// An [`crate::models::OutputRow`] that would break the report schema.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportError {
    #[error("output row field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("months must be at least 1, got {0}")]
    InvalidMonths(u32),
}

/// Reasons a workitem payload is rejected before any scraping happens.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkItemError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("search_query must be a non-empty string")]
    MissingQuery,

    #[error("category must be a non-empty string when given")]
    EmptyCategory,

    #[error("months must be a non-negative integer, got {0}")]
    InvalidMonths(String),
}
