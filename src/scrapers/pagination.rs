//! The search-and-paginate loop.
//!
//! [`PaginationController`] drives a [`BrowserDriver`] through the search
//! page as an explicit state machine:
//!
//! ```text
//! Searching -> Filtering -> Sorting -> CollectingPage(1) -> CollectingPage(2) -> ... -> Done
//! ```
//!
//! Results are sorted newest first, so the loop stops at the first article
//! published before the cutoff month. A result list that re-renders while it
//! is being read is fetched again, a bounded number of times per page.
//! Images are downloaded only for articles that make it into the results.

use crate::config::{ImageFailurePolicy, ScraperConfig, UndatedPolicy};
use crate::download::ImageFetcher;
use crate::driver::BrowserDriver;
use crate::error::{ParseError, ScrapeError};
use crate::models::{Article, ArticleKey};
use crate::scrapers::fetcher::{Batch, fetch_visible_articles};
use crate::scrapers::latimes::{advance_page, filter_by_category, open_homepage, search_for, sort_by_newest};
use crate::scrapers::parser::ArticleParser;
use crate::utils::truncate_for_log;
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Where the controller is in the scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Searching,
    Filtering,
    Sorting,
    /// Reading the one-based `page` of results.
    CollectingPage { page: usize },
    Done,
}

/// Counters logged at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_visited: usize,
    pub elements_seen: usize,
    pub parse_failures: usize,
    pub refetches: usize,
    /// Dated articles newer than the dated article before them.
    pub out_of_order: usize,
    pub undated_skipped: usize,
    /// Articles returned after de-duplication.
    pub retained: usize,
}

/// How the scan of one batch ended.
enum Scan {
    /// Every element was handled; the next page may be visited.
    Complete,
    /// An article older than the cutoff was reached.
    Stop,
    /// An element went stale mid-scan; the page has to be fetched again.
    Refetch,
}

enum Admission {
    Keep,
    Skip,
    Stop,
}

pub struct PaginationController<'a, D, F> {
    driver: &'a D,
    parser: ArticleParser<'a, D, F>,
    config: &'a ScraperConfig,
    evidence_dir: PathBuf,
    cutoff: NaiveDate,
    state: State,
    accumulated: Vec<Article>,
    seen: HashSet<ArticleKey>,
    last_dated: Option<DateTime<Utc>>,
    stats: RunStats,
}

impl<'a, D, F> PaginationController<'a, D, F>
where
    D: BrowserDriver,
    F: ImageFetcher,
{
    /// Images go to `image_dir`; screenshots of unparsable results to
    /// `evidence_dir`. Articles published before the month starting on
    /// `cutoff` end the scrape.
    pub fn new(
        driver: &'a D,
        images: &'a F,
        config: &'a ScraperConfig,
        image_dir: PathBuf,
        evidence_dir: PathBuf,
        cutoff: NaiveDate,
    ) -> Self {
        Self {
            driver,
            parser: ArticleParser::new(driver, images, &config.selectors, image_dir),
            config,
            evidence_dir,
            cutoff,
            state: State::Searching,
            accumulated: Vec::new(),
            seen: HashSet::new(),
            last_dated: None,
            stats: RunStats::default(),
        }
    }

    /// Search for `query`, optionally restricted to `category`, and collect
    /// every article published in or after the cutoff month, newest first.
    #[instrument(level = "info", skip(self), fields(cutoff = %self.cutoff))]
    pub async fn run(
        mut self,
        query: &str,
        category: Option<&str>,
    ) -> Result<(Vec<Article>, RunStats), ScrapeError> {
        let t0 = Instant::now();

        loop {
            debug!(state = ?self.state, "Pagination step");
            self.state = match self.state {
                State::Searching => {
                    open_homepage(self.driver, self.config).await?;
                    search_for(self.driver, self.config, query).await?;
                    if category.is_some() {
                        State::Filtering
                    } else {
                        State::Sorting
                    }
                }
                State::Filtering => {
                    if let Some(category) = category {
                        filter_by_category(self.driver, self.config, category).await?;
                    }
                    State::Sorting
                }
                State::Sorting => {
                    sort_by_newest(self.driver, self.config).await?;
                    State::CollectingPage { page: 1 }
                }
                State::CollectingPage { page } => {
                    self.stats.pages_visited += 1;
                    if self.collect_page(page).await? {
                        info!(page, "Reached articles older than the cutoff");
                        State::Done
                    } else if advance_page(self.driver, self.config).await? {
                        State::CollectingPage { page: page + 1 }
                    } else {
                        State::Done
                    }
                }
                State::Done => break,
            };
        }

        let articles = self.finish();
        info!(
            pages_visited = self.stats.pages_visited,
            elements_seen = self.stats.elements_seen,
            parse_failures = self.stats.parse_failures,
            refetches = self.stats.refetches,
            out_of_order = self.stats.out_of_order,
            undated_skipped = self.stats.undated_skipped,
            retained = self.stats.retained,
            elapsed_ms = t0.elapsed().as_millis(),
            "Scrape finished"
        );
        Ok((articles, self.stats))
    }

    /// Read one page of results. Returns `true` when the cutoff was crossed.
    #[instrument(level = "info", skip(self))]
    async fn collect_page(&mut self, page: usize) -> Result<bool, ScrapeError> {
        let baseline = self.last_dated;
        let max_fetches = 1 + self.config.max_refetch_attempts;

        for attempt in 1..=max_fetches {
            // Ordering is checked against the previous page, not against a
            // discarded attempt at this one.
            self.last_dated = baseline;

            let scan = match fetch_visible_articles(self.driver, self.config).await? {
                Batch::Clean(elements) => self.scan_batch(page, &elements).await?,
                Batch::Stale => Scan::Refetch,
            };
            match scan {
                Scan::Complete => return Ok(false),
                Scan::Stop => return Ok(true),
                Scan::Refetch if attempt < max_fetches => {
                    self.stats.refetches += 1;
                    warn!(page, attempt, "Result list went stale; fetching it again");
                }
                Scan::Refetch => {}
            }
        }

        Err(ScrapeError::StaleRetriesExhausted {
            page,
            attempts: max_fetches,
        })
    }

    async fn scan_batch(&mut self, page: usize, elements: &[D::Element]) -> Result<Scan, ScrapeError> {
        for (index, element) in elements.iter().enumerate() {
            self.stats.elements_seen += 1;

            let mut article = match self.parser.parse(element).await {
                Ok(article) => article,
                Err(e) if e.is_stale() => {
                    debug!(page, index, "Result went stale while being read");
                    return Ok(Scan::Refetch);
                }
                Err(e) => {
                    self.skip_failed(element, page, index, &e).await;
                    continue;
                }
            };

            match self.admit(&article) {
                Admission::Keep => {}
                Admission::Skip => continue,
                Admission::Stop => return Ok(Scan::Stop),
            }
            // A refetched page or a later page may repeat an article.
            if !self.seen.insert(article.key()) {
                debug!(page, index, "Article already collected");
                continue;
            }

            match self.parser.fetch_image(&mut article).await {
                Ok(()) => self.accumulated.push(article),
                Err(ParseError::Download(e)) if self.config.image_failure == ImageFailurePolicy::Abort => {
                    return Err(ScrapeError::ImageDownload(e));
                }
                Err(e) => self.skip_failed(element, page, index, &e).await,
            }
        }
        Ok(Scan::Complete)
    }

    async fn skip_failed(&mut self, element: &D::Element, page: usize, index: usize, error: &ParseError) {
        self.stats.parse_failures += 1;
        warn!(page, index, %error, "Skipping result that could not be parsed");
        self.capture_evidence(element, page, index).await;
    }

    /// Whether `article` belongs in the results, given the cutoff and the undated policy.
    fn admit(&mut self, article: &Article) -> Admission {
        let Some(month) = article.publication_month() else {
            return match self.config.undated {
                UndatedPolicy::Skip => {
                    self.stats.undated_skipped += 1;
                    debug!(title = %truncate_for_log(&article.title, 80), "Skipping undated article");
                    Admission::Skip
                }
                UndatedPolicy::Stop => {
                    info!(title = %truncate_for_log(&article.title, 80), "Undated article ends the scrape");
                    Admission::Stop
                }
                UndatedPolicy::Keep => Admission::Keep,
            };
        };

        self.check_order(article);
        if month < self.cutoff {
            debug!(%month, title = %truncate_for_log(&article.title, 80), "Article is older than the cutoff");
            return Admission::Stop;
        }
        Admission::Keep
    }

    /// Warn when results are not newest first as requested.
    fn check_order(&mut self, article: &Article) {
        let Some(current) = article.published_at else {
            return;
        };
        if let Some(previous) = self.last_dated {
            if current > previous {
                self.stats.out_of_order += 1;
                warn!(
                    %previous,
                    %current,
                    title = %truncate_for_log(&article.title, 80),
                    "Result is newer than the one before it"
                );
            }
        }
        self.last_dated = Some(current);
    }

    /// Screenshot an unparsable result. Failing to do so is only logged.
    async fn capture_evidence(&self, element: &D::Element, page: usize, index: usize) {
        let path = self
            .evidence_dir
            .join(format!("failed_page{page}_item{index}.png"));
        match self.driver.screenshot(element, &path).await {
            Ok(()) => info!(path = %path.display(), "Saved screenshot of the failed result"),
            Err(e) => warn!(error = %e, "Could not screenshot the failed result"),
        }
    }

    /// Order newest first, undated last.
    fn finish(&mut self) -> Vec<Article> {
        let articles: Vec<Article> = std::mem::take(&mut self.accumulated)
            .into_iter()
            .sorted_by(|a, b| b.published_at.cmp(&a.published_at))
            .collect();
        self.stats.retained = articles.len();
        articles
    }
}
