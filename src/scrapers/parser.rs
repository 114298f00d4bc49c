//! Turns one result item into an [`Article`].

use crate::config::Selectors;
use crate::download::ImageFetcher;
use crate::driver::BrowserDriver;
use crate::error::{DriverError, ParseError};
use crate::models::Article;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Reads the fields of result items and downloads their images.
pub struct ArticleParser<'a, D, F> {
    driver: &'a D,
    images: &'a F,
    selectors: &'a Selectors,
    image_dir: PathBuf,
}

impl<'a, D, F> ArticleParser<'a, D, F>
where
    D: BrowserDriver,
    F: ImageFetcher,
{
    pub fn new(driver: &'a D, images: &'a F, selectors: &'a Selectors, image_dir: PathBuf) -> Self {
        Self {
            driver,
            images,
            selectors,
            image_dir,
        }
    }

    /// Parse `element`.
    ///
    /// Title and description are required; category, timestamp and image URL
    /// are not. Nothing is downloaded here; see [`Self::fetch_image`].
    #[instrument(level = "debug", skip_all)]
    pub async fn parse(&self, element: &D::Element) -> Result<Article, ParseError> {
        let category = self.optional_text(element, &self.selectors.category).await?;
        if category.is_none() {
            debug!("No category found for the article");
        }

        let title = self
            .optional_text(element, &self.selectors.title)
            .await?
            .ok_or(ParseError::MissingField("title"))?;
        let description = self
            .optional_text(element, &self.selectors.description)
            .await?
            .ok_or(ParseError::MissingField("description"))?;

        let published_at = self.published_at(element).await?;
        if published_at.is_none() {
            warn!(%title, "No usable publication timestamp for the article");
        }

        let image_url = self.image_url(element).await?;

        Ok(Article {
            title,
            description,
            published_at,
            category,
            image_url,
            image_filepath: None,
        })
    }

    /// Download the image of an admitted `article` and record where it went.
    #[instrument(level = "debug", skip_all, fields(title = %article.title))]
    pub async fn fetch_image(&self, article: &mut Article) -> Result<(), ParseError> {
        if let Some(url) = &article.image_url {
            article.image_filepath = Some(self.images.download(url, &self.image_dir).await?);
        }
        Ok(())
    }

    async fn optional_child(
        &self,
        element: &D::Element,
        selector: &str,
    ) -> Result<Option<D::Element>, DriverError> {
        match self.driver.find_child(element, selector).await {
            Ok(child) => Ok(Some(child)),
            Err(DriverError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Trimmed text of the child matching `selector`; blank counts as absent.
    async fn optional_text(
        &self,
        element: &D::Element,
        selector: &str,
    ) -> Result<Option<String>, DriverError> {
        let Some(child) = self.optional_child(element, selector).await? else {
            return Ok(None);
        };
        let text = self.driver.text(&child).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    async fn published_at(&self, element: &D::Element) -> Result<Option<DateTime<Utc>>, DriverError> {
        let Some(stamp) = self.optional_child(element, &self.selectors.timestamp).await? else {
            return Ok(None);
        };
        let raw = self.driver.attribute(&stamp, "data-timestamp").await?;
        Ok(raw.as_deref().and_then(parse_epoch_millis))
    }

    async fn image_url(&self, element: &D::Element) -> Result<Option<String>, DriverError> {
        let Some(img) = self.optional_child(element, &self.selectors.image).await? else {
            debug!("No image found for the article");
            return Ok(None);
        };
        let src = self.driver.attribute(&img, "src").await?;
        Ok(src.filter(|s| !s.trim().is_empty()))
    }
}

/// Millisecond Unix timestamp to a UTC instant.
pub fn parse_epoch_millis(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
