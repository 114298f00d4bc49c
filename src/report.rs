//! Builds the report rows from scraped articles.

use crate::error::ReportError;
use crate::models::{Article, OutputRow, SearchRequest};
use tracing::{debug, instrument};

/// One validated [`OutputRow`] per article, in the order given.
///
/// # Errors
///
/// Returns [`ReportError`] for the first row that breaks the row invariants,
/// e.g. a blank search query or `months == 0`.
#[instrument(level = "info", skip_all, fields(articles = articles.len(), query = %request.search_query))]
pub fn build_rows(articles: &[Article], request: &SearchRequest) -> Result<Vec<OutputRow>, ReportError> {
    let rows = articles
        .iter()
        .map(|article| {
            let row = OutputRow {
                title: article.title.clone(),
                date: article.publication_date(),
                description: article.description.clone(),
                picture_filename: article
                    .image_filepath
                    .as_ref()
                    .map(|p| p.display().to_string()),
                search_phrase_count: article.search_phrase_count(&request.search_query),
                contains_money: article.contains_money(),
                search_query: request.search_query.clone(),
                category: request.category.clone(),
                months: request.months,
            };
            row.validate().map(|()| row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = rows.len(), "Built report rows");
    Ok(rows)
}
