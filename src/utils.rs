//! Text analyzers, date helpers and small file-system utilities.
//!
//! - Money-amount detection and search-phrase counting for the report
//! - Recency cutoff computation from a number of months
//! - Random file names for downloaded images
//! - Log truncation and output directory validation

use chrono::{Datelike, Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use rand::{Rng, distr::Alphanumeric, rng};
use regex::Regex;
use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// 1 to 3 digits, comma separated thousands, optional 1-2 decimals.
const NUMBER: &str = r"\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?";

static MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\${NUMBER}|{NUMBER}\s?dollars|{NUMBER}\s?usd"
    ))
    .expect("money regex is valid")
});

/// Check whether `text` mentions an amount of money.
///
/// Recognized forms: `$11.1`, `$111,111.11`, `11 dollars`, `11 USD`.
/// A bare number is not money.
///
/// # Examples
///
/// ```ignore
/// assert!(contains_money_amount("The price is $11.1"));
/// assert!(contains_money_amount("11usd"));
/// assert!(!contains_money_amount("The price is 11"));
/// ```
pub fn contains_money_amount(text: &str) -> bool {
    MONEY.is_match(text)
}

/// Case-insensitive count of non-overlapping occurrences of `query` in `text`.
///
/// An empty query never matches.
pub fn count_occurrences(text: &str, query: &str) -> usize {
    if query.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&query.to_lowercase()).count()
}

/// First day of the earliest month still eligible for the report.
///
/// `months = 1` means the current month only; `0` is treated as `1`.
pub fn minimum_publication_month(months: u32, today: NaiveDate) -> NaiveDate {
    let first_of_month = today - Days::new(u64::from(today.day0()));
    first_of_month
        .checked_sub_months(Months::new(months.max(1) - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Random alphanumeric string used to name downloaded images.
pub fn random_filename(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns the IO error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
