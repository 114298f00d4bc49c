//! Image downloads with capped exponential backoff.
//!
//! - [`ImageFetcher`]: saves the image behind a URL into a directory
//! - [`HttpImageFetcher`]: streams the response body to disk with `reqwest`
//! - [`RetryFetch`]: decorator that retries transient failures of any fetcher
//!
//! # Retry Strategy
//!
//! Only network errors and 5xx answers are retried. The delay doubles from
//! the base delay on each attempt, is capped at 30 seconds, and gets up to
//! a quarter of the base delay of random jitter.

use crate::error::DownloadError;
use crate::utils::random_filename;
use futures::StreamExt;
use rand::{Rng, rng};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Extensions kept as-is in generated image file names.
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "avif", "bmp", "svg"];

/// Extension used when the URL does not reveal one.
const DEFAULT_EXTENSION: &str = "jpg";

/// Saves remote images to local storage.
pub trait ImageFetcher {
    /// Download `url` into `dir` and return the path of the new file.
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, DownloadError>;
}

impl DownloadError {
    /// Whether trying the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Http { .. } => true,
            DownloadError::Status { status, .. } => *status >= 500,
            DownloadError::InvalidUrl { .. } | DownloadError::Io(_) => false,
        }
    }
}

/// Image extension for `url`, falling back to [`DEFAULT_EXTENSION`].
pub fn image_extension(url: &Url) -> &'static str {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| IMAGE_EXTENSIONS.into_iter().find(|known| *known == ext))
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Fresh `image_<random>.<ext>` path inside `dir`.
pub fn image_path(dir: &Path, url: &Url) -> PathBuf {
    dir.join(format!("image_{}.{}", random_filename(8), image_extension(url)))
}

/// Parse an image `src`, accepting protocol-relative URLs.
pub fn parse_image_url(src: &str) -> Result<Url, DownloadError> {
    let absolute = if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    };
    Url::parse(&absolute).map_err(|source| DownloadError::InvalidUrl {
        url: src.to_string(),
        source,
    })
}

/// Downloads images over HTTP, streaming the body to disk.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ImageFetcher for HttpImageFetcher {
    #[instrument(level = "debug", skip(self, dir))]
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, DownloadError> {
        let parsed = parse_image_url(url)?;
        let http_error = |source| DownloadError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        fs::create_dir_all(dir).await?;
        let path = image_path(dir, &parsed);
        let mut file = fs::File::create(&path).await?;
        let mut body = response.bytes_stream();
        let mut bytes = 0usize;

        let written = async {
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(http_error)?;
                bytes += chunk.len();
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), DownloadError>(())
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }

        debug!(path = %path.display(), bytes, "Saved image");
        Ok(path)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`ImageFetcher`].
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: ImageFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let max_jitter = u64::try_from(self.base_delay.as_millis() / 4).unwrap_or(u64::MAX);
        delay + Duration::from_millis(rng().random_range(0..=max_jitter))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> ImageFetcher for RetryFetch<T>
where
    T: ImageFetcher,
{
    #[instrument(level = "info", skip(self, dir))]
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, DownloadError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.download(url, dir).await {
                Ok(path) => {
                    if attempt > 0 {
                        info!(attempt, "download succeeded after retrying");
                    }
                    return Ok(path);
                }
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if !e.is_retryable() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total,
                            error = %e,
                            "download() giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "download() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
